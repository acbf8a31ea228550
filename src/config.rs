//! Profiler configuration files
//!
//! A profiler can be described in TOML instead of code:
//!
//! ```toml
//! name = "fetch_user"
//! sink = "tracing"    # stderr | tracing | silent
//! clock = "monotonic" # system | monotonic
//! ```
//!
//! Every key is optional. Unrecognised sink or clock kinds fall back to the
//! defaults (`stderr`, `system`) instead of failing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where durations are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stderr,
    Tracing,
    Silent,
    #[serde(other)]
    Unknown,
}

/// Which clock timestamps calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    #[default]
    System,
    Monotonic,
    #[serde(other)]
    Unknown,
}

/// Declarative description of a profiler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Name shown by the default and tracing sinks
    pub name: Option<String>,
    pub sink: SinkKind,
    pub clock: ClockKind,
}

impl ProfilerConfig {
    /// Load a configuration from a TOML file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use profiled::config::ProfilerConfig;
    ///
    /// # fn main() -> profiled::config::Result<()> {
    /// let config = ProfilerConfig::from_file("profiled.toml")?;
    /// println!("sink: {:?}", config.effective_sink());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Load a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Sink kind after applying the fallback for unknown values
    pub fn effective_sink(&self) -> SinkKind {
        match self.sink {
            SinkKind::Unknown => {
                tracing::debug!("unknown sink kind in profiler config, using stderr");
                SinkKind::Stderr
            }
            kind => kind,
        }
    }

    /// Clock kind after applying the fallback for unknown values
    pub fn effective_clock(&self) -> ClockKind {
        match self.clock {
            ClockKind::Unknown => {
                tracing::debug!("unknown clock kind in profiler config, using system clock");
                ClockKind::System
            }
            kind => kind,
        }
    }
}
