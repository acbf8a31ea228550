//! Report sinks for measured durations
//!
//! A sink receives exactly one duration (milliseconds) per completed call.
//! What it does with the value is up to the sink: the default writes a
//! line to stderr, `TracingSink` emits a `tracing` event and
//! `RecordingSink` keeps the values in memory.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, PoisonError};

/// Receiver of call durations
///
/// A panicking sink is not guarded against: the panic surfaces wherever
/// the report was triggered.
pub trait ReportSink: Send + Sync {
    fn report(&self, duration: f64);
}

impl<F> ReportSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, duration: f64) {
        self(duration)
    }
}

/// Format the default report line
///
/// # Example
/// ```
/// use profiled::sink::format_report;
///
/// assert_eq!(format_report(Some("load"), 50.0), "Function call duration(load): 50");
/// assert_eq!(format_report(None, 1.5), "Function call duration(): 1.5");
/// ```
pub fn format_report(name: Option<&str>, duration: f64) -> String {
    format!(
        "Function call duration({}): {}",
        name.unwrap_or_default(),
        duration
    )
}

/// Default sink: one human-readable line per call on stderr
#[derive(Debug, Clone, Default)]
pub struct StderrSink {
    name: Option<Cow<'static, str>>,
}

impl StderrSink {
    pub fn new(name: Option<Cow<'static, str>>) -> Self {
        Self { name }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl ReportSink for StderrSink {
    fn report(&self, duration: f64) {
        eprintln!("{}", format_report(self.name(), duration));
    }
}

/// Emits each duration as an `info` event under the `profiled` target
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    name: Option<Cow<'static, str>>,
}

impl TracingSink {
    pub fn new(name: Option<Cow<'static, str>>) -> Self {
        Self { name }
    }
}

impl ReportSink for TracingSink {
    fn report(&self, duration: f64) {
        tracing::info!(
            target: "profiled",
            function = self.name.as_deref().unwrap_or_default(),
            duration_ms = duration,
            "function call completed"
        );
    }
}

/// Discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl ReportSink for SilentSink {
    fn report(&self, _duration: f64) {}
}

/// Keeps reported durations in memory
///
/// Clones share storage, so one clone can be given to a profiler while the
/// other is inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    durations: Arc<Mutex<Vec<f64>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations in the order they were reported
    pub fn durations(&self) -> Vec<f64> {
        self.durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn last(&self) -> Option<f64> {
        self.durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl ReportSink for RecordingSink {
    fn report(&self, duration: f64) {
        self.durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}
