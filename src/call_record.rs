//! Per-call bookkeeping
//!
//! A `CallRecord` lives for exactly one profiled call. It holds the start
//! timestamp and guards the report so that it fires at most once, however
//! the completion path is driven.

use crate::clock::TimeSource;
use std::fmt;

/// How a profiled call signals that it is done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionMode {
    /// The call is done when the target returns
    Synchronous,
    /// The call is done when the completion callback is invoked
    Callback,
    /// The call is done when the returned future completes
    Awaitable,
}

impl fmt::Display for CompletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CompletionMode::Synchronous => "synchronous",
            CompletionMode::Callback => "callback",
            CompletionMode::Awaitable => "awaitable",
        };
        f.write_str(label)
    }
}

/// Ephemeral record of a single profiled call
#[derive(Debug, Clone)]
pub struct CallRecord {
    start_time: f64,
    mode: CompletionMode,
    reported: bool,
}

impl CallRecord {
    /// Start a record, reading the time source once
    pub fn start(clock: &dyn TimeSource, mode: CompletionMode) -> Self {
        Self {
            start_time: clock.now(),
            mode,
            reported: false,
        }
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn mode(&self) -> CompletionMode {
        self.mode
    }

    pub fn is_reported(&self) -> bool {
        self.reported
    }

    /// Mark the call complete and compute its duration
    ///
    /// Returns `None` if the call was already completed; the time source is
    /// not read again in that case.
    pub fn complete(&mut self, clock: &dyn TimeSource) -> Option<f64> {
        if self.reported {
            return None;
        }
        self.reported = true;
        Some(clock.now() - self.start_time)
    }
}
