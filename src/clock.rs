//! Time sources for call timing
//!
//! Every profiled call reads its time source twice: once when the call
//! starts and once when it completes. The difference is reported in
//! milliseconds as an `f64`.
//!
//! # Example
//!
//! ```
//! use profiled::clock::{ManualClock, TimeSource};
//!
//! let clock = ManualClock::new(100.0);
//! clock.advance(50.0);
//! assert_eq!(clock.now(), 150.0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of numeric timestamps in milliseconds
///
/// Implementations should be non-decreasing between the two reads made per
/// call. This is not checked: a clock that goes backwards yields a negative
/// duration, which is passed to the sink as is.
pub trait TimeSource: Send + Sync {
    /// Current timestamp in milliseconds
    fn now(&self) -> f64;
}

impl<F> TimeSource for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn now(&self) -> f64 {
        self()
    }
}

/// Wall-clock milliseconds since the Unix epoch (the default time source)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> f64 {
        epoch_millis(SystemTime::now())
    }
}

/// Signed milliseconds between the Unix epoch and `time`
///
/// Times before the epoch come out negative so that a wall clock stepped
/// back across it still yields a finite duration rather than a jump to zero.
fn epoch_millis(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as f64,
        Err(err) => -(err.duration().as_millis() as f64),
    }
}

/// Monotonic clock with sub-millisecond resolution
///
/// Timestamps are fractional milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually driven clock for deterministic timing
///
/// Clones share the same reading, so a test can hand one clone to a
/// profiler and advance another from inside the profiled function.
///
/// # Thread Safety
///
/// The reading is stored as the bit pattern of an `f64` in an `AtomicU64`,
/// so `set` and `advance` are lock-free and safe across threads.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start` milliseconds
    pub fn new(start: f64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    /// Set the reading to an absolute value (may move backwards)
    pub fn set(&self, millis: f64) {
        self.millis.store(millis.to_bits(), Ordering::SeqCst);
    }

    /// Move the reading forward by `delta` milliseconds
    ///
    /// # Returns
    ///
    /// The new reading.
    pub fn advance(&self, delta: f64) -> f64 {
        let previous = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f64::from_bits(previous) + delta
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.millis.load(Ordering::SeqCst))
    }
}
