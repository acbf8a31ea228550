//! Profiler factory
//!
//! A `Profiler` collects the optional parts of a wrapper (name, report sink,
//! time source) and then wraps a target with one of three constructors, one
//! per calling convention:
//!
//! - [`Profiler::sync`]: the call is done when the target returns
//! - [`Profiler::callback`]: the call is done when the completion callback runs
//! - [`Profiler::future`]: the call is done when the returned future completes
//!
//! # Example
//! ```
//! use profiled::clock::ManualClock;
//! use profiled::sink::RecordingSink;
//! use profiled::Profiler;
//!
//! let clock = ManualClock::new(0.0);
//! let sink = RecordingSink::new();
//! let ticking = clock.clone();
//!
//! let square = Profiler::named("square")
//!     .with_sink(sink.clone())
//!     .with_time_source(clock)
//!     .sync(move |x: u64| {
//!         ticking.advance(3.0);
//!         x * x
//!     });
//!
//! assert_eq!(square.call(12), 144);
//! assert_eq!(sink.durations(), vec![3.0]);
//! ```

use crate::call_record::{CallRecord, CompletionMode};
use crate::clock::{MonotonicClock, SystemClock, TimeSource};
use crate::config::{ClockKind, ProfilerConfig, SinkKind};
use crate::sink::{ReportSink, SilentSink, StderrSink, TracingSink};
use crate::wrapper::{CallbackProfiled, FutureProfiled, SyncProfiled};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Sink and clock shared by every call of one wrapper
pub(crate) struct Instrument {
    name: Option<Cow<'static, str>>,
    sink: Box<dyn ReportSink>,
    clock: Box<dyn TimeSource>,
}

impl Instrument {
    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn begin(&self, mode: CompletionMode) -> CallRecord {
        CallRecord::start(self.clock.as_ref(), mode)
    }

    /// Report the call's duration unless it was already reported
    pub(crate) fn complete(&self, record: &mut CallRecord) {
        finish(
            self.name(),
            &*self.sink,
            &*self.clock,
            record,
        );
    }
}

fn finish(
    name: Option<&str>,
    sink: &dyn ReportSink,
    clock: &dyn TimeSource,
    record: &mut CallRecord,
) {
    if let Some(duration) = record.complete(clock) {
        tracing::trace!(
            function = name.unwrap_or_default(),
            mode = %record.mode(),
            duration_ms = duration,
            "reporting call duration"
        );
        sink.report(duration);
    }
}

fn default_sink(name: Option<Cow<'static, str>>) -> Box<dyn ReportSink> {
    Box::new(StderrSink::new(name))
}

fn default_clock() -> Box<dyn TimeSource> {
    Box::new(SystemClock)
}

/// Builder for profiled wrappers
pub struct Profiler {
    name: Option<Cow<'static, str>>,
    sink: Option<Box<dyn ReportSink>>,
    clock: Option<Box<dyn TimeSource>>,
}

impl Profiler {
    /// Anonymous profiler with the default sink and clock
    pub fn new() -> Self {
        Self {
            name: None,
            sink: None,
            clock: None,
        }
    }

    /// Profiler whose reports identify the function as `name`
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new().with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Report durations to `sink` instead of stderr
    pub fn with_sink<S: ReportSink + 'static>(self, sink: S) -> Self {
        self.with_sink_opt(Some(sink))
    }

    /// Report to `sink` if given, otherwise keep the default sink
    pub fn with_sink_opt<S: ReportSink + 'static>(mut self, sink: Option<S>) -> Self {
        self.sink = sink.map(|sink| Box::new(sink) as Box<dyn ReportSink>);
        self
    }

    /// Read timestamps from `clock` instead of the system clock
    pub fn with_time_source<C: TimeSource + 'static>(self, clock: C) -> Self {
        self.with_time_source_opt(Some(clock))
    }

    /// Read timestamps from `clock` if given, otherwise keep the system clock
    pub fn with_time_source_opt<C: TimeSource + 'static>(mut self, clock: Option<C>) -> Self {
        self.clock = clock.map(|clock| Box::new(clock) as Box<dyn TimeSource>);
        self
    }

    /// Build a profiler from a configuration file description
    pub fn from_config(config: &ProfilerConfig) -> Self {
        let mut profiler = Self::new();
        if let Some(name) = &config.name {
            profiler = profiler.with_name(name.clone());
        }

        let name = profiler.name.clone();
        profiler = match config.effective_sink() {
            SinkKind::Tracing => profiler.with_sink(TracingSink::new(name)),
            SinkKind::Silent => profiler.with_sink(SilentSink),
            SinkKind::Stderr | SinkKind::Unknown => profiler,
        };

        match config.effective_clock() {
            ClockKind::Monotonic => profiler.with_time_source(MonotonicClock::new()),
            ClockKind::System | ClockKind::Unknown => profiler,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Time a single closure and report its duration
    ///
    /// # Example
    /// ```
    /// use profiled::sink::RecordingSink;
    /// use profiled::Profiler;
    ///
    /// let sink = RecordingSink::new();
    /// let profiler = Profiler::new().with_sink(sink.clone());
    ///
    /// let value = profiler.measure(|| "done");
    /// assert_eq!(value, "done");
    /// assert_eq!(sink.count(), 1);
    /// ```
    pub fn measure<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let fallback_clock;
        let clock: &dyn TimeSource = match &self.clock {
            Some(clock) => &**clock,
            None => {
                fallback_clock = default_clock();
                &*fallback_clock
            }
        };

        let mut record = CallRecord::start(clock, CompletionMode::Synchronous);
        let result = f();

        let fallback_sink;
        let sink: &dyn ReportSink = match &self.sink {
            Some(sink) => &**sink,
            None => {
                fallback_sink = default_sink(self.name.clone());
                &*fallback_sink
            }
        };
        finish(self.name(), sink, clock, &mut record);
        result
    }

    /// Wrap a function that is done when it returns
    ///
    /// `call` and `call_on` need an `Fn` target; a target that mutates its
    /// captured state can still be wrapped and driven through `call_mut`.
    /// The same holds for [`Profiler::callback`] and [`Profiler::future`].
    pub fn sync<F>(self, target: F) -> SyncProfiled<F> {
        SyncProfiled::new(target, self.into_instrument())
    }

    /// Wrap a function whose last argument is a completion callback
    pub fn callback<F>(self, target: F) -> CallbackProfiled<F> {
        CallbackProfiled::new(target, self.into_instrument())
    }

    /// Wrap a function that returns a future
    pub fn future<F>(self, target: F) -> FutureProfiled<F> {
        FutureProfiled::new(target, self.into_instrument())
    }

    fn into_instrument(self) -> Arc<Instrument> {
        let name = self.name.clone();
        let sink = self.sink.unwrap_or_else(|| default_sink(name));
        let clock = self.clock.unwrap_or_else(default_clock);

        Arc::new(Instrument {
            name: self.name,
            sink,
            clock,
        })
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profiler")
            .field("name", &self.name)
            .field("custom_sink", &self.sink.is_some())
            .field("custom_clock", &self.clock.is_some())
            .finish()
    }
}

/// Wrap a synchronous function with the default sink and clock
pub fn profile_sync<F>(target: F) -> SyncProfiled<F> {
    Profiler::new().sync(target)
}

/// Wrap a callback-terminated function with the default sink and clock
pub fn profile_callback<F>(target: F) -> CallbackProfiled<F> {
    Profiler::new().callback(target)
}

/// Wrap a future-returning function with the default sink and clock
pub fn profile_future<F>(target: F) -> FutureProfiled<F> {
    Profiler::new().future(target)
}

/// Profiler named after the function path it is given
///
/// # Example
/// ```
/// use profiled::profiler_for;
///
/// fn parse_header(raw: &str) -> usize {
///     raw.len()
/// }
///
/// let profiler = profiler_for!(parse_header);
/// assert_eq!(profiler.name(), Some("parse_header"));
/// ```
#[macro_export]
macro_rules! profiler_for {
    ($target:path) => {
        $crate::Profiler::named(stringify!($target))
    };
}
