// Shared helpers for the integration tests

#![allow(dead_code)]

use profiled::clock::TimeSource;
use profiled::sink::RecordingSink;
use profiled::Profiler;

/// Latency simulated by every scenario, in milliseconds
pub const TEST_DURATION: f64 = 50.0;

/// Allowed deviation between simulated and reported latency
pub const TOLERANCE: f64 = 3.0;

/// Milliseconds since creation, read from tokio's (pausable) clock
pub fn tokio_clock() -> impl TimeSource + 'static {
    let origin = tokio::time::Instant::now();
    move || origin.elapsed().as_secs_f64() * 1000.0
}

/// Profiler on the tokio clock, reporting into a fresh recording sink
pub fn recording_profiler(name: &'static str) -> (Profiler, RecordingSink) {
    let sink = RecordingSink::new();
    let profiler = Profiler::named(name)
        .with_sink(sink.clone())
        .with_time_source(tokio_clock());
    (profiler, sink)
}

pub fn assert_within_tolerance(duration: f64, expected: f64) {
    assert!(
        (duration - expected).abs() <= TOLERANCE,
        "duration {} not within {} of {}",
        duration,
        TOLERANCE,
        expected
    );
}
