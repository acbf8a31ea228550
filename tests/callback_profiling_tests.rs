//! Integration tests for callback-terminated functions
//!
//! The target receives an interposed callback in place of the caller's one.
//! The duration must be reported before the caller's callback runs, exactly
//! once, with the outcome forwarded unchanged.

mod utils;

use profiled::clock::ManualClock;
use profiled::sink::RecordingSink;
use profiled::{Callback, CompletionMode, Profiler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use utils::{assert_within_tolerance, recording_profiler, TEST_DURATION};

#[derive(Debug, PartialEq)]
struct Response {
    body: &'static str,
}

#[tokio::test(start_paused = true)]
async fn test_profiles_callback_based_function() {
    let argument = Arc::new(String::from("request"));
    let (profiler, sink) = recording_profiler("fetch");

    let expected_argument = Arc::clone(&argument);
    let profiled = profiler.callback(
        move |arg: Arc<String>, callback: Callback<Result<Response, String>>| {
            assert!(
                Arc::ptr_eq(&arg, &expected_argument),
                "Arguments are forwarded"
            );
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                callback(Ok(Response { body: "pong" }));
            });
        },
    );

    let (tx, rx) = oneshot::channel();
    profiled.call(argument, move |outcome| {
        let _ = tx.send(outcome);
    });

    let outcome = rx.await.unwrap();
    assert_eq!(outcome, Ok(Response { body: "pong" }), "Original callback is executed");

    let durations = sink.durations();
    assert_eq!(durations.len(), 1);
    assert_within_tolerance(durations[0], TEST_DURATION);
}

#[tokio::test(start_paused = true)]
async fn test_error_outcome_forwarded_unchanged() {
    let (profiler, sink) = recording_profiler("fail");
    let profiled = profiler.callback(|_: (), callback: Callback<Result<u32, String>>| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            callback(Err("connection reset".to_string()));
        });
    });

    let (tx, rx) = oneshot::channel();
    profiled.call((), move |outcome| {
        let _ = tx.send(outcome);
    });

    assert_eq!(rx.await.unwrap(), Err("connection reset".to_string()));
    assert_eq!(sink.count(), 1);
    assert_within_tolerance(sink.durations()[0], TEST_DURATION);
}

#[test]
fn test_report_fires_before_original_callback() {
    let clock = ManualClock::new(0.0);
    let sink = RecordingSink::new();
    let ticking = clock.clone();

    let profiled = Profiler::new()
        .with_sink(sink.clone())
        .with_time_source(clock.clone())
        .callback(move |_: (), callback: Callback<()>| {
            ticking.advance(10.0);
            callback(());
        });

    let observer = sink.clone();
    let slow_clock = clock.clone();
    let reported_first = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&reported_first);
    profiled.call((), move |()| {
        flag.store(observer.count() == 1, Ordering::SeqCst);
        // Work done by the caller's callback is not part of the duration
        slow_clock.advance(1000.0);
    });

    assert!(reported_first.load(Ordering::SeqCst));
    assert_eq!(sink.durations(), vec![10.0]);
}

#[test]
fn test_returns_target_return_value() {
    let sink = RecordingSink::new();
    let profiled = Profiler::new()
        .with_sink(sink.clone())
        .with_time_source(ManualClock::new(0.0))
        .callback(|id: u64, callback: Callback<u64>| {
            let handle = id * 10;
            callback(id);
            handle
        });

    assert_eq!(profiled.mode(), CompletionMode::Callback);
    assert_eq!(profiled.call(4, |_| {}), 40);
    assert_eq!(sink.count(), 1);
}

#[test]
fn test_future_returned_alongside_callback_is_not_instrumented() {
    let clock = ManualClock::new(0.0);
    let sink = RecordingSink::new();
    let pending: Arc<Mutex<Option<Callback<()>>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&pending);

    let profiled = Profiler::new()
        .with_sink(sink.clone())
        .with_time_source(clock.clone())
        .callback(move |_: (), callback: Callback<()>| {
            *slot.lock().unwrap() = Some(callback);
            std::future::ready("handle")
        });

    let returned = profiled.call((), |()| {});

    // The returned future completes without any report
    let value = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(returned);
    assert_eq!(value, "handle");
    assert_eq!(sink.count(), 0);

    // Only the callback completes the call
    clock.advance(7.0);
    let callback = pending.lock().unwrap().take().unwrap();
    callback(());
    assert_eq!(sink.durations(), vec![7.0]);
}

#[test]
fn test_call_on_forwards_receiver() {
    struct Connection {
        peer: &'static str,
    }

    let sink = RecordingSink::new();
    let profiled = Profiler::new()
        .with_sink(sink.clone())
        .with_time_source(ManualClock::new(0.0))
        .callback(|this: &Connection, payload: u8, callback: Callback<String>| {
            callback(format!("{}:{}", this.peer, payload));
        });

    let connection = Connection { peer: "10.0.0.1" };
    let seen = Arc::new(Mutex::new(String::new()));
    let out = Arc::clone(&seen);
    profiled.call_on(&connection, 9, move |reply| *out.lock().unwrap() = reply);

    assert_eq!(*seen.lock().unwrap(), "10.0.0.1:9");
    assert_eq!(sink.count(), 1);
}

#[test]
fn test_method_returning_borrow_alongside_callback() {
    struct Queue {
        name: String,
    }

    impl Queue {
        fn enqueue(&self, item: u32, callback: Callback<u32>) -> &str {
            callback(item * 2);
            &self.name
        }
    }

    let sink = RecordingSink::new();
    let profiled = Profiler::new()
        .with_sink(sink.clone())
        .with_time_source(ManualClock::new(0.0))
        .callback(Queue::enqueue);

    let queue = Queue {
        name: "jobs".to_string(),
    };
    let seen = Arc::new(Mutex::new(None));
    let out = Arc::clone(&seen);
    let name = profiled.call_on(&queue, 21, move |doubled| *out.lock().unwrap() = Some(doubled));

    assert_eq!(name, "jobs");
    assert_eq!(*seen.lock().unwrap(), Some(42));
    assert_eq!(sink.count(), 1);
}

#[test]
fn test_stateful_target_through_call_mut() {
    let sink = RecordingSink::new();
    let mut accepted = Vec::new();

    let mut profiled = Profiler::new()
        .with_sink(sink.clone())
        .with_time_source(ManualClock::new(0.0))
        .callback(|entry: &'static str, callback: Callback<usize>| {
            accepted.push(entry);
            callback(accepted.len());
        });

    let positions = Arc::new(Mutex::new(Vec::new()));
    for entry in ["first", "second"] {
        let out = Arc::clone(&positions);
        profiled.call_mut(entry, move |position| out.lock().unwrap().push(position));
    }
    drop(profiled);

    assert_eq!(accepted, vec!["first", "second"]);
    assert_eq!(*positions.lock().unwrap(), vec![1, 2]);
    assert_eq!(sink.count(), 2);
}

#[test]
fn test_panic_in_target_propagates_without_report() {
    let sink = RecordingSink::new();
    let profiled = Profiler::new()
        .with_sink(sink.clone())
        .with_time_source(ManualClock::new(0.0))
        .callback(|_: (), _callback: Callback<()>| -> () { panic!("target failed") });

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        profiled.call((), |()| {});
    }));

    assert!(result.is_err());
    assert_eq!(sink.count(), 0);
}

#[test]
#[should_panic(expected = "sink failed")]
fn test_sink_panic_reaches_callback_invoker() {
    let profiled = Profiler::new()
        .with_sink(|_duration: f64| panic!("sink failed"))
        .with_time_source(ManualClock::new(0.0))
        .callback(|_: (), callback: Callback<()>| callback(()));

    profiled.call((), |()| {});
}

#[test]
fn test_overlapping_calls_are_independent() {
    let clock = ManualClock::new(0.0);
    let sink = RecordingSink::new();
    let pending: Arc<Mutex<Vec<Callback<()>>>> = Arc::new(Mutex::new(Vec::new()));
    let slot = Arc::clone(&pending);

    let profiled = Profiler::new()
        .with_sink(sink.clone())
        .with_time_source(clock.clone())
        .callback(move |_: (), callback: Callback<()>| slot.lock().unwrap().push(callback));

    profiled.call((), |()| {}); // starts at 0
    clock.advance(10.0);
    profiled.call((), |()| {}); // starts at 10
    clock.advance(20.0);

    let mut callbacks = std::mem::take(&mut *pending.lock().unwrap());
    let second = callbacks.pop().unwrap();
    let first = callbacks.pop().unwrap();
    second(());
    clock.advance(5.0);
    first(());

    assert_eq!(sink.durations(), vec![20.0, 35.0]);
}
