//! Profiled - function-call duration profiler
//!
//! This library wraps a function so that every call reports its elapsed
//! time to a sink, while arguments, return values and panics pass through
//! unchanged. Three calling conventions are supported, each with its own
//! wrapper: synchronous functions, functions that finish by invoking a
//! completion callback, and functions that return a future.

pub mod call_record;
pub mod clock;
pub mod config;
pub mod profiled_future;
pub mod profiler;
pub mod sink;
pub mod wrapper;

pub use call_record::CompletionMode;
pub use profiled_future::ProfiledFuture;
pub use profiler::{profile_callback, profile_future, profile_sync, Profiler};
pub use wrapper::{Callback, CallbackProfiled, FutureProfiled, SyncProfiled};
