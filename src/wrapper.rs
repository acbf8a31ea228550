//! Profiled wrappers, one per calling convention
//!
//! Arguments are passed as a single value `A`; use a tuple for several
//! arguments. Each wrapper reports exactly one duration per completed call
//! and otherwise behaves like the wrapped target: arguments, return values
//! and panics pass through unchanged.

use crate::call_record::CompletionMode;
use crate::profiled_future::ProfiledFuture;
use crate::profiler::Instrument;
use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

/// Completion callback handed to callback-style targets
///
/// The outcome type `O` is whatever the target delivers on completion,
/// typically a `Result`.
pub type Callback<O> = Box<dyn FnOnce(O) + Send + 'static>;

/// Wrapper for functions that are done when they return
///
/// The duration is reported after the target returns and before its result
/// is handed back. If the target panics, nothing is reported.
pub struct SyncProfiled<F> {
    target: F,
    instrument: Arc<Instrument>,
}

impl<F> SyncProfiled<F> {
    pub(crate) fn new(target: F, instrument: Arc<Instrument>) -> Self {
        Self { target, instrument }
    }

    pub fn mode(&self) -> CompletionMode {
        CompletionMode::Synchronous
    }

    pub fn call<A, R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
    {
        let mut record = self.instrument.begin(CompletionMode::Synchronous);
        let result = (self.target)(args);
        self.instrument.complete(&mut record);
        result
    }

    /// Call a stateful target
    pub fn call_mut<A, R>(&mut self, args: A) -> R
    where
        F: FnMut(A) -> R,
    {
        let mut record = self.instrument.begin(CompletionMode::Synchronous);
        let result = (self.target)(args);
        self.instrument.complete(&mut record);
        result
    }

    /// Call a method-style target with its receiver
    ///
    /// The result may borrow from `receiver`, so getters such as
    /// `fn entry(&self, index: usize) -> &str` can be wrapped directly.
    pub fn call_on<'r, T, A, R>(&self, receiver: &'r T, args: A) -> R
    where
        T: ?Sized,
        F: Fn(&'r T, A) -> R,
    {
        let mut record = self.instrument.begin(CompletionMode::Synchronous);
        let result = (self.target)(receiver, args);
        self.instrument.complete(&mut record);
        result
    }

    pub fn into_inner(self) -> F {
        self.target
    }
}

/// Wrapper for functions that finish by invoking a completion callback
///
/// The caller's callback is replaced by an interposed [`Callback`] that
/// reports the duration and then forwards the outcome unchanged. The
/// target's own return value is handed back as is, even when it is a
/// future; it is not instrumented.
pub struct CallbackProfiled<F> {
    target: F,
    instrument: Arc<Instrument>,
}

impl<F> CallbackProfiled<F> {
    pub(crate) fn new(target: F, instrument: Arc<Instrument>) -> Self {
        Self { target, instrument }
    }

    pub fn mode(&self) -> CompletionMode {
        CompletionMode::Callback
    }

    pub fn call<A, O, R, C>(&self, args: A, callback: C) -> R
    where
        F: Fn(A, Callback<O>) -> R,
        C: FnOnce(O) + Send + 'static,
        O: 'static,
    {
        let interposed = self.interpose(callback);
        (self.target)(args, interposed)
    }

    /// Call a stateful target
    pub fn call_mut<A, O, R, C>(&mut self, args: A, callback: C) -> R
    where
        F: FnMut(A, Callback<O>) -> R,
        C: FnOnce(O) + Send + 'static,
        O: 'static,
    {
        let interposed = self.interpose(callback);
        (self.target)(args, interposed)
    }

    /// Call a method-style target with its receiver
    pub fn call_on<'r, T, A, O, R, C>(&self, receiver: &'r T, args: A, callback: C) -> R
    where
        T: ?Sized,
        F: Fn(&'r T, A, Callback<O>) -> R,
        C: FnOnce(O) + Send + 'static,
        O: 'static,
    {
        let interposed = self.interpose(callback);
        (self.target)(receiver, args, interposed)
    }

    pub fn into_inner(self) -> F {
        self.target
    }

    fn interpose<O, C>(&self, callback: C) -> Callback<O>
    where
        C: FnOnce(O) + Send + 'static,
        O: 'static,
    {
        let mut record = self.instrument.begin(CompletionMode::Callback);
        let instrument = Arc::clone(&self.instrument);
        Box::new(move |outcome| {
            instrument.complete(&mut record);
            callback(outcome);
        })
    }
}

/// Wrapper for functions that return a future
///
/// The returned [`ProfiledFuture`] reports when the inner future completes,
/// whatever its output. Timing starts when `call` is invoked, not at the
/// first poll.
pub struct FutureProfiled<F> {
    target: F,
    instrument: Arc<Instrument>,
}

impl<F> FutureProfiled<F> {
    pub(crate) fn new(target: F, instrument: Arc<Instrument>) -> Self {
        Self { target, instrument }
    }

    pub fn mode(&self) -> CompletionMode {
        CompletionMode::Awaitable
    }

    pub fn call<A, Fut>(&self, args: A) -> ProfiledFuture<Fut::IntoFuture>
    where
        F: Fn(A) -> Fut,
        Fut: IntoFuture,
    {
        let record = self.instrument.begin(CompletionMode::Awaitable);
        let inner = (self.target)(args).into_future();
        ProfiledFuture::new(inner, record, Arc::clone(&self.instrument))
    }

    /// Call a stateful target
    pub fn call_mut<A, Fut>(&mut self, args: A) -> ProfiledFuture<Fut::IntoFuture>
    where
        F: FnMut(A) -> Fut,
        Fut: IntoFuture,
    {
        let record = self.instrument.begin(CompletionMode::Awaitable);
        let inner = (self.target)(args).into_future();
        ProfiledFuture::new(inner, record, Arc::clone(&self.instrument))
    }

    /// Call a method-style target with its receiver
    ///
    /// The returned future may borrow from `receiver`, which is what an
    /// `async fn(&self, ..)` produces.
    pub fn call_on<'r, T, A, Fut>(
        &self,
        receiver: &'r T,
        args: A,
    ) -> ProfiledFuture<Fut::IntoFuture>
    where
        T: ?Sized,
        F: Fn(&'r T, A) -> Fut,
        Fut: IntoFuture,
    {
        let record = self.instrument.begin(CompletionMode::Awaitable);
        let inner = (self.target)(receiver, args).into_future();
        ProfiledFuture::new(inner, record, Arc::clone(&self.instrument))
    }

    pub fn into_inner(self) -> F {
        self.target
    }
}

macro_rules! impl_debug {
    ($($wrapper:ident),*) => {
        $(
            impl<F> fmt::Debug for $wrapper<F> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($wrapper))
                        .field("name", &self.instrument.name())
                        .field("mode", &self.mode())
                        .finish_non_exhaustive()
                }
            }
        )*
    };
}

impl_debug!(SyncProfiled, CallbackProfiled, FutureProfiled);
