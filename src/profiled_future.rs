//! Instrumented future
//!
//! `ProfiledFuture` passes the inner future's output through untouched and
//! reports the call duration on the poll that observes completion. `Ok` and
//! `Err` outputs are treated alike. A future that is dropped before it
//! completes never reports.

use crate::call_record::CallRecord;
use crate::profiler::Instrument;
use pin_project::pin_project;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct ProfiledFuture<Fut> {
    #[pin]
    inner: Fut,
    record: CallRecord,
    instrument: Arc<Instrument>,
}

impl<Fut> ProfiledFuture<Fut> {
    pub(crate) fn new(inner: Fut, record: CallRecord, instrument: Arc<Instrument>) -> Self {
        Self {
            inner,
            record,
            instrument,
        }
    }

    /// Timestamp taken when the profiled call was made
    pub fn start_time(&self) -> f64 {
        self.record.start_time()
    }
}

impl<Fut: Future> Future for ProfiledFuture<Fut> {
    type Output = Fut::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let output = ready!(this.inner.poll(cx));
        this.instrument.complete(this.record);
        Poll::Ready(output)
    }
}

impl<Fut> fmt::Debug for ProfiledFuture<Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfiledFuture")
            .field("name", &self.instrument.name())
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
