//! A sink that records what it is asked to apply.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use feedclient::sink::{MessageSink, SinkError};
use tokio::sync::Notify;

/// One call to [`MessageSink::apply`].
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedBatch<M> {
    /// Sequence number of the first payload.
    pub start: u64,
    /// Force flag passed by the client.
    pub force: bool,
    /// Payloads in the order received.
    pub payloads: Vec<M>,
}

struct Inner<M> {
    calls: Mutex<Vec<AppliedBatch<M>>>,
    notify: Notify,
    fail: bool,
}

/// Sink recording every batch; clones share the same record.
pub struct RecordingSink<M> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for RecordingSink<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> Default for RecordingSink<M> {
    fn default() -> Self { Self::with_failure(false) }
}

impl<M> RecordingSink<M> {
    /// A sink that accepts every batch.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// A sink that records every batch and then rejects it.
    #[must_use]
    pub fn failing() -> Self { Self::with_failure(true) }

    fn with_failure(fail: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                calls: Mutex::new(Vec::new()),
                notify: Notify::new(),
                fail,
            }),
        }
    }

    /// Number of batches applied so far.
    pub fn call_count(&self) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait until at least `n` batches have been applied.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.inner.notify.notified();
            if self.call_count() >= n {
                return;
            }
            notified.await;
        }
    }
}

impl<M: Clone> RecordingSink<M> {
    /// Snapshot of every batch applied so far.
    pub fn calls(&self) -> Vec<AppliedBatch<M>> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl<M> MessageSink<M> for RecordingSink<M>
where
    M: Send + Sync + 'static,
{
    async fn apply(&self, start: u64, force: bool, payloads: Vec<M>) -> Result<(), SinkError> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AppliedBatch {
                start,
                force,
                payloads,
            });
        self.inner.notify.notify_waiters();
        if self.inner.fail {
            return Err("recording sink rejected batch".into());
        }
        Ok(())
    }
}
