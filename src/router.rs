//! Routes decoded envelopes to the sink and confirmation observers.

use std::{sync::Arc, time::Duration};

use tokio::{
    select,
    sync::mpsc::{self, error::SendTimeoutError},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    envelope::FeedEnvelope,
    metrics::{self, ErrorKind},
    sink::MessageSink,
};

/// Default time a confirmation may wait for channel capacity.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Publishes confirmed sequence numbers to a caller-owned channel.
///
/// The publisher only ever sends. A send that cannot complete within the
/// timeout, or whose receiver has gone, drops the value with a warning so the
/// reader never stalls behind an undrained channel.
#[derive(Clone, Debug)]
pub struct ConfirmationPublisher {
    tx: mpsc::Sender<u64>,
    timeout: Duration,
}

impl ConfirmationPublisher {
    /// Publish to `tx`, waiting at most `timeout` for capacity.
    #[must_use]
    pub fn new(tx: mpsc::Sender<u64>, timeout: Duration) -> Self { Self { tx, timeout } }

    /// Send `seq`, giving up on timeout, a closed channel, or cancellation.
    ///
    /// Returns `true` if the value was delivered.
    pub async fn publish(&self, seq: u64, cancel: &CancellationToken) -> bool {
        let outcome = select! {
            biased;

            () = cancel.cancelled() => return false,
            res = self.tx.send_timeout(seq, self.timeout) => res,
        };
        match outcome {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(seq)) => {
                warn!(seq, timeout = ?self.timeout, "confirmation channel full, dropping confirmed sequence number");
                metrics::inc_errors(ErrorKind::Confirmation);
                false
            }
            Err(SendTimeoutError::Closed(seq)) => {
                warn!(seq, "confirmation channel closed, dropping confirmed sequence number");
                metrics::inc_errors(ErrorKind::Confirmation);
                false
            }
        }
    }
}

/// Dispatches the contents of each envelope.
pub(crate) struct Router<M> {
    sink: Arc<dyn MessageSink<M>>,
    confirmations: Option<ConfirmationPublisher>,
}

impl<M> Router<M>
where
    M: Send + 'static,
{
    pub(crate) fn new(
        sink: Arc<dyn MessageSink<M>>,
        confirmations: Option<ConfirmationPublisher>,
    ) -> Self {
        Self {
            sink,
            confirmations,
        }
    }

    /// Apply a decoded envelope.
    ///
    /// Only supported versions reach the sink or the confirmation channel.
    /// Sink failures are logged and never propagated.
    pub(crate) async fn route(&self, envelope: FeedEnvelope<M>, cancel: &CancellationToken) {
        log_summary(&envelope);
        if !envelope.is_supported() {
            return;
        }

        let confirmed = envelope.confirmed();
        if let Some(start) = envelope.first_sequence_number() {
            let payloads = envelope.into_payloads();
            if let Err(e) = self.sink.apply(start, false, payloads).await {
                error!(start, error = %e, "error adding messages from feed");
                metrics::inc_errors(ErrorKind::Sink);
            }
        }
        if let (Some(seq), Some(publisher)) = (confirmed, &self.confirmations) {
            publisher.publish(seq, cancel).await;
        }
    }
}

fn log_summary<M>(envelope: &FeedEnvelope<M>) {
    if let Some(first) = envelope.first_sequence_number() {
        debug!(
            count = envelope.messages.len(),
            first_seq = first,
            version = envelope.version,
            "received batch item"
        );
    } else if let Some(seq) = envelope.confirmed() {
        debug!(seq, version = envelope.version, "confirmed sequence number");
    } else {
        debug!(version = envelope.version, "received broadcast with no messages populated");
    }
}
