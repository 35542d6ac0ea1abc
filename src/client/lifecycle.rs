//! Dialling, reconnect back-off and the start-up supervisor.

use std::sync::{Arc, atomic::Ordering};

use serde::de::DeserializeOwned;
use tokio::{select, time::sleep};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, warn};

use super::ClientInner;
use crate::{error::FeedError, metrics};

impl<M> ClientInner<M>
where
    M: DeserializeOwned + Send + Sync + 'static,
{
    /// Make a single connect attempt.
    ///
    /// Succeeds without dialling when the feed is disabled or shutdown has
    /// begun. A dial abandoned through cancellation, or one that completes
    /// after shutdown began, also succeeds without installing a connection.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Connect`] if the dial fails. Every failure
    /// increments the retry counter.
    pub(super) async fn connect(&self, cancel: &CancellationToken) -> Result<(), FeedError> {
        if self.endpoint.is_disabled() || self.slot.is_shutting_down() {
            return Ok(());
        }

        let url = &self.endpoint.url;
        info!(%url, "connecting to feed");
        let dialled = select! {
            biased;

            () = cancel.cancelled() => return Ok(()),
            res = self.transport.dial(url, self.endpoint.dial_timeout) => res,
        };
        let conn = match dialled {
            Ok(conn) => conn,
            Err(source) => {
                self.retry_count.fetch_add(1, Ordering::Relaxed);
                metrics::inc_connect_failures();
                return Err(FeedError::Connect {
                    url: url.clone(),
                    source,
                });
            }
        };

        if self.slot.install(conn) {
            info!(%url, "connected to feed");
        } else {
            debug!(%url, "shutdown began during dial, discarding connection");
        }
        Ok(())
    }

    /// Reconnect with linear back-off until a connect succeeds or the client
    /// stops.
    ///
    /// Shutdown and cancellation end the loop without error; they are checked
    /// before and after every wait.
    pub(super) async fn retry_connect(&self, cancel: &CancellationToken) {
        for delay in self.backoff.delays() {
            if self.should_stop(cancel) {
                return;
            }
            select! {
                biased;

                () = cancel.cancelled() => return,
                () = sleep(delay) => {},
            }
            if self.should_stop(cancel) {
                return;
            }
            match self.connect(cancel).await {
                Ok(()) => return,
                Err(e) => warn!(
                    url = %self.endpoint.url,
                    error = %e,
                    waited = ?delay,
                    "feed reconnect attempt failed"
                ),
            }
        }
    }

    /// Connect until the first success, then hand over to the reader task.
    pub(super) async fn supervise(self: Arc<Self>, cancel: CancellationToken, tracker: TaskTracker) {
        loop {
            match self.connect(&cancel).await {
                Ok(()) => {
                    if self.should_stop(&cancel) {
                        return;
                    }
                    tracker.spawn(Arc::clone(&self).read_loop(cancel));
                    return;
                }
                Err(e) => {
                    warn!(
                        url = %self.endpoint.url,
                        error = %e,
                        retry_in = ?self.supervisor_delay,
                        "failed to connect to feed, waiting and retrying"
                    );
                    select! {
                        biased;

                        () = cancel.cancelled() => return,
                        () = sleep(self.supervisor_delay) => {},
                    }
                }
            }
        }
    }
}
