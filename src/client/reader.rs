//! The read-decode-dispatch loop.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::ClientInner;
use crate::{
    envelope,
    error::{FeedError, TransportError},
    metrics::{self, ErrorKind},
};

impl<M> ClientInner<M>
where
    M: DeserializeOwned + Send + Sync + 'static,
{
    /// Read frames until the client stops.
    ///
    /// `read_frame` is the only suspension point besides reconnecting and
    /// the sink. It does not observe `cancel`; a parked read is woken by
    /// closing the connection. A failed read closes the connection and
    /// reconnects. Reading without a connection fails the same way, so a
    /// reconnect that was abandoned is retried on the next pass.
    pub(super) async fn read_loop(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }

            let conn = self.slot.connection();
            let result = match &conn {
                Some(conn) => conn.read_frame(self.endpoint.idle_timeout).await,
                None => Err(TransportError::NotConnected),
            };

            match result {
                Ok(frame) => self.handle_frame(&frame, &cancel).await,
                Err(err) => {
                    if self.should_stop(&cancel) {
                        return;
                    }
                    self.log_read_error(&err);
                    metrics::inc_errors(ErrorKind::Read);
                    if let Some(conn) = conn {
                        self.slot.discard(&conn);
                    }
                    self.retry_connect(&cancel).await;
                }
            }
        }
    }

    async fn handle_frame(&self, frame: &Bytes, cancel: &CancellationToken) {
        if frame.is_empty() {
            return;
        }
        metrics::inc_frames();
        match envelope::decode::<M>(frame).map_err(FeedError::from) {
            Ok(envelope) => self.router.route(envelope, cancel).await,
            Err(e) => {
                error!(
                    url = %self.endpoint.url,
                    len = frame.len(),
                    frame = %String::from_utf8_lossy(frame),
                    error = %e,
                    "error decoding feed message"
                );
                metrics::inc_errors(ErrorKind::Decode);
            }
        }
    }

    fn log_read_error(&self, err: &TransportError) {
        let url = &self.endpoint.url;
        if err.is_idle_timeout() {
            error!(%url, error = %err, "feed connection timed out without receiving data");
        } else {
            error!(%url, error = %err, "error reading from feed");
        }
    }
}
