//! Builder for [`FeedClient`].

use std::{
    sync::{Arc, OnceLock, atomic::AtomicU64},
    time::Duration,
};

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use super::{
    ClientInner,
    DEFAULT_DIAL_TIMEOUT,
    DEFAULT_IDLE_TIMEOUT,
    DEFAULT_SUPERVISOR_DELAY,
    Endpoint,
    FeedClient,
    ReconnectBackoff,
    state::ConnectionSlot,
};
use crate::{
    router::{ConfirmationPublisher, DEFAULT_CONFIRMATION_TIMEOUT, Router},
    sink::MessageSink,
    transport::{Transport, WebSocketTransport},
};

/// Configures and creates a [`FeedClient`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use async_trait::async_trait;
/// use feedclient::{
///     FeedClient,
///     client::ReconnectBackoff,
///     sink::{MessageSink, SinkError},
/// };
///
/// struct Discard;
///
/// #[async_trait]
/// impl MessageSink<serde_json::Value> for Discard {
///     async fn apply(&self, _: u64, _: bool, _: Vec<serde_json::Value>) -> Result<(), SinkError> {
///         Ok(())
///     }
/// }
///
/// let (tx, _rx) = tokio::sync::mpsc::channel(16);
/// let client = FeedClient::builder("ws://127.0.0.1:9642", Discard)
///     .idle_timeout(Duration::from_secs(30))
///     .initial_sequence_number(1_000)
///     .backoff(ReconnectBackoff::default())
///     .confirmations(tx)
///     .build();
/// assert_eq!(client.initial_sequence_number(), 1_000);
/// ```
pub struct FeedClientBuilder<M> {
    url: String,
    sink: Arc<dyn MessageSink<M>>,
    idle_timeout: Duration,
    dial_timeout: Duration,
    initial_sequence_number: u64,
    backoff: ReconnectBackoff,
    supervisor_delay: Duration,
    confirmations: Option<mpsc::Sender<u64>>,
    confirmation_timeout: Duration,
    transport: Arc<dyn Transport>,
}

impl<M> FeedClientBuilder<M>
where
    M: DeserializeOwned + Send + Sync + 'static,
{
    pub(super) fn new(url: String, sink: Arc<dyn MessageSink<M>>) -> Self {
        Self {
            url,
            sink,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            initial_sequence_number: 0,
            backoff: ReconnectBackoff::default(),
            supervisor_delay: DEFAULT_SUPERVISOR_DELAY,
            confirmations: None,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            transport: Arc::new(WebSocketTransport),
        }
    }

    /// Maximum silence on a connection before it is considered dead.
    ///
    /// Zero disables the idle deadline.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Maximum duration of a single dial.
    #[must_use]
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Advisory starting sequence number. Not enforced.
    #[must_use]
    pub fn initial_sequence_number(mut self, seq: u64) -> Self {
        self.initial_sequence_number = seq;
        self
    }

    /// Back-off applied between reconnect attempts after a connection fails.
    #[must_use]
    pub fn backoff(mut self, backoff: ReconnectBackoff) -> Self {
        self.backoff = backoff.normalized();
        self
    }

    /// Wait between failed connect attempts before the first connection.
    #[must_use]
    pub fn supervisor_delay(mut self, delay: Duration) -> Self {
        self.supervisor_delay = delay;
        self
    }

    /// Publish confirmed sequence numbers to `tx`.
    ///
    /// The caller owns the receiving end and must drain it; values that
    /// cannot be delivered within the confirmation timeout are dropped.
    #[must_use]
    pub fn confirmations(mut self, tx: mpsc::Sender<u64>) -> Self {
        self.confirmations = Some(tx);
        self
    }

    /// How long a confirmation may wait for channel capacity.
    #[must_use]
    pub fn confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Replace the default WebSocket transport.
    #[must_use]
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Transport,
    {
        self.transport = Arc::new(transport);
        self
    }

    /// Finish configuration. The client does nothing until started.
    #[must_use]
    pub fn build(self) -> FeedClient<M> {
        let confirmations = self
            .confirmations
            .map(|tx| ConfirmationPublisher::new(tx, self.confirmation_timeout));
        FeedClient {
            inner: Arc::new(ClientInner {
                endpoint: Endpoint {
                    url: self.url,
                    idle_timeout: self.idle_timeout,
                    dial_timeout: self.dial_timeout,
                },
                transport: self.transport,
                slot: ConnectionSlot::default(),
                retry_count: AtomicU64::new(0),
                router: Router::new(self.sink, confirmations),
                backoff: self.backoff,
                supervisor_delay: self.supervisor_delay,
            }),
            tracker: TaskTracker::new(),
            cancel: OnceLock::new(),
            initial_sequence_number: self.initial_sequence_number,
        }
    }
}
