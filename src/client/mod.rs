//! Resilient feed client.
//!
//! A [`FeedClient`] keeps one long-lived connection to a feed endpoint. A
//! supervising task dials until the first connection succeeds and then hands
//! over to a reader task. The reader decodes every frame, routes its contents
//! to the [`MessageSink`](crate::sink::MessageSink) and, when the connection
//! fails, reconnects with linear back-off before resuming.
//!
//! Shutdown is two-pronged. Cancelling the token stops the loops at their
//! next check and aborts dials and back-off waits; closing the connection
//! wakes a reader parked inside `read_frame`. [`FeedClient::stop_and_wait`]
//! does both and then joins every task.

mod backoff;
mod builder;
mod lifecycle;
mod reader;
mod state;

use std::{
    fmt,
    sync::{
        Arc,
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

pub use backoff::ReconnectBackoff;
pub use builder::FeedClientBuilder;
use serde::de::DeserializeOwned;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, warn};

use self::state::ConnectionSlot;
use crate::{router::Router, sink::MessageSink, transport::Transport};

/// Default timeout for a single dial.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);
/// Default idle-read timeout.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(20);
/// Default wait between failed start-up connect attempts.
pub const DEFAULT_SUPERVISOR_DELAY: Duration = Duration::from_secs(5);

/// Connection target. Immutable for the client's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Feed URL. Empty disables the feed.
    pub url: String,
    /// Maximum silence before a read fails. Zero waits indefinitely.
    pub idle_timeout: Duration,
    /// Maximum duration of one dial.
    pub dial_timeout: Duration,
}

impl Endpoint {
    /// Returns `true` when no URL is configured.
    #[must_use]
    pub fn is_disabled(&self) -> bool { self.url.is_empty() }
}

pub(crate) struct ClientInner<M> {
    endpoint: Endpoint,
    transport: Arc<dyn Transport>,
    slot: ConnectionSlot,
    retry_count: AtomicU64,
    router: Router<M>,
    backoff: ReconnectBackoff,
    supervisor_delay: Duration,
}

impl<M> ClientInner<M> {
    /// Authoritative stop check: explicit shutdown or cancellation.
    fn should_stop(&self, cancel: &CancellationToken) -> bool {
        cancel.is_cancelled() || self.slot.is_shutting_down()
    }
}

/// Client maintaining an ordered message stream from one feed endpoint.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use feedclient::{
///     FeedClient,
///     sink::{MessageSink, SinkError},
/// };
/// use tokio_util::sync::CancellationToken;
///
/// struct Print;
///
/// #[async_trait]
/// impl MessageSink<serde_json::Value> for Print {
///     async fn apply(
///         &self,
///         start: u64,
///         _force: bool,
///         payloads: Vec<serde_json::Value>,
///     ) -> Result<(), SinkError> {
///         println!("{start}: {payloads:?}");
///         Ok(())
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// let client = FeedClient::builder("ws://127.0.0.1:9642", Print).build();
/// let token = CancellationToken::new();
/// client.start(&token);
/// // ...
/// client.stop_and_wait().await;
/// # }
/// ```
pub struct FeedClient<M> {
    inner: Arc<ClientInner<M>>,
    tracker: TaskTracker,
    cancel: OnceLock<CancellationToken>,
    initial_sequence_number: u64,
}

impl<M> fmt::Debug for FeedClient<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedClient")
            .field("endpoint", &self.inner.endpoint)
            .field("retry_count", &self.retry_count())
            .finish_non_exhaustive()
    }
}

impl<M> FeedClient<M>
where
    M: DeserializeOwned + Send + Sync + 'static,
{
    /// Start building a client for `url` that forwards payloads to `sink`.
    #[must_use]
    pub fn builder<S>(url: impl Into<String>, sink: S) -> FeedClientBuilder<M>
    where
        S: MessageSink<M> + 'static,
    {
        FeedClientBuilder::new(url.into(), Arc::new(sink))
    }

    /// Create a client with default dial timeout and back-off.
    ///
    /// `initial_sequence_number` is an advisory hint and defaults to `0`.
    #[must_use]
    pub fn new<S>(
        url: impl Into<String>,
        initial_sequence_number: Option<u64>,
        idle_timeout: Duration,
        sink: S,
    ) -> Self
    where
        S: MessageSink<M> + 'static,
    {
        let mut builder = Self::builder(url, sink).idle_timeout(idle_timeout);
        if let Some(seq) = initial_sequence_number {
            builder = builder.initial_sequence_number(seq);
        }
        builder.build()
    }

    /// Begin connecting in the background.
    ///
    /// Cancelling `parent` stops the client as if cancellation came from
    /// [`stop_and_wait`](Self::stop_and_wait). With an empty URL nothing is
    /// spawned and no dial is ever attempted. Only the first call has effect.
    pub fn start(&self, parent: &CancellationToken) {
        if self.inner.endpoint.is_disabled() {
            info!("feed url not configured, feed client disabled");
            return;
        }
        let cancel = parent.child_token();
        if self.cancel.set(cancel.clone()).is_err() {
            warn!(url = %self.inner.endpoint.url, "feed client already started");
            return;
        }
        let inner = Arc::clone(&self.inner);
        let tracker = self.tracker.clone();
        self.tracker.spawn(inner.supervise(cancel, tracker));
    }

    /// Stop every task and close the connection.
    ///
    /// Cancels the client's token, then marks shutdown and closes the held
    /// connection under the lock, and finally waits for all tasks to finish.
    /// Safe to call more than once.
    pub async fn stop_and_wait(&self) {
        debug!(url = %self.inner.endpoint.url, "closing feed client connection");
        if let Some(cancel) = self.cancel.get() {
            cancel.cancel();
        }
        self.inner.slot.shut_down();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl<M> FeedClient<M> {
    /// Number of failed dial attempts so far. Never decreases.
    #[must_use]
    pub fn retry_count(&self) -> u64 { self.inner.retry_count.load(Ordering::Relaxed) }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool { self.inner.slot.is_shutting_down() }

    /// Whether a connection is currently installed.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.inner.slot.connection().is_some() }

    /// Advisory starting sequence number supplied at construction.
    #[must_use]
    pub fn initial_sequence_number(&self) -> u64 { self.initial_sequence_number }

    /// The endpoint this client reads from.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint { &self.inner.endpoint }
}
