//! A set of feed clients, one per configured endpoint.

use std::sync::Arc;

use futures::future::join_all;
use log::info;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    FeedClient,
    FeedClientBuilder,
    config::FeedClientConfig,
    sink::MessageSink,
    transport::{Transport, WebSocketTransport},
};

/// Feed clients sharing one sink and one confirmation channel.
///
/// Every client runs independently. The sink sees batches from all of them
/// interleaved in arrival order.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use feedclient::{
///     FeedClients,
///     config::FeedClientConfig,
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
/// let clients = FeedClients::new(&FeedClientConfig::default(), None, Discard, None);
/// assert!(clients.is_empty());
/// ```
pub struct FeedClients<M> {
    clients: Vec<FeedClient<M>>,
}

impl<M> FeedClients<M>
where
    M: DeserializeOwned + Send + Sync + 'static,
{
    /// Build one WebSocket client per non-empty URL in `config`.
    ///
    /// A disabled configuration yields an empty set.
    #[must_use]
    pub fn new<S>(
        config: &FeedClientConfig,
        initial_sequence_number: Option<u64>,
        sink: S,
        confirmations: Option<mpsc::Sender<u64>>,
    ) -> Self
    where
        S: MessageSink<M> + 'static,
    {
        Self::with_transport(config, initial_sequence_number, sink, confirmations, WebSocketTransport)
    }

    /// Like [`new`](Self::new) but dialling through `transport`.
    #[must_use]
    pub fn with_transport<S, T>(
        config: &FeedClientConfig,
        initial_sequence_number: Option<u64>,
        sink: S,
        confirmations: Option<mpsc::Sender<u64>>,
        transport: T,
    ) -> Self
    where
        S: MessageSink<M> + 'static,
        T: Transport + Clone,
    {
        if !config.enabled() {
            info!("feed input not configured, no feed clients created");
            return Self::from_clients(Vec::new());
        }
        let sink: Arc<dyn MessageSink<M>> = Arc::new(sink);
        let clients = config
            .endpoints()
            .map(|url| {
                let mut builder: FeedClientBuilder<M> = FeedClient::builder(url, Arc::clone(&sink))
                    .idle_timeout(config.timeout)
                    .initial_sequence_number(initial_sequence_number.unwrap_or_default())
                    .transport(transport.clone());
                if let Some(tx) = &confirmations {
                    builder = builder.confirmations(tx.clone());
                }
                builder.build()
            })
            .collect();
        Self::from_clients(clients)
    }

    /// Start every client under `parent`.
    pub fn start(&self, parent: &CancellationToken) {
        info!("starting {} feed client(s)", self.clients.len());
        for client in &self.clients {
            client.start(parent);
        }
    }

    /// Stop every client concurrently and wait for all of them.
    pub async fn stop_and_wait(&self) {
        join_all(self.clients.iter().map(FeedClient::stop_and_wait)).await;
    }
}

impl<M> FeedClients<M> {
    /// Wrap already-built clients.
    #[must_use]
    pub fn from_clients(clients: Vec<FeedClient<M>>) -> Self { Self { clients } }

    /// Failed dial attempts summed over every client.
    #[must_use]
    pub fn retry_count(&self) -> u64 { self.clients.iter().map(FeedClient::retry_count).sum() }

    /// Number of clients.
    #[must_use]
    pub fn len(&self) -> usize { self.clients.len() }

    /// Whether no client is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.clients.is_empty() }

    /// Iterate over the clients in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &FeedClient<M>> { self.clients.iter() }
}
