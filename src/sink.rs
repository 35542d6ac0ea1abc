//! Downstream consumer of decoded feed payloads.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// Error returned by a [`MessageSink`].
pub type SinkError = BoxError;

/// Component that durably applies ordered feed payloads.
///
/// The client calls [`apply`](MessageSink::apply) once per envelope carrying
/// payloads, in the order frames arrive on a connection. Errors are logged by
/// the client and never retried; the sink owns its own retry and consistency
/// policy. Awaiting inside `apply` is the sink's backpressure: the reader does
/// not read the next frame until the call returns.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use feedclient::sink::{MessageSink, SinkError};
///
/// struct Discard;
///
/// #[async_trait]
/// impl MessageSink<serde_json::Value> for Discard {
///     async fn apply(
///         &self,
///         _start: u64,
///         _force: bool,
///         _payloads: Vec<serde_json::Value>,
///     ) -> Result<(), SinkError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MessageSink<M>: Send + Sync {
    /// Apply `payloads`, the first of which sits at sequence number `start`.
    ///
    /// The client always passes `force = false`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the payloads could not be applied.
    async fn apply(&self, start: u64, force: bool, payloads: Vec<M>) -> Result<(), SinkError>;
}

#[async_trait]
impl<M, S> MessageSink<M> for Arc<S>
where
    M: Send + 'static,
    S: MessageSink<M> + ?Sized,
{
    async fn apply(&self, start: u64, force: bool, payloads: Vec<M>) -> Result<(), SinkError> {
        (**self).apply(start, force, payloads).await
    }
}
