//! Transport capabilities used by the feed client.
//!
//! The client never touches sockets directly. It dials through a
//! [`Transport`] and reads frames through the resulting [`FeedConnection`].
//! [`WebSocketTransport`] is the production implementation.

mod websocket;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;

pub use self::websocket::WebSocketTransport;
use crate::error::TransportError;

/// Shared handle to an open feed connection.
pub type Connection = Arc<dyn FeedConnection>;

/// Dials feed endpoints.
///
/// Implementations must be cancellation-safe: dropping a pending `dial`
/// future must not leak a connection.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a connection to `url`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::DialTimeout`] when the deadline passes and
    /// [`TransportError::Io`] for handshake or socket failures.
    async fn dial(&self, url: &str, timeout: Duration) -> Result<Connection, TransportError>;
}

/// An open, bidirectional feed connection.
///
/// `read_frame` and `close` take `&self` so the coordinator can close a
/// connection while the reader is parked inside `read_frame`.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FeedConnection: Send + Sync {
    /// Read the next frame.
    ///
    /// An empty frame carries no data (for example a keep-alive) and is
    /// skipped by the reader. `idle_timeout` of zero waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::IdleTimeout`] when no frame arrives in time,
    /// [`TransportError::Closed`] once the connection is closed, and
    /// [`TransportError::Io`] for other failures.
    async fn read_frame(&self, idle_timeout: Duration) -> Result<Bytes, TransportError>;

    /// Close the connection, waking any pending `read_frame`.
    ///
    /// Closing an already closed connection has no effect.
    fn close(&self);
}
