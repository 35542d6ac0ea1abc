#![doc(html_root_url = "https://docs.rs/feedclient/latest")]
//! Public API for the `feedclient` library.
//!
//! This crate follows sequenced message feeds: it keeps a long-lived
//! connection to each endpoint, reconnects with linear back-off, decodes
//! versioned envelopes and forwards their payloads, in order, to a
//! [`MessageSink`]. Confirmed sequence numbers can be observed through an
//! optional channel.

pub mod client;
pub mod clients;
pub mod config;
pub mod envelope;
pub mod error;
pub mod metrics;
pub mod router;
pub mod sink;
pub mod transport;

pub use client::{FeedClient, FeedClientBuilder, ReconnectBackoff};
pub use clients::FeedClients;
pub use envelope::{FeedEnvelope, FeedMessage, SUPPORTED_VERSION, decode};
pub use error::{DecodeError, FeedError, TransportError};
pub use metrics::{CONNECT_FAILURES, CONNECTIONS_ACTIVE, ERRORS_TOTAL, FRAMES_RECEIVED};
pub use sink::{MessageSink, SinkError};
pub use transport::{FeedConnection, Transport, WebSocketTransport};
