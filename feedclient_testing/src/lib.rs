//! Test doubles for driving a [`FeedClient`](feedclient::FeedClient)
//! without a network.
//!
//! [`ScriptedTransport`] hands out dial outcomes in the order they were
//! scripted. Each scripted connection is driven from the test through a
//! [`ConnectionHandle`]. [`RecordingSink`] captures every batch the client
//! applies. The [`transport`] and [`sink`] fixtures supply fresh instances
//! to `rstest` tests.
//!
//! ```rust
//! use feedclient::FeedClient;
//! use feedclient_testing::{RecordingSink, ScriptedTransport, frames};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let transport = ScriptedTransport::new();
//! let conn = transport.connect_next();
//! let sink = RecordingSink::<serde_json::Value>::new();
//! let client = FeedClient::builder("ws://feed.test", sink.clone())
//!     .transport(transport.clone())
//!     .build();
//! client.start(&CancellationToken::new());
//! conn.send(frames::batch(5, [serde_json::json!({"n": 1})]));
//! sink.wait_for_calls(1).await;
//! client.stop_and_wait().await;
//! # }
//! ```

mod fixtures;
pub mod frames;
mod recording;
mod scripted;

pub use fixtures::{sink, transport};
pub use recording::{AppliedBatch, RecordingSink};
pub use scripted::{ConnectionHandle, ScriptedTransport};
