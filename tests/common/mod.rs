//! Shared utilities for integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    unused_imports,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::time::Duration;

use feedclient::{FeedClient, FeedClientBuilder, client::ReconnectBackoff};
pub use feedclient_testing::{sink, transport};
use feedclient_testing::{RecordingSink, ScriptedTransport};
use serde_json::Value;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const FEED_URL: &str = "ws://feed.test/feed";

/// Back-off with a constant `step` so reconnect timing is easy to reason about.
pub fn flat_backoff(step: Duration) -> ReconnectBackoff {
    ReconnectBackoff {
        step,
        max_delay: step,
    }
}

/// Builder wired to the scripted transport with no idle deadline.
pub fn builder(transport: &ScriptedTransport, sink: &RecordingSink<Value>) -> FeedClientBuilder<Value> {
    FeedClient::builder(FEED_URL, sink.clone())
        .transport(transport.clone())
        .idle_timeout(Duration::ZERO)
        .supervisor_delay(Duration::from_secs(1))
        .backoff(flat_backoff(Duration::from_millis(100)))
}
