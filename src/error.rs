//! Error types for feed client operations.

use std::time::Duration;

/// Boxed error type used for opaque transport and sink failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a [`crate::transport::Transport`] or
/// [`crate::transport::FeedConnection`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The dial did not complete within the configured timeout.
    #[error("dial timed out after {0:?}")]
    DialTimeout(Duration),
    /// No frame arrived within the configured idle timeout.
    #[error("i/o timeout: no frame received within {0:?}")]
    IdleTimeout(Duration),
    /// The connection was closed locally or by the peer.
    #[error("connection closed")]
    Closed,
    /// A read was attempted while no connection is held.
    #[error("not connected")]
    NotConnected,
    /// The handshake or the underlying socket failed.
    #[error("transport error: {0}")]
    Io(#[source] BoxError),
}

impl TransportError {
    /// Returns `true` if the error is an idle-read timeout.
    #[must_use]
    pub fn is_idle_timeout(&self) -> bool { matches!(self, Self::IdleTimeout(_)) }
}

/// Errors raised while decoding a feed envelope.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame is not a well-formed envelope.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
    /// Message sequence numbers inside one envelope are not strictly increasing.
    #[error("sequence number {next} follows {previous} within one envelope")]
    SequenceOutOfOrder {
        /// Sequence number of the earlier message.
        previous: u64,
        /// Sequence number of the offending message.
        next: u64,
    },
}

/// Errors surfaced by [`crate::FeedClient`] operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A single connect attempt failed.
    #[error("feed client unable to connect to {url}: {source}")]
    Connect {
        /// Endpoint that was dialled.
        url: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// A received frame could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(TransportError::IdleTimeout(Duration::from_secs(1)), true)]
    #[case(TransportError::Closed, false)]
    #[case(TransportError::NotConnected, false)]
    #[case(TransportError::DialTimeout(Duration::from_secs(10)), false)]
    fn idle_timeout_is_identifiable(#[case] err: TransportError, #[case] expected: bool) {
        assert_eq!(err.is_idle_timeout(), expected);
    }

    #[test]
    fn decode_error_is_reported_transparently() {
        let err = FeedError::from(DecodeError::SequenceOutOfOrder { previous: 8, next: 7 });
        assert_eq!(err.to_string(), "sequence number 7 follows 8 within one envelope");
        assert!(matches!(
            err,
            FeedError::Decode(DecodeError::SequenceOutOfOrder { previous: 8, next: 7 })
        ));
    }

    #[test]
    fn connect_error_names_url_and_keeps_source() {
        let err = FeedError::Connect {
            url: "ws://feed.invalid".into(),
            source: TransportError::DialTimeout(Duration::from_secs(10)),
        };
        assert_eq!(
            err.to_string(),
            "feed client unable to connect to ws://feed.invalid: dial timed out after 10s"
        );
        let source = std::error::Error::source(&err).expect("source retained");
        assert_eq!(source.to_string(), "dial timed out after 10s");
    }
}
