//! Metric helpers for `feedclient`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature every helper is a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking live feed connections.
pub const CONNECTIONS_ACTIVE: &str = "feedclient_connections_active";
/// Name of the counter tracking frames read from the feed.
pub const FRAMES_RECEIVED: &str = "feedclient_frames_received_total";
/// Name of the counter tracking failed dial attempts.
pub const CONNECT_FAILURES: &str = "feedclient_connect_failures_total";
/// Name of the counter tracking recoverable errors by kind.
pub const ERRORS_TOTAL: &str = "feedclient_errors_total";

/// Category of a recoverable error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A frame read failed.
    Read,
    /// A frame could not be decoded.
    Decode,
    /// The downstream sink rejected a batch.
    Sink,
    /// A confirmation was dropped.
    Confirmation,
}

impl ErrorKind {
    /// Label value used for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Read => "read",
            ErrorKind::Decode => "decode",
            ErrorKind::Sink => "sink",
            ErrorKind::Confirmation => "confirmation",
        }
    }
}

/// Increment the live connections gauge.
#[cfg(feature = "metrics")]
pub fn inc_connections() { gauge!(CONNECTIONS_ACTIVE).increment(1.0); }

/// Decrement the live connections gauge.
#[cfg(feature = "metrics")]
pub fn dec_connections() { gauge!(CONNECTIONS_ACTIVE).decrement(1.0); }

/// Record a frame read from the feed.
#[cfg(feature = "metrics")]
pub fn inc_frames() { counter!(FRAMES_RECEIVED).increment(1); }

/// Record a failed dial attempt.
#[cfg(feature = "metrics")]
pub fn inc_connect_failures() { counter!(CONNECT_FAILURES).increment(1); }

/// Record a recoverable error.
#[cfg(feature = "metrics")]
pub fn inc_errors(kind: ErrorKind) {
    counter!(ERRORS_TOTAL, "kind" => kind.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub fn inc_connections() {}

#[cfg(not(feature = "metrics"))]
pub fn dec_connections() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_frames() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_connect_failures() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_errors(_kind: ErrorKind) {}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    use super::*;

    // `DebugValue` does not implement `Clone` in metrics-util 0.20.
    fn owned(value: &DebugValue) -> DebugValue {
        match value {
            DebugValue::Counter(c) => DebugValue::Counter(*c),
            DebugValue::Gauge(g) => DebugValue::Gauge(*g),
            DebugValue::Histogram(h) => DebugValue::Histogram(h.clone()),
        }
    }

    #[test]
    fn error_counter_is_labelled_by_kind() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            inc_errors(ErrorKind::Decode);
            inc_errors(ErrorKind::Decode);
            inc_errors(ErrorKind::Sink);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let count_for = |kind: &str| {
            snapshot
                .iter()
                .find(|(key, _, _, _)| {
                    key.key().name() == ERRORS_TOTAL
                        && key.key().labels().any(|l| l.value() == kind)
                })
                .map(|(_, _, _, value)| owned(value))
        };
        assert_eq!(count_for("decode"), Some(DebugValue::Counter(2)));
        assert_eq!(count_for("sink"), Some(DebugValue::Counter(1)));
        assert_eq!(count_for("read"), None);
    }

    #[test]
    fn connection_gauge_tracks_install_and_close() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            inc_connections();
            inc_connections();
            dec_connections();
            inc_frames();
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let gauge = snapshot
            .iter()
            .find(|(key, _, _, _)| key.key().name() == CONNECTIONS_ACTIVE)
            .map(|(_, _, _, value)| owned(value));
        assert_eq!(gauge, Some(DebugValue::Gauge(1.0.into())));
    }
}
