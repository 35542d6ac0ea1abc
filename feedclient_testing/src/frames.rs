//! Builders for wire frames.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Value, json};

/// Frame carrying `payloads` numbered consecutively from `start`.
pub fn batch<M, I>(start: u64, payloads: I) -> Bytes
where
    M: Serialize,
    I: IntoIterator<Item = M>,
{
    versioned_batch(1, start, payloads)
}

/// Like [`batch`] but with an explicit envelope `version`.
pub fn versioned_batch<M, I>(version: i64, start: u64, payloads: I) -> Bytes
where
    M: Serialize,
    I: IntoIterator<Item = M>,
{
    let messages: Vec<Value> = (start..)
        .zip(payloads)
        .map(|(seq, payload)| json!({"sequenceNumber": seq, "message": payload}))
        .collect();
    to_frame(&json!({"version": version, "messages": messages}))
}

/// Frame carrying only a confirmed sequence number.
pub fn confirmation(seq: u64) -> Bytes {
    to_frame(&json!({"version": 1, "confirmedSequenceNumberMessage": {"sequenceNumber": seq}}))
}

/// Serialise an arbitrary JSON value as a frame.
pub fn to_frame(value: &Value) -> Bytes { Bytes::from(value.to_string()) }

/// Bytes that do not form an envelope.
pub fn malformed() -> Bytes { Bytes::from_static(b"{\"version\":1,\"messages\":[{") }
