//! Wire envelope carried by every feed frame.
//!
//! A frame is a JSON object:
//!
//! ```json
//! {
//!   "version": 1,
//!   "messages": [{ "sequenceNumber": 5, "message": {} }],
//!   "confirmedSequenceNumberMessage": { "sequenceNumber": 4 }
//! }
//! ```
//!
//! Every field is optional on the wire. Absent or `null` message lists decode
//! as empty and an absent version decodes as `0`, which no client applies.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DecodeError;

/// The only envelope version whose contents are applied.
pub const SUPPORTED_VERSION: i64 = 1;

/// One payload together with its position in the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMessage<M> {
    /// Position of the payload in the feed's total order.
    pub sequence_number: u64,
    /// Opaque payload forwarded to the sink.
    pub message: M,
}

/// Checkpoint marker: everything up to and including `sequence_number` is final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedSequenceNumber {
    /// The confirmed sequence number.
    pub sequence_number: u64,
}

/// A decoded feed frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEnvelope<M> {
    /// Envelope format version. Any integer decodes; only
    /// [`SUPPORTED_VERSION`] is applied.
    #[serde(default)]
    pub version: i64,
    /// Ordered payloads; may be empty.
    #[serde(
        default = "Vec::new",
        deserialize_with = "null_as_empty",
        bound(deserialize = "M: Deserialize<'de>")
    )]
    pub messages: Vec<FeedMessage<M>>,
    /// Optional checkpoint marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_sequence_number_message: Option<ConfirmedSequenceNumber>,
}

impl<M> FeedEnvelope<M> {
    /// Returns `true` if this envelope uses the supported version.
    #[must_use]
    pub fn is_supported(&self) -> bool { self.version == SUPPORTED_VERSION }

    /// Sequence number of the first payload, if any.
    #[must_use]
    pub fn first_sequence_number(&self) -> Option<u64> {
        self.messages.first().map(|m| m.sequence_number)
    }

    /// The confirmed sequence number, if the envelope carries one.
    #[must_use]
    pub fn confirmed(&self) -> Option<u64> {
        self.confirmed_sequence_number_message
            .map(|c| c.sequence_number)
    }

    /// Consume the envelope, returning its payloads in feed order.
    #[must_use]
    pub fn into_payloads(self) -> Vec<M> {
        self.messages.into_iter().map(|m| m.message).collect()
    }

    fn check_order(&self) -> Result<(), DecodeError> {
        for pair in self.messages.windows(2) {
            if let [previous, next] = pair
                && next.sequence_number <= previous.sequence_number
            {
                return Err(DecodeError::SequenceOutOfOrder {
                    previous: previous.sequence_number,
                    next: next.sequence_number,
                });
            }
        }
        Ok(())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a raw frame into an envelope.
///
/// Only the envelope's shape is validated: well-formed JSON with the expected
/// field types and strictly increasing message sequence numbers. Payload
/// contents are opaque to the decoder beyond deserialising into `M`.
///
/// # Errors
///
/// Returns [`DecodeError`] if the frame is malformed.
///
/// # Examples
///
/// ```
/// use feedclient::envelope::decode;
///
/// let frame = br#"{"version":1,"confirmedSequenceNumberMessage":{"sequenceNumber":42}}"#;
/// let envelope = decode::<serde_json::Value>(frame).expect("valid envelope");
/// assert_eq!(envelope.confirmed(), Some(42));
/// assert!(envelope.messages.is_empty());
/// ```
pub fn decode<M>(frame: &[u8]) -> Result<FeedEnvelope<M>, DecodeError>
where
    M: for<'de> Deserialize<'de>,
{
    let envelope: FeedEnvelope<M> = serde_json::from_slice(frame)?;
    envelope.check_order()?;
    Ok(envelope)
}
