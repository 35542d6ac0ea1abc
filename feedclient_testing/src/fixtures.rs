//! `rstest` fixtures for feed client tests.

use rstest::fixture;
use serde_json::Value;

use crate::{RecordingSink, ScriptedTransport};

/// A transport with an empty script.
#[fixture]
pub fn transport() -> ScriptedTransport { ScriptedTransport::new() }

/// A sink recording JSON payloads and accepting every batch.
#[fixture]
pub fn sink() -> RecordingSink<Value> { RecordingSink::new() }
