//! Scan cursor tokens.
//!
//! A scan cursor is continuation state owned by the cluster driver. The
//! browser never looks inside it. It only has to carry the cursor through a
//! text channel (a query string) and back, so a cursor is serialized to JSON
//! bytes and encoded as URL-safe, unpadded base64.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque scan continuation state.
///
/// Structurally, a cursor is a JSON object or array. Anything else (scalars,
/// `null`) is not a cursor: a finished scan is represented by the absence of
/// a cursor, not by a null one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanCursor(serde_json::Value);

impl ScanCursor {
    /// Wraps driver state as a cursor.
    ///
    /// Fails if the state is not a JSON object or array.
    pub fn new(state: serde_json::Value) -> Result<Self> {
        if state.is_object() || state.is_array() {
            Ok(Self(state))
        } else {
            Err(Error::MalformedCursor(format!(
                "cursor state must be an object or array, got {}",
                kind(&state)
            )))
        }
    }

    /// Returns the driver state.
    pub fn state(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Encodes a cursor to a transport-safe token.
pub fn encode(cursor: &ScanCursor) -> Result<String> {
    let bytes = serde_json::to_vec(cursor.state())?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decodes a token produced by [`encode`].
///
/// Fails with [`Error::MalformedCursor`] if the token is not valid base64 or
/// does not hold a structurally valid cursor.
pub fn decode(token: &str) -> Result<ScanCursor> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| Error::MalformedCursor(format!("invalid base64: {}", e)))?;
    let state: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::MalformedCursor(format!("invalid cursor payload: {}", e)))?;
    ScanCursor::new(state)
}

fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
