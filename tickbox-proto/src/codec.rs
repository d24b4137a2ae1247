//! JSON encoding for values written to the key-value store.
//!
//! The store only ever sees strings; this module turns typed values into
//! those strings and back using `serde_json`.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("failed to serialize value: {0}")]
    Serialize(String),
    /// The stored string is not valid JSON for the requested type.
    #[error("failed to parse stored value: {0}")]
    Deserialize(String),
}

/// Encodes a value as a JSON string.
///
/// # Errors
///
/// Returns [`CodecError::Serialize`] if the value cannot be serialized.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|e| CodecError::Serialize(e.to_string()))
}

/// Decodes a value from a JSON string.
///
/// # Errors
///
/// Returns [`CodecError::Deserialize`] if the string is not valid JSON
/// for `T`.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, CodecError> {
    serde_json::from_str(raw).map_err(|e| CodecError::Deserialize(e.to_string()))
}
