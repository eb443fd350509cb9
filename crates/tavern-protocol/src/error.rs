//! Error types for the protocol layer.

/// Errors from turning protocol types into JSON text and back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed. Effectively unreachable for the types in
    /// this crate, but surfaced rather than swallowed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown action tag, or
    /// a field of the wrong type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
