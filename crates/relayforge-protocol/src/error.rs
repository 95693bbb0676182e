//! Error types for the protocol layer.
//!
//! Each crate in Relayforge defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization, not in networking or
//! session bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed (turning bytes into an event).
    ///
    /// Common causes: malformed JSON, an unknown `event` name, or a
    /// payload with the wrong shape (e.g. `joinGame` without an id).
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
