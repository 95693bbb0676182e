//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The connection handler doesn't care HOW events are serialized; it just
//! needs something that implements [`Codec`]. Today that is [`JsonCodec`],
//! because browser clients speak JSON.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use relayforge_protocol::{ClientEvent, Codec, JsonCodec, SessionId};
///
/// let codec = JsonCodec;
///
/// let event: ClientEvent = codec.decode(br#"{"event":"joinGame","data":"ABC123"}"#).unwrap();
/// assert_eq!(event, ClientEvent::JoinSession(SessionId::new("ABC123")));
///
/// let bytes = codec.encode(&event).unwrap();
/// assert_eq!(bytes, br#"{"event":"joinGame","data":"ABC123"}"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
