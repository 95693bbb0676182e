//! Transport abstraction layer for Relayforge.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the bidirectional, message-oriented channel each participant talks to
//! the relay through. The relay only assumes a channel is reliable and
//! ordered per connection.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a connection.
///
/// This is the only identity a participant has: the relay performs no
/// authentication, so a session seat belongs to whichever live channel
/// occupies it. Serialized as a plain number so it can be shared with
/// clients in the game-start roster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// Accepting only takes the socket. The protocol handshake runs later in
/// [`PendingConnection::establish`], on the connection's own task, so a
/// peer that never completes it can't hold up the next accept.
pub trait Transport: Send + Sync + 'static {
    /// A socket-level connection whose handshake hasn't run yet.
    type Pending: PendingConnection<Error = Self::Error>;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming socket.
    fn accept(&mut self) -> impl Future<Output = Result<Self::Pending, Self::Error>> + Send;
}

/// An accepted socket waiting for its protocol handshake.
pub trait PendingConnection: Send + 'static {
    /// The connection produced once the handshake succeeds.
    type Connection: Connection<Error = Self::Error>;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// Runs the handshake with the remote peer.
    fn establish(self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// A single connection that can send and receive frames.
///
/// Both methods take `&self` so one task can sit in [`recv`](Self::recv)
/// while another delivers outbound frames through [`send`](Self::send).
///
/// The returned futures are `Send` so handlers generic over the connection
/// type can be spawned onto the multi-threaded runtime.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&self) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_equality() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(1);
        let c = ConnectionId::new(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_connection_id_serializes_as_plain_number() {
        // Clients see the id inside the game-start roster, so it must be
        // `7`, not `{"0":7}`.
        let json = serde_json::to_string(&ConnectionId::new(7)).unwrap();
        assert_eq!(json, "7");

        let back: ConnectionId = serde_json::from_str("7").unwrap();
        assert_eq!(back, ConnectionId::new(7));
    }
}
