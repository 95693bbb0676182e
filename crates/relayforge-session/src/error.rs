//! Error types for the session layer.

use relayforge_protocol::{ConnectionId, SessionId};

/// Errors that can occur during session operations.
///
/// None of these are fatal: each one is reported to (or swallowed for) the
/// connection that asked, and the registry is left exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists with this id (never created, or already torn down).
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// Both seats are taken.
    #[error("session {0} is full")]
    Full(SessionId),

    /// The connection already occupies a seat somewhere.
    /// A connection belongs to at most one session at a time.
    #[error("{0} is already in session {1}")]
    AlreadyInSession(ConnectionId, SessionId),

    /// The connection named a session it is not seated in.
    #[error("{0} is not a participant of session {1}")]
    NotParticipant(ConnectionId, SessionId),
}
