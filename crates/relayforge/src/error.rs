//! Unified error type for Relayforge.
//!
//! Only failures that end a task surface here. Rejected requests (unknown
//! session, full session, undecodable frame) are answered on the wire by
//! the router and never become a `RelayError`.

use relayforge_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error for starting a relay or serving one connection.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (bind, accept, handshake, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The process environment held an unusable setting.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
