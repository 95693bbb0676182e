//! # Relayforge
//!
//! A rule-agnostic relay for two-player turn-based games.
//!
//! Two browsers share a short session id; the relay seats them on opposite
//! sides and forwards each move to the other player exactly as sent. It
//! never looks at the moves themselves, so the same server works for
//! chess, checkers, or anything else with two seats.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relayforge::prelude::*;
//!
//! # async fn start() -> Result<(), RelayError> {
//! let config = ServerConfig::from_env()?;
//! let server = RelayServerBuilder::from_config(&config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod outbox;
mod router;
mod server;

pub use config::{ConfigError, DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
pub use error::RelayError;
pub use outbox::{EventReceiver, EventSender, Outbox};
pub use router::Router;
pub use server::{DEFAULT_HANDSHAKE_TIMEOUT, RelayServer, RelayServerBuilder};

/// Everything needed to run a relay or talk to one in tests.
pub mod prelude {
    pub use crate::{ConfigError, RelayError, RelayServer, RelayServerBuilder, ServerConfig};
    pub use relayforge_protocol::{
        ClientEvent, Codec, ConnectionId, JsonCodec, MovePayload, Roster, ServerEvent, SessionId,
        Side,
    };
    pub use relayforge_session::{
        RandomSource, ScriptedRandom, Session, SessionError, SessionRegistry, SessionState,
        ThreadRandom,
    };
}
