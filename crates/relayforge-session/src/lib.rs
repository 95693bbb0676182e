//! Session management for Relayforge.
//!
//! A session is one two-seat game relay. This crate owns:
//!
//! 1. **The registry** ([`SessionRegistry`]): every live session, with
//!    per-session locking so joins and departures on the same session are
//!    serialized while unrelated games proceed in parallel.
//! 2. **Session state** ([`Session`], [`Participant`], [`SessionState`]).
//! 3. **Randomness** ([`RandomSource`]): the coin flip for the creator's
//!    side and session id generation, swappable for deterministic tests.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)  ← looks sessions up, turns outcomes into outbound events
//!     ↕
//! Session Layer (this crate)  ← who sits where, capacity, cleanup
//!     ↕
//! Protocol Layer (below)  ← provides SessionId, Side, Roster, ConnectionId
//! ```

mod error;
mod random;
mod registry;
mod session;

pub use error::SessionError;
pub use random::{RandomSource, ScriptedRandom, ThreadRandom, SESSION_ID_ALPHABET, SESSION_ID_LEN};
pub use registry::{Departure, JoinOutcome, SessionRegistry};
pub use session::{Participant, Session, SessionState, MAX_PARTICIPANTS};
