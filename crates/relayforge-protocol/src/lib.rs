//! Wire protocol for Relayforge.
//!
//! This crate defines the "language" that clients and the relay speak:
//!
//! - **Identifiers** ([`SessionId`], [`Side`], [`Roster`]): who is where.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): what travels on the
//!   wire, one event per frame.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events are turned
//!   into bytes and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! The relay never looks inside a move: [`MovePayload`] is carried from
//! one participant to the other exactly as it arrived.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Session registry / router
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ClientEvent, MovePayload, Roster, ServerEvent, SessionId, Side};

/// Re-exported so higher layers can name connections without depending on
/// the transport crate directly.
pub use relayforge_transport::ConnectionId;
