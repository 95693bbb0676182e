//! Pluggable randomness: the creator's coin flip and session id generation.
//!
//! These are the only two random decisions the relay makes, and both are
//! visible to clients (the creator's color, the id they share). Putting
//! them behind [`RandomSource`] lets tests script exact outcomes.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use rand::Rng;
use relayforge_protocol::{SessionId, Side};

/// Characters a generated session id is drawn from.
pub const SESSION_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a generated session id.
///
/// 36^6 ≈ 2.2 billion ids. Collisions are possible but rare, and the
/// registry simply draws again when one happens.
pub const SESSION_ID_LEN: usize = 6;

/// A source of the relay's random decisions.
pub trait RandomSource: Send + Sync + 'static {
    /// Picks the creator's side, uniformly between the two.
    fn creator_side(&self) -> Side;

    /// Draws a candidate session id. May repeat a live id; the registry
    /// checks and asks again.
    fn session_id(&self) -> SessionId;
}

/// The production source, backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn creator_side(&self) -> Side {
        if rand::rng().random_bool(0.5) {
            Side::White
        } else {
            Side::Black
        }
    }

    fn session_id(&self) -> SessionId {
        let mut rng = rand::rng();
        let id: String = (0..SESSION_ID_LEN)
            .map(|_| SESSION_ID_ALPHABET[rng.random_range(0..SESSION_ID_ALPHABET.len())] as char)
            .collect();
        SessionId::new(id)
    }
}

/// A source that replays queued outcomes, then falls back to
/// [`ThreadRandom`] once a queue runs dry.
///
/// Meant for tests and local demos where a fixed id such as `"ABC123"` or a
/// known color makes the flow easy to follow.
///
/// ```rust
/// use relayforge_protocol::Side;
/// use relayforge_session::{RandomSource, ScriptedRandom};
///
/// let random = ScriptedRandom::new()
///     .with_sides([Side::White])
///     .with_session_ids(["ABC123"]);
///
/// assert_eq!(random.creator_side(), Side::White);
/// assert_eq!(random.session_id().as_str(), "ABC123");
/// ```
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    sides: Mutex<VecDeque<Side>>,
    session_ids: Mutex<VecDeque<SessionId>>,
}

impl ScriptedRandom {
    /// Creates a source with empty queues (behaves like [`ThreadRandom`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues creator sides, returned in order.
    pub fn with_sides(self, sides: impl IntoIterator<Item = Side>) -> Self {
        self.sides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(sides);
        self
    }

    /// Queues session ids, returned in order.
    pub fn with_session_ids<I>(self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.session_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(ids.into_iter().map(SessionId::new));
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn creator_side(&self) -> Side {
        self.sides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| ThreadRandom.creator_side())
    }

    fn session_id(&self) -> SessionId {
        self.session_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| ThreadRandom.session_id())
    }
}
