//! Session types: one two-seat game relay and the connections seated in it.

use std::time::Instant;

use relayforge_protocol::{ConnectionId, Roster, SessionId, Side};

/// A session never holds more than two participants.
pub const MAX_PARTICIPANTS: usize = 2;

/// One connection occupying one side of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection: ConnectionId,
    pub side: Side,
    pub joined_at: Instant,
}

/// The observable lifecycle state of a session.
///
/// ```text
/// (Empty) → AwaitingSecond → Active → removed
///                 ↑              │
///                 └──(one left)──┘
/// ```
///
/// `Empty` never appears: a session is born holding its creator and is
/// removed the moment its last participant leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Exactly one participant is seated.
    AwaitingSecond,
    /// Both seats are taken.
    Active,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingSecond => write!(f, "AwaitingSecond"),
            Self::Active => write!(f, "Active"),
        }
    }
}

/// A single session's seats.
///
/// The registry owns the live value behind a per-session lock; everything
/// outside the registry only ever sees owned snapshots (clones), so a
/// caller can't keep acting on a session another event already tore down.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    /// Ordered by join time.
    participants: Vec<Participant>,
    started: bool,
    /// Set once the session has been taken out of the registry. A join that
    /// fetched the session before removal sees this under the lock.
    pub(crate) closed: bool,
}

impl Session {
    /// Creates a session holding its creator in the first seat.
    pub(crate) fn with_creator(id: SessionId, creator: ConnectionId, side: Side) -> Self {
        Self {
            id,
            participants: vec![Participant {
                connection: creator,
                side,
                joined_at: Instant::now(),
            }],
            started: false,
            closed: false,
        }
    }

    /// The session's shareable id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Seated participants, in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Number of seated participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// `true` when nobody is seated. Only ever observed transiently inside
    /// the registry, right before removal.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// `true` once a second participant has ever been admitted.
    pub fn started(&self) -> bool {
        self.started
    }

    pub fn state(&self) -> SessionState {
        if self.participants.len() >= MAX_PARTICIPANTS {
            SessionState::Active
        } else {
            SessionState::AwaitingSecond
        }
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.participants.iter().any(|p| p.connection == connection)
    }

    /// The side `connection` holds, if it is seated here.
    pub fn side_of(&self, connection: ConnectionId) -> Option<Side> {
        self.participants
            .iter()
            .find(|p| p.connection == connection)
            .map(|p| p.side)
    }

    /// The participant that is not `connection`, if one is seated.
    pub fn opponent_of(&self, connection: ConnectionId) -> Option<ConnectionId> {
        self.participants
            .iter()
            .find(|p| p.connection != connection)
            .map(|p| p.connection)
    }

    /// The side ↔ connection mapping, available once both seats are taken.
    pub fn roster(&self) -> Option<Roster> {
        let white = self.participants.iter().find(|p| p.side == Side::White)?;
        let black = self.participants.iter().find(|p| p.side == Side::Black)?;
        Some(Roster {
            white: white.connection,
            black: black.connection,
        })
    }

    /// Seats a second participant on the side opposite the one already
    /// seated. Returns the new participant's side.
    ///
    /// Capacity is checked by the caller.
    pub(crate) fn admit(&mut self, connection: ConnectionId) -> Side {
        let side = self
            .participants
            .first()
            .map(|p| p.side.opposite())
            .unwrap_or(Side::White);
        self.participants.push(Participant {
            connection,
            side,
            joined_at: Instant::now(),
        });
        if self.participants.len() == MAX_PARTICIPANTS {
            self.started = true;
        }
        side
    }

    /// Unseats `connection`. Returns `false` if it wasn't seated.
    pub(crate) fn remove(&mut self, connection: ConnectionId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.connection != connection);
        self.participants.len() != before
    }
}
