//! The session registry: every live session, keyed by id.
//!
//! # Concurrency
//!
//! Each session sits behind its own `Mutex`, so two joins racing for the
//! same second seat are serialized while unrelated games never contend.
//! The id map is behind an `RwLock` that is only held long enough to
//! clone a session's `Arc` (or insert/remove one). Lock order is
//! session → id map → membership index, and nothing ever waits on a
//! session lock while holding the id map, so the locks can't deadlock.
//!
//! A session removed from the map is also flagged `closed` under its own
//! lock. A join that fetched the `Arc` just before removal therefore sees
//! the flag and reports "not found" instead of reviving a dead session.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use relayforge_protocol::{ConnectionId, Roster, SessionId, Side};
use tokio::sync::{Mutex, RwLock};

use crate::{RandomSource, Session, SessionError, ThreadRandom};

/// What a successful join produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub session_id: SessionId,
    /// The joiner's side (opposite the participant already seated).
    pub side: Side,
    /// The full mapping, for the game-starting broadcast.
    pub roster: Roster,
}

/// What happened to a session when one of its participants left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub session_id: SessionId,
    /// The participant still seated, or `None` if the session emptied and
    /// was removed.
    pub remaining: Option<ConnectionId>,
}

/// Manages all live sessions.
///
/// Constructed once at startup and shared (behind an `Arc`) with every
/// connection task.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,

    /// Index from connection to the session it is seated in, so a
    /// disconnect finds its session without scanning every game. Kept in
    /// sync with the participants of `sessions`.
    memberships: Mutex<HashMap<ConnectionId, SessionId>>,

    random: Box<dyn RandomSource>,
}

impl SessionRegistry {
    /// Creates an empty registry drawing ids and coin flips from `random`.
    pub fn new(random: impl RandomSource) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            memberships: Mutex::new(HashMap::new()),
            random: Box::new(random),
        }
    }

    /// The randomness source this registry was built with.
    pub fn random(&self) -> &dyn RandomSource {
        self.random.as_ref()
    }

    /// Opens a new session with `creator` seated on `side`.
    ///
    /// Draws ids until one is free. The session is inserted already holding
    /// its creator, so an empty session is never observable.
    ///
    /// # Errors
    /// [`SessionError::AlreadyInSession`] if `creator` is seated elsewhere.
    pub async fn create(
        &self,
        creator: ConnectionId,
        side: Side,
    ) -> Result<SessionId, SessionError> {
        if let Some(existing) = self.session_of(creator).await {
            return Err(SessionError::AlreadyInSession(creator, existing));
        }

        let session_id = {
            let mut sessions = self.sessions.write().await;
            let session_id = loop {
                let candidate = self.random.session_id();
                if !sessions.contains_key(&candidate) {
                    break candidate;
                }
                tracing::debug!(%candidate, "session id collision, drawing again");
            };
            let session = Session::with_creator(session_id.clone(), creator, side);
            sessions.insert(session_id.clone(), Arc::new(Mutex::new(session)));
            self.memberships
                .lock()
                .await
                .insert(creator, session_id.clone());
            session_id
        };

        tracing::info!(%session_id, %creator, %side, "session created");
        Ok(session_id)
    }

    /// Returns a snapshot of the session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no such session is live.
    pub async fn get(&self, session_id: &SessionId) -> Result<Session, SessionError> {
        let entry = self.entry(session_id).await?;
        let session = entry.lock().await;
        if session.closed {
            return Err(SessionError::NotFound(session_id.clone()));
        }
        Ok(session.clone())
    }

    /// Seats `connection` in the free seat of `session_id`.
    ///
    /// The check-and-admit happens under the session's lock: of any number
    /// of concurrent joins, exactly one wins the second seat.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyInSession`]: `connection` is seated elsewhere
    /// - [`SessionError::NotFound`]: no such session
    /// - [`SessionError::Full`]: both seats are taken
    pub async fn join(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
    ) -> Result<JoinOutcome, SessionError> {
        self.join_and_announce(session_id, connection, |_| async {})
            .await
    }

    /// Like [`join`](Self::join), but awaits `announce` with the outcome
    /// before the session's lock is released.
    ///
    /// Anything `announce` queues is ordered ahead of whatever a participant
    /// of this session triggers next, since every other session operation
    /// has to take the same lock first.
    ///
    /// # Errors
    /// Same as [`join`](Self::join). `announce` only runs on success.
    pub async fn join_and_announce<F, Fut>(
        &self,
        session_id: &SessionId,
        connection: ConnectionId,
        announce: F,
    ) -> Result<JoinOutcome, SessionError>
    where
        F: FnOnce(JoinOutcome) -> Fut,
        Fut: Future<Output = ()>,
    {
        if let Some(existing) = self.session_of(connection).await {
            return Err(SessionError::AlreadyInSession(connection, existing));
        }

        let entry = self.entry(session_id).await?;
        let mut session = entry.lock().await;
        if session.closed {
            return Err(SessionError::NotFound(session_id.clone()));
        }

        let seated = match session.participants() {
            [] => return Err(SessionError::NotFound(session_id.clone())),
            [seated] => seated.connection,
            _ => return Err(SessionError::Full(session_id.clone())),
        };

        let side = session.admit(connection);
        self.memberships
            .lock()
            .await
            .insert(connection, session_id.clone());

        let roster = match side {
            Side::White => Roster {
                white: connection,
                black: seated,
            },
            Side::Black => Roster {
                white: seated,
                black: connection,
            },
        };

        tracing::info!(%session_id, %connection, %side, "participant joined, session active");
        let outcome = JoinOutcome {
            session_id: session_id.clone(),
            side,
            roster,
        };
        announce(outcome.clone()).await;
        Ok(outcome)
    }

    /// Finds who should receive a move `sender` makes in `session_id`.
    ///
    /// Returns `Ok(None)` when the sender is alone in the session.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: no such session
    /// - [`SessionError::NotParticipant`]: `sender` isn't seated there
    pub async fn opponent_of(
        &self,
        session_id: &SessionId,
        sender: ConnectionId,
    ) -> Result<Option<ConnectionId>, SessionError> {
        let entry = self.entry(session_id).await?;
        let session = entry.lock().await;
        if session.closed {
            return Err(SessionError::NotFound(session_id.clone()));
        }
        if !session.contains(sender) {
            return Err(SessionError::NotParticipant(sender, session_id.clone()));
        }
        Ok(session.opponent_of(sender))
    }

    /// Unseats `connection` from whatever session it is in.
    ///
    /// A session left empty is removed on the spot. Returns `None` if the
    /// connection wasn't seated anywhere.
    pub async fn leave(&self, connection: ConnectionId) -> Option<Departure> {
        let session_id = self.memberships.lock().await.remove(&connection)?;
        let entry = self.entry(&session_id).await.ok()?;

        let mut session = entry.lock().await;
        if session.closed || !session.remove(connection) {
            return None;
        }

        if session.is_empty() {
            session.closed = true;
            self.sessions.write().await.remove(&session_id);
            tracing::info!(%session_id, %connection, "last participant left, session removed");
            return Some(Departure {
                session_id,
                remaining: None,
            });
        }

        let remaining = session.opponent_of(connection);
        tracing::info!(%session_id, %connection, "participant left");
        Some(Departure {
            session_id,
            remaining,
        })
    }

    /// Deletes a session outright. No-op if it doesn't exist.
    pub async fn remove(&self, session_id: &SessionId) {
        let Some(entry) = self.sessions.write().await.remove(session_id) else {
            return;
        };

        let mut session = entry.lock().await;
        session.closed = true;

        let mut memberships = self.memberships.lock().await;
        for participant in session.participants() {
            if memberships.get(&participant.connection) == Some(session_id) {
                memberships.remove(&participant.connection);
            }
        }
        tracing::info!(%session_id, "session removed");
    }

    /// The session `connection` is seated in, if any.
    pub async fn session_of(&self, connection: ConnectionId) -> Option<SessionId> {
        self.memberships.lock().await.get(&connection).cloned()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// `true` if there are no live sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Clones the session's handle out of the map, releasing the map lock
    /// before the caller locks the session itself.
    async fn entry(&self, session_id: &SessionId) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(ThreadRandom)
    }
}

// =========================================================================
// Tests
// =========================================================================
