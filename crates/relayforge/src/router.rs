//! The connection event router.
//!
//! Turns one inbound event from one connection into registry operations
//! and outbound events:
//!
//! | Inbound | Registry | Outbound |
//! |---|---|---|
//! | create | `create` | `SessionCreated` → creator |
//! | join | `join` | `GameStarting` → both, then `YourSide` → joiner |
//! | move | `opponent_of` | `OpponentMoved` → opponent only |
//! | disconnect | `leave` | `OpponentDisconnected` → whoever remains |
//!
//! Failed creates and joins answer the requester with an `Error` event and
//! change nothing. Moves that can't be delivered are dropped without a
//! reply: mid-game there is nothing useful the sender could do about it.
//!
//! The router holds no session state of its own. Every call looks the
//! session up again by id, so it never acts on a session another
//! connection's event has already torn down.

use std::fmt;
use std::sync::Arc;

use relayforge_protocol::{ClientEvent, ConnectionId, MovePayload, ServerEvent, SessionId};
use relayforge_session::SessionRegistry;

use crate::outbox::{EventReceiver, Outbox};

/// Applies connection events to the session registry.
pub struct Router {
    registry: Arc<SessionRegistry>,
    outbox: Arc<Outbox>,
}

impl Router {
    pub fn new(registry: Arc<SessionRegistry>, outbox: Arc<Outbox>) -> Self {
        Self { registry, outbox }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    /// Opens the outbound channel for a freshly accepted connection.
    pub async fn connect(&self, connection: ConnectionId) -> EventReceiver {
        tracing::info!(%connection, "connection opened");
        self.outbox.register(connection).await
    }

    /// Routes one decoded inbound event.
    pub async fn dispatch(&self, connection: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::CreateSession => self.create(connection).await,
            ClientEvent::JoinSession(session_id) => self.join(connection, &session_id).await,
            ClientEvent::Move { session_id, mv } => {
                self.relay_move(connection, &session_id, mv).await
            }
        }
    }

    /// Opens a session with `connection` in the first seat, on a side
    /// picked by coin flip.
    pub async fn create(&self, connection: ConnectionId) {
        let side = self.registry.random().creator_side();
        match self.registry.create(connection, side).await {
            Ok(session_id) => {
                self.outbox
                    .send(connection, ServerEvent::SessionCreated { session_id, side })
                    .await;
            }
            Err(e) => self.reject(connection, e).await,
        }
    }

    /// Seats `connection` in the second seat of `session_id` and starts
    /// the game.
    ///
    /// The start events are queued while the session is still locked, so
    /// the joiner always sees them before the creator's first move.
    pub async fn join(&self, connection: ConnectionId, session_id: &SessionId) {
        let joined = self
            .registry
            .join_and_announce(session_id, connection, |outcome| async move {
                let starting = ServerEvent::GameStarting(outcome.roster);
                self.outbox.send(outcome.roster.white, starting.clone()).await;
                self.outbox.send(outcome.roster.black, starting).await;
                self.outbox
                    .send(connection, ServerEvent::YourSide(outcome.side))
                    .await;
            })
            .await;

        if let Err(e) = joined {
            self.reject(connection, e).await;
        }
    }

    /// Forwards `mv` from `sender` to the other participant of
    /// `session_id`, untouched.
    pub async fn relay_move(&self, sender: ConnectionId, session_id: &SessionId, mv: MovePayload) {
        match self.registry.opponent_of(session_id, sender).await {
            Ok(Some(opponent)) => {
                if !self
                    .outbox
                    .send(opponent, ServerEvent::OpponentMoved(mv))
                    .await
                {
                    tracing::debug!(%session_id, %sender, %opponent, "opponent gone, move dropped");
                }
            }
            Ok(None) => {
                tracing::debug!(%session_id, %sender, "no opponent seated, move dropped");
            }
            Err(e) => {
                tracing::debug!(%session_id, %sender, error = %e, "move dropped");
            }
        }
    }

    /// Handles transport-level loss of `connection`.
    pub async fn disconnect(&self, connection: ConnectionId) {
        self.outbox.unregister(connection).await;

        let Some(departure) = self.registry.leave(connection).await else {
            tracing::info!(%connection, "connection closed");
            return;
        };

        if let Some(remaining) = departure.remaining {
            self.outbox
                .send(remaining, ServerEvent::OpponentDisconnected)
                .await;
        }
        tracing::info!(
            %connection,
            session_id = %departure.session_id,
            "connection closed, left session"
        );
    }

    /// Sends a user-visible error to `connection` only.
    pub async fn reject(&self, connection: ConnectionId, reason: impl fmt::Display) {
        let message = reason.to_string();
        tracing::debug!(%connection, %message, "request rejected");
        self.outbox
            .send(connection, ServerEvent::Error(message))
            .await;
    }
}

// =========================================================================
// Tests
// =========================================================================
