//! Outbound delivery: one unbounded channel per live connection.
//!
//! The router never touches a socket. It drops events into the target
//! connection's channel and moves on; that connection's writer task owns
//! the actual send. Emission is therefore fire-and-forget, and events for
//! one connection leave in the order they were queued.

use std::collections::HashMap;

use relayforge_protocol::{ConnectionId, ServerEvent};
use tokio::sync::{Mutex, mpsc};

/// Channel sender for delivering outbound events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Receiving end drained by a connection's writer task.
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Routes outbound events to live connections by id.
#[derive(Default)]
pub struct Outbox {
    senders: Mutex<HashMap<ConnectionId, EventSender>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a channel for `connection` and returns its receiving end.
    ///
    /// Registering an id twice replaces the earlier channel.
    pub async fn register(&self, connection: ConnectionId) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().await.insert(connection, tx);
        rx
    }

    /// Closes `connection`'s channel. Its writer task drains what is left
    /// and exits.
    pub async fn unregister(&self, connection: ConnectionId) {
        self.senders.lock().await.remove(&connection);
    }

    /// Queues `event` for `connection`.
    ///
    /// Returns `false` if the connection is gone; the event is dropped.
    pub async fn send(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        match self.senders.lock().await.get(&connection) {
            Some(sender) => sender.send(event).is_ok(),
            None => {
                tracing::debug!(%connection, "no outbound channel, dropping event");
                false
            }
        }
    }

    /// Number of connections with an open channel.
    pub async fn len(&self) -> usize {
        self.senders.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.senders.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[tokio::test]
    async fn test_send_reaches_registered_connection_in_order() {
        let outbox = Outbox::new();
        let mut rx = outbox.register(conn(1)).await;

        assert!(outbox.send(conn(1), ServerEvent::Error("one".into())).await);
        assert!(outbox.send(conn(1), ServerEvent::OpponentDisconnected).await);

        assert_eq!(rx.recv().await, Some(ServerEvent::Error("one".into())));
        assert_eq!(rx.recv().await, Some(ServerEvent::OpponentDisconnected));
    }

    #[tokio::test]
    async fn test_send_unknown_connection_returns_false() {
        let outbox = Outbox::new();
        assert!(!outbox.send(conn(9), ServerEvent::OpponentDisconnected).await);
    }

    #[tokio::test]
    async fn test_unregister_closes_channel() {
        let outbox = Outbox::new();
        let mut rx = outbox.register(conn(1)).await;
        outbox.unregister(conn(1)).await;

        assert!(outbox.is_empty().await);
        assert_eq!(rx.recv().await, None);
        assert!(!outbox.send(conn(1), ServerEvent::OpponentDisconnected).await);
    }
}
