//! Per-connection handler: decode inbound frames, route them, and write
//! outbound events.
//!
//! An accepted socket first completes its WebSocket handshake on its own
//! task, bounded by the server's handshake timeout. Each established
//! connection then gets two Tokio tasks:
//!   1. the reader (this handler): receive frame → decode → route
//!   2. the writer: drain the connection's outbox channel → encode → send
//!
//! When the reader stops (clean close, transport error, idle timeout) the
//! departure guard runs the router's disconnect, which also closes the
//! outbox channel and so ends the writer.

use std::sync::Arc;

use relayforge_protocol::{ClientEvent, Codec, ConnectionId};
use relayforge_transport::{Connection, PendingConnection, TransportError};

use crate::RelayError;
use crate::outbox::EventReceiver;
use crate::router::Router;
use crate::server::ServerState;

/// Drop guard that runs the disconnect transition when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async work.
struct DepartureGuard {
    connection: ConnectionId,
    router: Arc<Router>,
}

impl Drop for DepartureGuard {
    fn drop(&mut self) {
        let connection = self.connection;
        let router = Arc::clone(&self.router);
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                router.disconnect(connection).await;
            });
        }
    }
}

/// Completes the handshake of a freshly accepted socket, then serves it.
pub(crate) async fn establish_and_handle<P, C>(
    pending: P,
    state: Arc<ServerState<C>>,
) -> Result<(), RelayError>
where
    P: PendingConnection<Error = TransportError>,
    C: Codec,
{
    let conn = tokio::time::timeout(state.handshake_timeout, pending.establish())
        .await
        .map_err(|_| TransportError::HandshakeTimedOut)??;
    handle_connection(conn, state).await
}

/// Handles a single connection from handshake to close.
async fn handle_connection<T, C>(
    conn: T,
    state: Arc<ServerState<C>>,
) -> Result<(), RelayError>
where
    T: Connection<Error = TransportError>,
    C: Codec,
{
    let conn_id = conn.id();
    let conn = Arc::new(conn);

    let outbound = state.router.connect(conn_id).await;
    let _guard = DepartureGuard {
        connection: conn_id,
        router: Arc::clone(&state.router),
    };

    tokio::spawn(write_outbound(
        Arc::clone(&conn),
        outbound,
        Arc::clone(&state),
    ));

    loop {
        let received = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%conn_id, "connection idle too long, closing");
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%conn_id, error = %e, "close failed");
                    }
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed by peer");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Err(e.into());
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                state
                    .router
                    .reject(conn_id, format!("invalid event: {e}"))
                    .await;
                continue;
            }
        };

        state.router.dispatch(conn_id, event).await;
    }

    // _guard drops here → disconnect fires.
    Ok(())
}

/// Drains a connection's outbound channel onto the wire.
///
/// Stops on the first failed send: the reader side will notice the broken
/// connection and run the disconnect.
async fn write_outbound<T, C>(conn: Arc<T>, mut outbound: EventReceiver, state: Arc<ServerState<C>>)
where
    T: Connection<Error = TransportError>,
    C: Codec,
{
    let conn_id = conn.id();
    while let Some(event) = outbound.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
