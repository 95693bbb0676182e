//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use relayforge_transport::{
        Connection, PendingConnection, Transport, WebSocketConnection, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds a transport on port 0, connects one client, and returns both
    /// ends of the connection.
    async fn connected_pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");

        let server_handle = tokio::spawn(async move {
            let pending = transport.accept().await.expect("should accept");
            pending.establish().await.expect("handshake should succeed")
        });

        let (client_ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let server_conn = server_handle.await.expect("task should complete");
        (server_conn, client_ws)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (server_conn, mut client_ws) = connected_pair().await;

        assert!(server_conn.id().into_inner() > 0);

        // --- Server sends, client receives ---
        server_conn
            .send(br#"{"event":"opponentDisconnected"}"#)
            .await
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "UTF-8 payloads should go out as text frames");
        assert_eq!(
            msg.into_data().as_ref(),
            br#"{"event":"opponentDisconnected"}"#,
        );

        // --- Client sends, server receives ---
        client_ws
            .send(Message::Text(r#"{"event":"createGame"}"#.into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"event":"createGame"}"#);

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_binary_frames_are_received() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws
            .send(Message::Binary(vec![1, 2, 3].into()))
            .await
            .unwrap();

        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_send_not_blocked_by_pending_recv() {
        // A relay delivers an opponent's move while this connection's own
        // handler is parked in recv. Sending must not wait for that recv.
        let (server_conn, mut client_ws) = connected_pair().await;
        let server_conn = Arc::new(server_conn);

        let reader = Arc::clone(&server_conn);
        let pending = tokio::spawn(async move { reader.recv().await });

        // Let the reader grab the stream lock.
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), server_conn.send(b"\"e2e4\""))
            .await
            .expect("send should not wait for the pending recv")
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"\"e2e4\"");

        client_ws.send(Message::Close(None)).await.unwrap();
        let result = pending.await.unwrap().unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_websocket_connection_ids_are_unique() {
        let (a, _ca) = connected_pair().await;
        let (b, _cb) = connected_pair().await;
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_websocket_accept_does_not_wait_for_handshake() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");

        // Connects at the TCP level and never sends the upgrade request.
        let _silent = tokio::net::TcpStream::connect(addr)
            .await
            .expect("tcp connect should succeed");

        let pending = tokio::time::timeout(Duration::from_secs(1), transport.accept())
            .await
            .expect("accept should return before any handshake")
            .expect("should accept");

        let handshake =
            tokio::time::timeout(Duration::from_millis(100), pending.establish()).await;
        assert!(handshake.is_err(), "a silent peer never completes the handshake");
    }

    #[tokio::test]
    async fn test_websocket_establish_rejects_non_websocket_peer() {
        use tokio::io::AsyncWriteExt;

        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");

        let mut raw = tokio::net::TcpStream::connect(addr)
            .await
            .expect("tcp connect should succeed");
        raw.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")
            .await
            .expect("write should succeed");

        let pending = transport.accept().await.expect("should accept");
        let result = pending.establish().await;
        assert!(matches!(
            result,
            Err(relayforge_transport::TransportError::HandshakeFailed(_))
        ));
    }
}
