//! Integration tests for the WebSocket transport.
//!
//! These tests spin up a real WebSocket listener on an OS-assigned port and
//! drive it with a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use quizroyale_transport::{
        Connection, Handshake, Transport, TransportError,
        WebSocketConnection, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    async fn upgrade(
        transport: &mut WebSocketTransport,
    ) -> WebSocketConnection {
        transport
            .accept()
            .await
            .expect("should accept")
            .complete()
            .await
            .expect("should upgrade")
    }

    async fn connect_client(url: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_bind_reports_address() {
        let result = WebSocketTransport::bind("not-an-address").await;
        match result {
            Err(TransportError::Bind { addr, .. }) => {
                assert_eq!(addr, "not-an-address");
            }
            Err(other) => panic!("expected Bind, got {other}"),
            Ok(_) => panic!("bind should fail"),
        }
    }

    #[tokio::test]
    async fn test_accept_does_not_wait_for_upgrade() {
        let (mut transport, addr) = bind().await;

        // A peer that connects but never sends the upgrade request.
        let idle = tokio::net::TcpStream::connect(&addr).await.unwrap();
        let handshake = tokio::time::timeout(
            Duration::from_secs(2),
            transport.accept(),
        )
        .await
        .expect("accept must not wait for the upgrade")
        .expect("should accept");
        assert_eq!(
            handshake.peer_addr(),
            idle.local_addr().expect("idle local addr")
        );

        // Its stalled upgrade does not hold back the next peer.
        let stalled = tokio::spawn(handshake.complete());
        let client = tokio::spawn({
            let url = format!("ws://{addr}/?name=next");
            async move { connect_client(&url).await }
        });
        let conn = tokio::time::timeout(
            Duration::from_secs(2),
            upgrade(&mut transport),
        )
        .await
        .expect("second peer should be upgraded");
        assert_eq!(conn.display_name(), "next");
        let _client_ws = client.await.unwrap();

        // Dropping the idle peer fails its upgrade.
        drop(idle);
        let result = stalled.await.unwrap();
        assert!(matches!(result, Err(TransportError::Upgrade(_))));
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, addr) = bind().await;
        let server_handle =
            tokio::spawn(async move { upgrade(&mut transport).await });

        let mut client_ws =
            connect_client(&format!("ws://{addr}/ws?name=alice")).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);
        assert_eq!(server_conn.display_name(), "alice");

        server_conn
            .send(&[0x00])
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), &[0x00]);

        client_ws
            .send(Message::Binary(vec![0x01, 0, 0, 0, 7].into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, vec![0x01, 0, 0, 0, 7]);

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_missing_name_is_empty() {
        let (mut transport, addr) = bind().await;
        let server_handle =
            tokio::spawn(async move { upgrade(&mut transport).await });

        let _client_ws = connect_client(&format!("ws://{addr}")).await;
        let server_conn = server_handle.await.unwrap();
        assert_eq!(server_conn.display_name(), "");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind().await;
        let server_handle =
            tokio::spawn(async move { upgrade(&mut transport).await });

        let mut client_ws =
            connect_client(&format!("ws://{addr}/?name=bob")).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");

        // Peer already closed: our close is a no-op rather than an error.
        server_conn.close().await.expect("close after peer close");
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending() {
        let (mut transport, addr) = bind().await;
        let server_handle =
            tokio::spawn(async move { upgrade(&mut transport).await });

        let mut client_ws =
            connect_client(&format!("ws://{addr}/?name=carol")).await;
        let server_conn =
            std::sync::Arc::new(server_handle.await.unwrap());

        let reader = std::sync::Arc::clone(&server_conn);
        let pending = tokio::spawn(async move { reader.recv().await });

        // A pending recv must not block the write half.
        tokio::time::timeout(
            std::time::Duration::from_secs(2),
            server_conn.send(&[0x09]),
        )
        .await
        .expect("send must not wait for recv")
        .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), &[0x09]);

        client_ws.send(Message::Binary(vec![0x03].into())).await.unwrap();
        let got = pending.await.unwrap().unwrap();
        assert_eq!(got, Some(vec![0x03]));
    }
}
