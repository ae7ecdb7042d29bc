//! Integration tests for the WebSocket transport.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use buzzline_transport::{Connection, Transport, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn accept_one() -> (ClientWs, buzzline_transport::WebSocketConnection)
    {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address");

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let (client, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");
        let conn = server.await.expect("accept task");
        (client, conn)
    }

    #[tokio::test]
    async fn test_text_frames_flow_both_ways() {
        let (mut client, conn) = accept_one().await;

        client
            .send(Message::text(r#"{"event":"newGame"}"#))
            .await
            .expect("client send");
        let received = conn.recv().await.expect("recv").expect("frame");
        assert_eq!(received, br#"{"event":"newGame"}"#.to_vec());

        conn.send(br#"{"event":"joinConfirmed"}"#)
            .await
            .expect("server send");
        let reply = client.next().await.expect("frame").expect("ok");
        assert_eq!(reply.into_text().expect("text").as_str(), r#"{"event":"joinConfirmed"}"#);
    }

    #[tokio::test]
    async fn test_send_is_not_blocked_by_pending_recv() {
        let (mut client, conn) = accept_one().await;
        let conn = Arc::new(conn);

        // Park a reader on the connection with nothing to read.
        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), conn.send(b"\"ping\""))
            .await
            .expect("send must not wait for the reader")
            .expect("send ok");
        let frame = client.next().await.expect("frame").expect("ok");
        assert_eq!(frame.into_text().expect("text").as_str(), "\"ping\"");

        client.close(None).await.expect("client close");
        let closed = reader.await.expect("reader task").expect("recv ok");
        assert!(closed.is_none());
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (_c1, a) = accept_one().await;
        let (_c2, b) = accept_one().await;
        assert_ne!(a.id(), b.id());
    }
}
