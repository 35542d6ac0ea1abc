//! WebSocket transport built on `tokio-tungstenite`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream::SplitStream};
use tokio::{
    net::TcpStream,
    select,
    sync::Mutex,
    time::{sleep, timeout},
};
use tokio_tungstenite::{
    MaybeTlsStream,
    WebSocketStream,
    connect_async,
    tungstenite::protocol::Message,
};
use tokio_util::sync::CancellationToken;

use super::{Connection, FeedConnection, Transport};
use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials `ws://` and `wss://` feed endpoints.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    async fn dial(&self, url: &str, dial_timeout: Duration) -> Result<Connection, TransportError> {
        let (stream, _response) = timeout(dial_timeout, connect_async(url))
            .await
            .map_err(|_| TransportError::DialTimeout(dial_timeout))?
            .map_err(|e| TransportError::Io(Box::new(e)))?;
        Ok(Arc::new(WebSocketConnection::new(stream)))
    }
}

/// Read side of a client WebSocket.
///
/// The write half is dropped on construction; the client never sends data
/// frames. Pings are answered by `tungstenite` while reading.
struct WebSocketConnection {
    reader: Mutex<SplitStream<WsStream>>,
    closed: CancellationToken,
}

impl WebSocketConnection {
    fn new(stream: WsStream) -> Self {
        let (_sink, reader) = stream.split();
        Self {
            reader: Mutex::new(reader),
            closed: CancellationToken::new(),
        }
    }

    async fn next_frame(&self) -> Result<Bytes, TransportError> {
        let mut reader = self.reader.lock().await;
        match reader.next().await {
            Some(Ok(Message::Binary(data))) => Ok(data),
            Some(Ok(Message::Text(text))) => Ok(Bytes::copy_from_slice(text.as_str().as_bytes())),
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => Ok(Bytes::new()),
            Some(Ok(Message::Close(_))) | None => Err(TransportError::Closed),
            Some(Err(e)) => Err(TransportError::Io(Box::new(e))),
        }
    }
}

#[async_trait]
impl FeedConnection for WebSocketConnection {
    async fn read_frame(&self, idle_timeout: Duration) -> Result<Bytes, TransportError> {
        let deadline = async {
            if idle_timeout.is_zero() {
                std::future::pending::<()>().await;
            }
            sleep(idle_timeout).await;
        };
        select! {
            biased;

            () = self.closed.cancelled() => Err(TransportError::Closed),
            () = deadline => Err(TransportError::IdleTimeout(idle_timeout)),
            frame = self.next_frame() => frame,
        }
    }

    fn close(&self) { self.closed.cancel(); }
}

#[cfg(test)]
mod tests {
    use futures::SinkExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;

    async fn serve(messages: Vec<Message>, hold_open: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("handshake");
            for message in messages {
                ws.send(message).await.expect("send");
            }
            if hold_open {
                sleep(Duration::from_secs(30)).await;
            }
        });
        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn reads_text_and_binary_frames() {
        let url = serve(
            vec![
                Message::Text("{\"version\":1}".into()),
                Message::Binary(Bytes::from_static(b"raw")),
                Message::Ping(Bytes::new()),
            ],
            true,
        )
        .await;
        let conn = WebSocketTransport
            .dial(&url, Duration::from_secs(5))
            .await
            .expect("dial");

        let idle = Duration::from_secs(5);
        assert_eq!(
            conn.read_frame(idle).await.expect("text"),
            Bytes::from_static(b"{\"version\":1}")
        );
        assert_eq!(
            conn.read_frame(idle).await.expect("binary"),
            Bytes::from_static(b"raw")
        );
        assert!(conn.read_frame(idle).await.expect("ping").is_empty());
    }

    #[tokio::test]
    async fn idle_connection_times_out() {
        let url = serve(Vec::new(), true).await;
        let conn = WebSocketTransport
            .dial(&url, Duration::from_secs(5))
            .await
            .expect("dial");
        let err = conn
            .read_frame(Duration::from_millis(50))
            .await
            .expect_err("idle read must fail");
        assert!(err.is_idle_timeout());
    }

    #[tokio::test]
    async fn close_wakes_pending_read() {
        let url = serve(Vec::new(), true).await;
        let conn = WebSocketTransport
            .dial(&url, Duration::from_secs(5))
            .await
            .expect("dial");
        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.read_frame(Duration::ZERO).await })
        };
        tokio::task::yield_now().await;
        conn.close();
        conn.close();
        let result = timeout(Duration::from_secs(1), reader)
            .await
            .expect("read unblocked")
            .expect("join");
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn peer_close_is_reported() {
        let url = serve(vec![Message::Close(None)], false).await;
        let conn = WebSocketTransport
            .dial(&url, Duration::from_secs(5))
            .await
            .expect("dial");
        let result = conn.read_frame(Duration::from_secs(5)).await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn refused_dial_is_an_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        drop(listener);
        let result = WebSocketTransport
            .dial(&format!("ws://{addr}"), Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(TransportError::Io(_))));
    }
}
