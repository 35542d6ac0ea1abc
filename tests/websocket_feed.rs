//! End-to-end test against a local WebSocket feed.

use std::time::Duration;

use feedclient::FeedClient;
use feedclient_testing::{RecordingSink, frames};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::mpsc, time::timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

mod common;
use common::{TestResult, flat_backoff};

fn text(frame: &bytes::Bytes) -> Message {
    Message::Text(String::from_utf8_lossy(frame).into_owned().into())
}

#[tokio::test]
async fn client_reads_reconnects_and_confirms_over_websocket() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("ws://{}", listener.local_addr()?);

    let server = tokio::spawn(async move {
        // First session delivers one batch and hangs up.
        let (stream, _) = listener.accept().await?;
        let mut ws = accept_async(stream).await?;
        ws.send(text(&frames::batch(1, [json!("first")]))).await?;
        ws.send(Message::Ping(bytes::Bytes::new())).await?;
        ws.close(None).await?;
        drop(ws);

        // Second session delivers a batch and a confirmation, then idles.
        let (stream, _) = listener.accept().await?;
        let mut ws = accept_async(stream).await?;
        ws.send(Message::Binary(frames::batch(2, [json!("second")]))).await?;
        ws.send(text(&frames::confirmation(2))).await?;
        while let Some(Ok(_)) = ws.next().await {}
        Ok::<_, tokio_tungstenite::tungstenite::Error>(())
    });

    let sink = RecordingSink::<Value>::new();
    let (tx, mut rx) = mpsc::channel(4);
    let client = FeedClient::builder(url, sink.clone())
        .idle_timeout(Duration::from_secs(5))
        .backoff(flat_backoff(Duration::from_millis(50)))
        .confirmations(tx)
        .build();
    client.start(&CancellationToken::new());

    timeout(Duration::from_secs(10), sink.wait_for_calls(2)).await?;
    let confirmed = timeout(Duration::from_secs(10), rx.recv()).await?;
    client.stop_and_wait().await;
    server.abort();

    let calls = sink.calls();
    assert_eq!(calls[0].start, 1);
    assert_eq!(calls[0].payloads, vec![json!("first")]);
    assert_eq!(calls[1].start, 2);
    assert_eq!(calls[1].payloads, vec![json!("second")]);
    assert_eq!(confirmed, Some(2));
    assert_eq!(client.retry_count(), 0);
    assert!(!client.is_connected());
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_is_retried_until_stopped() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("ws://{}", listener.local_addr()?);
    drop(listener);

    let client = FeedClient::builder(url, RecordingSink::<Value>::new())
        .dial_timeout(Duration::from_secs(1))
        .supervisor_delay(Duration::from_millis(20))
        .build();
    client.start(&CancellationToken::new());

    timeout(Duration::from_secs(10), async {
        while client.retry_count() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    client.stop_and_wait().await;
    assert!(client.retry_count() >= 2);
    Ok(())
}
