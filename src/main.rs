//! `feedclient` binary: follows the configured feeds and logs every batch
//! and confirmation until interrupted.

mod cli;

use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use feedclient::{
    FeedClients,
    config::FeedClientConfig,
    sink::{MessageSink, SinkError},
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct LoggingSink;

#[async_trait]
impl MessageSink<Value> for LoggingSink {
    async fn apply(&self, start: u64, _force: bool, payloads: Vec<Value>) -> Result<(), SinkError> {
        info!(start, count = payloads.len(), "feed batch");
        for (seq, payload) in (start..).zip(&payloads) {
            tracing::debug!(seq, %payload, "feed message");
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
fn install_metrics(addr: std::net::SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!(%addr, "serving metrics");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(addr: std::net::SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    tracing::warn!(%addr, "built without metrics support, ignoring --metrics-addr");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = cli::Cli::parse();
    if let Some(addr) = cli.metrics_addr {
        install_metrics(addr)?;
    }

    let config = FeedClientConfig {
        urls: cli.urls,
        timeout: Duration::from_secs(cli.timeout),
    };
    let (tx, mut rx) = mpsc::channel(64);
    let confirmations = tokio::spawn(async move {
        while let Some(seq) = rx.recv().await {
            info!(seq, "feed confirmed sequence number");
        }
    });

    let clients = FeedClients::new(&config, cli.start_sequence, LoggingSink, Some(tx));
    let shutdown = CancellationToken::new();
    clients.start(&shutdown);

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, stopping feed clients");
    shutdown.cancel();
    clients.stop_and_wait().await;
    drop(clients);
    confirmations.await?;
    Ok(())
}
