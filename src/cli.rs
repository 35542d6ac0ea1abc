//! Command line interface for the `feedclient` binary.

use std::net::SocketAddr;

use clap::Parser;

/// Follow one or more sequenced message feeds and log what arrives.
#[derive(Debug, Parser)]
#[command(name = "feedclient", version, about = "Follow sequenced message feeds over WebSocket")]
pub struct Cli {
    /// Feed endpoint; repeat for several feeds.
    #[arg(short, long = "url", value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Seconds without a frame before a connection is considered dead.
    #[arg(short, long, value_name = "SECS", default_value_t = 20)]
    pub timeout: u64,

    /// Advisory sequence number to start from.
    #[arg(short, long, value_name = "N")]
    pub start_sequence: Option<u64>,

    /// Serve Prometheus metrics on this address.
    #[arg(long, value_name = "ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}
