//! Simulated sensor feed for the target-testing station.
//!
//! Serves the wire protocol on a loopback port so the console can be run
//! without station hardware.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use chamberwatch::sim;

#[derive(Parser, Debug)]
#[command(name = "chamberwatch-sim")]
#[command(about = "Simulated sensor feed for the target-testing station")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:65432")]
    listen: String,

    /// Seconds between emitted readings
    #[arg(short, long, default_value = "5")]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let listener = TcpListener::bind(&args.listen).await?;
    info!(listen = %args.listen, interval_s = args.interval, "simulator listening");

    sim::serve(listener, Duration::from_secs(args.interval.max(1))).await
}
