//! Headless telemetry console for the target-testing station.
//!
//! Starts the sensor link, polls the shared telemetry state on a fixed
//! cadence and logs readings and connection status. On exit it can dump
//! the current history snapshot to a JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::interval;
use tracing::{info, warn};

use chamberwatch::config::Settings;
use chamberwatch::data::{ConnectionState, TelemetryBuffer};
use chamberwatch::link::TelemetryLink;

#[derive(Parser, Debug)]
#[command(name = "chamberwatch")]
#[command(about = "Telemetry console for a vacuum/gas target-testing station")]
struct Args {
    /// Sensor feed endpoint (host:port); overrides the configured source
    #[arg(short, long)]
    connect: Option<String>,

    /// Path to a TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// History capacity (number of samples kept)
    #[arg(long)]
    capacity: Option<usize>,

    /// Poll/report interval in seconds
    #[arg(short, long, default_value = "5")]
    refresh: u64,

    /// Write the final history snapshot to this JSON file on exit
    #[arg(short, long)]
    export: Option<PathBuf>,
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

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(endpoint) = &args.connect {
        let (host, port) = parse_endpoint(endpoint)?;
        settings.source.host = host;
        settings.source.port = port;
    }
    if let Some(capacity) = args.capacity {
        settings.history.capacity = capacity;
    }

    info!(
        endpoint = %settings.source.endpoint(),
        capacity = settings.history.capacity,
        "chamberwatch v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let buffer = Arc::new(TelemetryBuffer::new(settings.history.capacity));
    let mut link = TelemetryLink::start(settings.link_settings(), buffer.clone());

    let mut ticker = interval(Duration::from_secs(args.refresh.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => report(&buffer),
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down");
                break;
            }
        }
    }

    link.stop().await;

    if let Some(path) = &args.export {
        export_snapshot(&buffer, path)?;
        info!(path = %path.display(), "history snapshot exported");
    }

    Ok(())
}

/// One status line per poll tick; this is the minimal presentation surface.
fn report(buffer: &TelemetryBuffer) {
    let state = buffer.connection_state();
    let stats = buffer.stats();

    match state {
        ConnectionState::Connected => {
            let sample = buffer.latest();
            info!(
                seq = sample.seq,
                pressure_psi = sample.pressure,
                temperature_c = sample.temperature,
                rejected = stats.rejected,
                "chamber reading"
            );
        }
        ConnectionState::Failed => {
            warn!(
                accepted = stats.accepted,
                "sensor link failed; showing fallback data"
            );
        }
        _ => {
            info!(%state, accepted = stats.accepted, "waiting for sensor link");
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<(String, u16)> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .context("endpoint must be host:port")?;
    let port = port.parse().context("invalid port")?;

    Ok((host.to_string(), port))
}

/// Dump the buffer contents as pretty JSON.
fn export_snapshot(buffer: &TelemetryBuffer, path: &Path) -> Result<()> {
    use std::io::Write;

    let export = serde_json::json!({
        "connection_state": buffer.connection_state(),
        "stats": buffer.stats(),
        "latest": buffer.latest(),
        "history": buffer.history_snapshot(),
    });

    let json = serde_json::to_string_pretty(&export)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(json.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamberwatch::protocol::Reading;

    #[test]
    fn test_parse_endpoint() {
        assert_eq!(
            parse_endpoint("127.0.0.1:65432").unwrap(),
            ("127.0.0.1".to_string(), 65432)
        );
        assert!(parse_endpoint("no-port").is_err());
        assert!(parse_endpoint("host:notanumber").is_err());
    }

    #[test]
    fn test_export_snapshot_round_trips() {
        let buffer = TelemetryBuffer::new(4);
        buffer.push(Reading {
            pressure: 101.5,
            temperature: 25.1,
        });
        buffer.set_connection_state(ConnectionState::Connected);

        let file = tempfile::NamedTempFile::new().unwrap();
        export_snapshot(&buffer, file.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_reader(std::fs::File::open(file.path()).unwrap()).unwrap();

        assert_eq!(json["connection_state"], "connected");
        assert_eq!(json["stats"]["accepted"], 1);
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
        assert_eq!(json["latest"]["pressure"], 101.5);
    }
}
