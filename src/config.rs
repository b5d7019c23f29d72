//! Layered runtime configuration.
//!
//! Settings come from built-in defaults, then an optional TOML file, then
//! `CHAMBERWATCH_*` environment variables (nested keys use `__`, e.g.
//! `CHAMBERWATCH_SOURCE__PORT=7000`). The console's command-line flags
//! override all of these.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::DEFAULT_HISTORY_CAPACITY;
use crate::link::LinkSettings;

/// Top-level settings for the console.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub source: SourceSettings,
    pub link: RetrySettings,
    pub history: HistorySettings,
}

/// Where the sensor feed lives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceSettings {
    pub host: String,
    pub port: u16,
}

impl SourceSettings {
    /// `host:port` form used to dial the feed.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection supervision knobs, in file-friendly units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrySettings {
    pub connect_timeout_ms: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_retries: u32,
}

/// Rolling-history sizing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistorySettings {
    pub capacity: usize,
}

impl Settings {
    /// Load settings: built-in defaults, then `path` (if given), then the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("source.host", "127.0.0.1")?
            .set_default("source.port", 65432_i64)?
            .set_default("link.connect_timeout_ms", 5_000_i64)?
            .set_default("link.initial_backoff_ms", 500_i64)?
            .set_default("link.max_backoff_ms", 30_000_i64)?
            .set_default("link.max_retries", 10_i64)?
            .set_default("history.capacity", DEFAULT_HISTORY_CAPACITY as i64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(Environment::with_prefix("CHAMBERWATCH").separator("__"))
            .build()
            .context("building configuration")?;

        config
            .try_deserialize()
            .context("deserializing configuration")
    }

    /// The supervision settings handed to
    /// [`TelemetryLink::start`](crate::link::TelemetryLink::start).
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            endpoint: self.source.endpoint(),
            connect_timeout: Duration::from_millis(self.link.connect_timeout_ms),
            initial_backoff: Duration::from_millis(self.link.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.link.max_backoff_ms),
            max_retries: self.link.max_retries,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: SourceSettings {
                host: "127.0.0.1".to_string(),
                port: 65432,
            },
            link: RetrySettings {
                connect_timeout_ms: 5_000,
                initial_backoff_ms: 500,
                max_backoff_ms: 30_000,
                max_retries: 10,
            },
            history: HistorySettings {
                capacity: DEFAULT_HISTORY_CAPACITY,
            },
        }
    }
}
