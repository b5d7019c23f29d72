//! # chamberwatch
//!
//! Telemetry console for a vacuum/gas target-testing station.
//!
//! A background link task ingests streaming pressure/temperature readings
//! from the station's sensor feed and publishes them into shared state
//! that presentation surfaces (dashboard, live-data view, the headless
//! console binary) poll on their own timers.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       sensor feed (TCP)                        │
//! │          one "pressure=103.47,temperature=24.92" per line      │
//! └──────────────────────────────┬─────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌──────────┐   ┌────────────────────────┐   ┌───────────────────┐
//! │   link   │──▶│  data: TelemetryBuffer │◀──│   presentation    │
//! │ (ingest) │   │  latest + history +    │   │ surfaces (polling │
//! │          │   │  connection state      │   │  on their timers) │
//! └──────────┘   └────────────────────────┘   └───────────────────┘
//! ```
//!
//! - [`link`]: supervised TCP reader with connect timeout, exponential
//!   backoff and bounded shutdown
//! - [`protocol`]: the line-oriented `key=value` wire format
//! - [`data`]: [`Sample`], the bounded-history [`TelemetryBuffer`] and the
//!   connection state readers display
//! - [`config`]: layered settings (defaults, TOML file, environment)
//! - [`sim`]: waveform generator and TCP server standing in for hardware
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use chamberwatch::{LinkSettings, TelemetryBuffer, TelemetryLink};
//!
//! # tokio_test::block_on(async {
//! let buffer = Arc::new(TelemetryBuffer::default());
//! let mut link = TelemetryLink::start(LinkSettings::default(), buffer.clone());
//!
//! // Each surface polls on its own cadence:
//! let latest = buffer.latest();
//! let history = buffer.history_snapshot();
//!
//! link.stop().await;
//! # });
//! ```

pub mod config;
pub mod data;
pub mod link;
pub mod protocol;
pub mod sim;

// Re-export the main types for convenience
pub use config::Settings;
pub use data::{ConnectionState, LinkStats, Sample, TelemetryBuffer};
pub use link::{LinkSettings, TelemetryLink};
pub use protocol::{parse_line, ParseError, Reading};
