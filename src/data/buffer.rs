//! Shared telemetry state: latest sample, bounded history, connection status.
//!
//! Exactly one writer (the link task) and any number of polling readers.
//! The latest sample and the connection state are published as whole values
//! through watch channels, so a reader sees either the previous value or the
//! new one, never a partially written update. History is guarded by an
//! `RwLock` and only ever handed out as a copied snapshot.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;

use super::sample::Sample;
use crate::protocol::Reading;

/// Default bounded-history capacity, matching the live-data chart window.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Connection status of the sensor link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Retry budget exhausted; terminal until the link is restarted.
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Ingestion counters for status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Lines successfully decoded into samples.
    pub accepted: u64,
    /// Malformed lines discarded.
    pub rejected: u64,
}

/// Shared aggregate holding the latest sample plus a bounded rolling
/// history.
///
/// Created once at startup and injected into the link task and every
/// presentation surface; lives for the process lifetime.
///
/// # Example
///
/// ```
/// use chamberwatch::data::TelemetryBuffer;
///
/// let buffer = TelemetryBuffer::new(30);
/// assert_eq!(buffer.latest().pressure, 100.0);
/// assert!(buffer.history_snapshot().is_empty());
/// ```
#[derive(Debug)]
pub struct TelemetryBuffer {
    latest: watch::Sender<Sample>,
    state: watch::Sender<ConnectionState>,
    history: RwLock<VecDeque<Sample>>,
    capacity: usize,
    next_seq: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl TelemetryBuffer {
    /// Create an empty buffer. `capacity` bounds the rolling history and is
    /// clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (latest, _) = watch::channel(Sample::baseline());
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            latest,
            state,
            history: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_seq: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Maximum number of samples the history holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a decoded reading: assign the next sequence index, append to
    /// the history (evicting the oldest entry at capacity), then publish it
    /// as the latest sample.
    pub fn push(&self, reading: Reading) -> Sample {
        let sample = Sample {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            pressure: reading.pressure,
            temperature: reading.temperature,
        };

        {
            let mut history = self.history.write();
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(sample);
        }

        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.latest.send_replace(sample);
        sample
    }

    /// Count a discarded malformed line.
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// The most recent sample, or the baseline before any data has arrived.
    /// Never blocks.
    pub fn latest(&self) -> Sample {
        *self.latest.borrow()
    }

    /// Point-in-time copy of the history, oldest first. Safe to iterate
    /// while the writer keeps pushing; length is always within
    /// `0..=capacity`.
    pub fn history_snapshot(&self) -> Vec<Sample> {
        self.history.read().iter().copied().collect()
    }

    /// Current connection status. Never blocks.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Publish a connection state transition.
    pub fn set_connection_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// Subscribe to latest-sample updates, for push-style consumers.
    /// Polling [`latest`](Self::latest) remains the primary contract.
    pub fn watch_latest(&self) -> watch::Receiver<Sample> {
        self.latest.subscribe()
    }

    /// Subscribe to connection state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Ingestion counters.
    pub fn stats(&self) -> LinkStats {
        LinkStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
