//! Sensor link ingestion.
//!
//! A background task connects to the station's telemetry feed over TCP,
//! decodes the line protocol and publishes samples into the shared
//! [`TelemetryBuffer`]. The connection is supervised: failed attempts back
//! off exponentially until the retry budget runs out, and a disconnect
//! after a successful session re-enters the connect loop immediately.
//!
//! Nothing in this module panics or escalates an error to the caller;
//! every failure degrades to a [`ConnectionState`] readers can display.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::data::{ConnectionState, TelemetryBuffer};
use crate::protocol;

/// Connection supervision knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSettings {
    /// Endpoint of the sensor feed, e.g. `127.0.0.1:65432`.
    pub endpoint: String,
    /// Budget for a single connect attempt.
    pub connect_timeout: Duration,
    /// Delay before the first reconnect attempt; doubles per consecutive
    /// failure.
    pub initial_backoff: Duration,
    /// Upper bound for the backoff delay.
    pub max_backoff: Duration,
    /// Consecutive failed attempts tolerated before the link gives up and
    /// reports [`ConnectionState::Failed`]. 0 makes the first failure
    /// terminal.
    pub max_retries: u32,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:65432".to_string(),
            connect_timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            max_retries: 10,
        }
    }
}

impl LinkSettings {
    /// Backoff delay after the given number of consecutive failures
    /// (starting at 1).
    fn backoff_after(&self, failure_streak: u32) -> Duration {
        let exp = failure_streak.saturating_sub(1).min(16);
        let delay = self.initial_backoff.saturating_mul(2u32.saturating_pow(exp));
        delay.min(self.max_backoff)
    }
}

/// Handle to the background ingestion task.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chamberwatch::{LinkSettings, TelemetryBuffer, TelemetryLink};
///
/// # tokio_test::block_on(async {
/// let buffer = Arc::new(TelemetryBuffer::default());
/// let mut link = TelemetryLink::start(LinkSettings::default(), buffer.clone());
///
/// // surfaces poll buffer.latest() / buffer.history_snapshot()
///
/// link.stop().await;
/// # });
/// ```
#[derive(Debug)]
pub struct TelemetryLink {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TelemetryLink {
    /// Spawn the ingestion task and return immediately. Connection progress
    /// is reported through the buffer's connection state, never as an error
    /// on the caller.
    pub fn start(settings: LinkSettings, buffer: Arc<TelemetryBuffer>) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(settings, buffer, shutdown_rx));

        Self {
            shutdown,
            task: Some(task),
        }
    }

    /// Signal the task to stop and wait for it to exit and release the
    /// socket. Safe to call more than once.
    pub async fn stop(&mut self) {
        self.shutdown.send_replace(true);

        if let Some(task) = self.task.take() {
            // Every await in the task races the shutdown signal, so this
            // resolves promptly
            let _ = task.await;
        }
    }
}

/// Why a connected session ended.
enum SessionEnd {
    Shutdown,
    StreamEnded,
}

async fn run(
    settings: LinkSettings,
    buffer: Arc<TelemetryBuffer>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut failure_streak: u32 = 0;

    loop {
        buffer.set_connection_state(ConnectionState::Connecting);

        let stream = tokio::select! {
            _ = shutdown.changed() => break,
            connected = timeout(settings.connect_timeout, TcpStream::connect(&settings.endpoint)) => {
                match connected {
                    Ok(Ok(stream)) => Some(stream),
                    Ok(Err(e)) => {
                        warn!(endpoint = %settings.endpoint, error = %e, "connect failed");
                        None
                    }
                    Err(_) => {
                        warn!(
                            endpoint = %settings.endpoint,
                            timeout_ms = settings.connect_timeout.as_millis() as u64,
                            "connect timed out"
                        );
                        None
                    }
                }
            }
        };

        match stream {
            Some(stream) => {
                failure_streak = 0;
                info!(endpoint = %settings.endpoint, "sensor link connected");
                buffer.set_connection_state(ConnectionState::Connected);

                match read_session(stream, &buffer, &mut shutdown).await {
                    SessionEnd::Shutdown => break,
                    SessionEnd::StreamEnded => {
                        info!(endpoint = %settings.endpoint, "sensor link lost, reconnecting");
                        buffer.set_connection_state(ConnectionState::Disconnected);
                    }
                }
            }
            None => {
                failure_streak += 1;
                if failure_streak > settings.max_retries {
                    warn!(
                        endpoint = %settings.endpoint,
                        attempts = failure_streak,
                        "retry budget exhausted, giving up"
                    );
                    buffer.set_connection_state(ConnectionState::Failed);
                    return;
                }

                buffer.set_connection_state(ConnectionState::Disconnected);
                let delay = settings.backoff_after(failure_streak);
                debug!(
                    delay_ms = delay.as_millis() as u64,
                    failure_streak, "backing off before reconnect"
                );

                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    buffer.set_connection_state(ConnectionState::Disconnected);
}

async fn read_session(
    stream: TcpStream,
    buffer: &TelemetryBuffer,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();

        tokio::select! {
            _ = shutdown.changed() => return SessionEnd::Shutdown,
            read = reader.read_line(&mut line) => match read {
                // EOF; a reset mid-stream lands in the Err arm and is
                // treated the same way
                Ok(0) => return SessionEnd::StreamEnded,
                Ok(_) => match protocol::parse_line(&line) {
                    Ok(reading) => {
                        let sample = buffer.push(reading);
                        debug!(
                            seq = sample.seq,
                            pressure = sample.pressure,
                            temperature = sample.temperature,
                            "sample"
                        );
                    }
                    Err(e) => {
                        buffer.record_rejected();
                        warn!(error = %e, line = %line.trim_end(), "discarding malformed line");
                    }
                },
                Err(e) => {
                    warn!(error = %e, "read failed");
                    return SessionEnd::StreamEnded;
                }
            }
        }
    }
}
