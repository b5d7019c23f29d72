//! Sensor feed simulator.
//!
//! Stands in for the station hardware during development: accepts one
//! client at a time and emits one wire-protocol line per tick. The pressure
//! curve is an exponential decay with a superimposed wave and random
//! spikes, clamped to the chamber gauge's 0-145 psi range; temperature
//! wanders around 25 degrees. Each new client restarts the curve at t=0.

use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

/// Gauge ceiling in psi; emitted pressures are clamped to [0, this].
pub const MAX_PRESSURE_PSI: f64 = 145.0;

const BASE_PRESSURE_PSI: f64 = 100.0;
const DECAY_RATE: f64 = 0.03;

/// Waveform generator for the simulated chamber.
#[derive(Debug, Clone, Default)]
pub struct Waveform {
    t: u64,
}

impl Waveform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next (pressure, temperature) pair and advance time.
    pub fn next_reading(&mut self, rng: &mut impl Rng) -> (f64, f64) {
        let t = self.t as f64;
        self.t += 1;

        let mut pressure = BASE_PRESSURE_PSI * (-DECAY_RATE * t).exp();
        pressure += 5.0 * (t / 2.0).sin();
        pressure += rng.gen_range(-1.5..1.5);
        let pressure = pressure.clamp(0.0, MAX_PRESSURE_PSI);

        let temperature = 25.0 + (t / 8.0).sin() + rng.gen_range(-0.5..0.5);

        (pressure, temperature)
    }

    /// Format a reading as one line of the wire protocol.
    pub fn format_line(pressure: f64, temperature: f64) -> String {
        format!("pressure={pressure:.2},temperature={temperature:.2}\n")
    }
}

/// Serve the waveform to one client at a time, forever.
pub async fn serve(listener: TcpListener, interval: Duration) -> Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "client connected");

        if let Err(e) = feed_client(socket, interval).await {
            warn!(%peer, error = %e, "client dropped");
        }
    }
}

async fn feed_client(mut socket: TcpStream, interval: Duration) -> Result<()> {
    let mut waveform = Waveform::new();
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        let (pressure, temperature) = waveform.next_reading(&mut rng);
        let line = Waveform::format_line(pressure, temperature);
        socket.write_all(line.as_bytes()).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;

    #[test]
    fn test_readings_stay_within_gauge_range() {
        let mut waveform = Waveform::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let (pressure, temperature) = waveform.next_reading(&mut rng);
            assert!((0.0..=MAX_PRESSURE_PSI).contains(&pressure));
            // 25 +/- 1 of wave and +/- 0.5 of noise
            assert!((23.0..=27.0).contains(&temperature));
        }
    }

    #[test]
    fn test_pressure_decays_over_time() {
        let mut waveform = Waveform::new();
        let mut rng = StdRng::seed_from_u64(7);

        let (first, _) = waveform.next_reading(&mut rng);

        let mut last = first;
        for _ in 0..200 {
            last = waveform.next_reading(&mut rng).0;
        }

        // After 200 ticks the exponential term is essentially gone; what is
        // left is the wave plus noise
        assert!(first > 90.0);
        assert!(last < 10.0);
    }

    #[test]
    fn test_emitted_lines_parse() {
        let mut waveform = Waveform::new();
        let mut rng = StdRng::seed_from_u64(123);

        for _ in 0..50 {
            let (pressure, temperature) = waveform.next_reading(&mut rng);
            let line = Waveform::format_line(pressure, temperature);
            let reading = protocol::parse_line(&line).unwrap();

            assert!((reading.pressure - pressure).abs() < 0.01);
            assert!((reading.temperature - temperature).abs() < 0.01);
        }
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            Waveform::format_line(103.468, 24.923),
            "pressure=103.47,temperature=24.92\n"
        );
    }

    #[tokio::test]
    async fn test_serve_feeds_a_client() {
        use tokio::io::{AsyncBufReadExt, BufReader};

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(serve(listener, Duration::from_millis(10)));

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut lines = BufReader::new(stream).lines();

        for _ in 0..3 {
            let line = lines.next_line().await.unwrap().unwrap();
            protocol::parse_line(&line).unwrap();
        }

        server.abort();
    }
}
