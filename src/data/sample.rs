//! Telemetry samples.

use serde::Serialize;

/// Safe-idle baseline pressure reported before the first reading arrives.
pub const BASELINE_PRESSURE_PSI: f64 = 100.0;

/// Safe-idle baseline temperature reported before the first reading arrives.
pub const BASELINE_TEMPERATURE_C: f64 = 25.0;

/// One telemetry reading. Immutable once constructed; published to readers
/// only as a whole value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Synthetic sequence index, strictly increasing per stream. The first
    /// decoded reading gets 0.
    pub seq: u64,
    /// Chamber pressure in psi.
    pub pressure: f64,
    /// Chamber temperature in degrees Celsius.
    pub temperature: f64,
}

impl Sample {
    /// The sentinel shown until real data arrives.
    pub fn baseline() -> Self {
        Self {
            seq: 0,
            pressure: BASELINE_PRESSURE_PSI,
            temperature: BASELINE_TEMPERATURE_C,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_values() {
        let sample = Sample::baseline();
        assert_eq!(sample.seq, 0);
        assert_eq!(sample.pressure, 100.0);
        assert_eq!(sample.temperature, 25.0);
    }

    #[test]
    fn test_sample_serializes_to_json() {
        let sample = Sample {
            seq: 3,
            pressure: 101.5,
            temperature: 25.1,
        };
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["seq"], 3);
        assert_eq!(json["pressure"], 101.5);
        assert_eq!(json["temperature"], 25.1);
    }
}
