//! Line protocol for the sensor feed.
//!
//! The station emits one reading per line:
//!
//! ```text
//! pressure=103.47,temperature=24.92
//! ```
//!
//! Exactly two `key=value` fields, pressure first, separated by a single
//! comma, terminated by a newline. Anything else is malformed and is
//! discarded by the caller without disconnecting the stream.

use thiserror::Error;

/// A decoded wire reading, before it has been given a sequence number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Chamber pressure in psi.
    pub pressure: f64,
    /// Chamber temperature in degrees Celsius.
    pub temperature: f64,
}

/// Why a line was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected 2 comma-separated fields, got {0}")]
    FieldCount(usize),

    #[error("field `{0}` is missing the `=` separator")]
    MissingSeparator(String),

    #[error("expected key `{expected}`, got `{found}`")]
    UnexpectedKey {
        expected: &'static str,
        found: String,
    },

    #[error("value `{value}` for `{key}` is not a number")]
    BadValue { key: &'static str, value: String },
}

/// Parse one line of the wire protocol.
///
/// The trailing newline (and an optional `\r` before it) is tolerated; all
/// other whitespace is significant.
///
/// # Example
///
/// ```
/// use chamberwatch::protocol::parse_line;
///
/// let reading = parse_line("pressure=103.47,temperature=24.92\n").unwrap();
/// assert_eq!(reading.pressure, 103.47);
/// assert_eq!(reading.temperature, 24.92);
/// ```
pub fn parse_line(line: &str) -> Result<Reading, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 2 {
        return Err(ParseError::FieldCount(fields.len()));
    }

    let pressure = parse_field(fields[0], "pressure")?;
    let temperature = parse_field(fields[1], "temperature")?;

    Ok(Reading {
        pressure,
        temperature,
    })
}

fn parse_field(field: &str, key: &'static str) -> Result<f64, ParseError> {
    let (name, value) = field
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(field.to_string()))?;

    if name != key {
        return Err(ParseError::UnexpectedKey {
            expected: key,
            found: name.to_string(),
        });
    }

    value.parse().map_err(|_| ParseError::BadValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_line() {
        let reading = parse_line("pressure=103.47,temperature=24.92\n").unwrap();
        assert_eq!(reading.pressure, 103.47);
        assert_eq!(reading.temperature, 24.92);
    }

    #[test]
    fn test_parse_without_terminator() {
        // The reader may hand over the final fragment of a closed stream
        // without its newline
        let reading = parse_line("pressure=0.50,temperature=-3.25").unwrap();
        assert_eq!(reading.pressure, 0.50);
        assert_eq!(reading.temperature, -3.25);
    }

    #[test]
    fn test_parse_tolerates_carriage_return() {
        let reading = parse_line("pressure=1.00,temperature=2.00\r\n").unwrap();
        assert_eq!(reading.pressure, 1.0);
        assert_eq!(reading.temperature, 2.0);
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let line = "pressure=99.99,temperature=24.01\n";
        assert_eq!(parse_line(line).unwrap(), parse_line(line).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_line("garbage\n"), Err(ParseError::FieldCount(1)));
    }

    #[test]
    fn test_rejects_empty_line() {
        assert_eq!(parse_line("\n"), Err(ParseError::FieldCount(1)));
    }

    #[test]
    fn test_rejects_missing_comma() {
        assert_eq!(
            parse_line("pressure=1.0 temperature=2.0\n"),
            Err(ParseError::FieldCount(1))
        );
    }

    #[test]
    fn test_rejects_extra_field() {
        assert_eq!(
            parse_line("pressure=1.0,temperature=2.0,humidity=3.0\n"),
            Err(ParseError::FieldCount(3))
        );
    }

    #[test]
    fn test_rejects_missing_separator() {
        assert_eq!(
            parse_line("pressure 1.0,temperature=2.0\n"),
            Err(ParseError::MissingSeparator("pressure 1.0".to_string()))
        );
    }

    #[test]
    fn test_rejects_swapped_keys() {
        assert_eq!(
            parse_line("temperature=2.0,pressure=1.0\n"),
            Err(ParseError::UnexpectedKey {
                expected: "pressure",
                found: "temperature".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_non_numeric_value() {
        assert_eq!(
            parse_line("pressure=abc,temperature=2.0\n"),
            Err(ParseError::BadValue {
                key: "pressure",
                value: "abc".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_empty_value() {
        assert_eq!(
            parse_line("pressure=,temperature=2.0\n"),
            Err(ParseError::BadValue {
                key: "pressure",
                value: String::new(),
            })
        );
    }
}
