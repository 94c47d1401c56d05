//! Wire codec for the values exchanged with amplifiers.
//!
//! Every message on an amplifier's stdin or stdout is one decimal integer
//! terminated by `\n`. The first line an amplifier receives is its phase
//! setting; every later line in either direction is a signal.

use thiserror::Error;

/// A value relayed between amplifiers. No bounds are enforced here.
pub type Signal = i64;

/// Per-amplifier configuration value, fixed for one ring session.
pub type PhaseSetting = i64;

/// Signal fed to the first amplifier before anything has been produced.
pub const INITIAL_SIGNAL: Signal = 0;

/// A received line that is not a decimal integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed signal line {line:?}")]
pub struct ParseSignalError {
    pub line: String,
}

/// Render a value as one wire line, newline included.
pub fn encode(value: i64) -> String {
    format!("{value}\n")
}

/// Parse one wire line. Surrounding whitespace (including `\r\n`) is ignored.
pub fn parse(line: &str) -> Result<Signal, ParseSignalError> {
    line.trim().parse().map_err(|_| ParseSignalError {
        line: line.trim_end().to_string(),
    })
}

/// Join an ordering the way results are reported: `9-8-7-6-5`.
pub fn format_ordering(ordering: &[PhaseSetting]) -> String {
    ordering
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_roundtrip() {
        for value in [0, 1, -1, 139629729, -9_000_000_000, i64::MAX, i64::MIN] {
            let line = encode(value);
            assert!(line.ends_with('\n'));
            assert_eq!(parse(&line).unwrap(), value);
        }
    }

    #[test]
    fn test_parse_tolerates_crlf_and_padding() {
        assert_eq!(parse("  42\r\n").unwrap(), 42);
        assert_eq!(parse("-7").unwrap(), -7);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse("Input: \n").unwrap_err();
        assert_eq!(err.line, "Input:");
        assert!(parse("").is_err());
        assert!(parse("1.5").is_err());
    }

    #[test]
    fn test_format_ordering() {
        assert_eq!(format_ordering(&[9, 8, 7, 6, 5]), "9-8-7-6-5");
        assert_eq!(format_ordering(&[0]), "0");
        assert_eq!(format_ordering(&[]), "");
    }
}
