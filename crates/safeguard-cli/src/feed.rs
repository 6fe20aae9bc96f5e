//! Line-oriented sensor feed read from stdin.
//!
//! Grammar (one directive per line, blank lines and `#` comments ignored):
//!
//!   battery <percent>        – battery reading
//!   scan [<range> ...]       – proximity scan (`inf` allowed, may be empty)
//!   activate                 – operator activation signal
//!   quit                     – shut the supervisor down
//!
//! Parsing only checks syntax.  Range checks (negative or NaN values) belong
//! to the intake's validator, so a `battery -5` line parses fine and is then
//! rejected there.

use safeguard_types::{BatteryLevel, ProximityScan, SafetyError, SensorSample, SensorStream};
use thiserror::Error;

/// One parsed feed line.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedLine {
    Sample(SensorSample),
    Activate,
    Quit,
    /// Blank line or comment.
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("unknown directive '{0}' (expected battery, scan, activate or quit)")]
    UnknownDirective(String),
    #[error(transparent)]
    Sample(#[from] SafetyError),
}

/// Parse a single feed line.
pub fn parse_line(line: &str) -> Result<FeedLine, FeedError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(FeedLine::Empty);
    }

    let mut words = line.split_whitespace();
    let Some(directive) = words.next() else {
        return Ok(FeedLine::Empty);
    };

    match directive.to_ascii_lowercase().as_str() {
        "battery" => {
            let value = words
                .next()
                .ok_or_else(|| malformed(SensorStream::Battery, "missing percentage"))?;
            if let Some(extra) = words.next() {
                return Err(
                    malformed(SensorStream::Battery, format!("unexpected '{extra}'")).into(),
                );
            }
            let percent = parse_number(SensorStream::Battery, value)?;
            Ok(FeedLine::Sample(SensorSample::Battery(BatteryLevel::now(percent))))
        }
        "scan" => {
            let ranges = words
                .map(|w| parse_number(SensorStream::Proximity, w))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FeedLine::Sample(SensorSample::Proximity(ProximityScan::now(ranges))))
        }
        "activate" => Ok(FeedLine::Activate),
        "quit" | "exit" => Ok(FeedLine::Quit),
        other => Err(FeedError::UnknownDirective(other.to_string())),
    }
}

fn parse_number(stream: SensorStream, word: &str) -> Result<f32, SafetyError> {
    word.parse::<f32>()
        .map_err(|_| malformed(stream, format!("'{word}' is not a number")))
}

fn malformed(stream: SensorStream, reason: impl Into<String>) -> SafetyError {
    SafetyError::MalformedSample {
        stream,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_line() {
        match parse_line("battery 27.5").unwrap() {
            FeedLine::Sample(SensorSample::Battery(level)) => {
                assert!((level.percent - 27.5).abs() < f32::EPSILON);
            }
            other => panic!("expected battery sample, got {other:?}"),
        }
    }

    #[test]
    fn scan_line_accepts_infinity() {
        match parse_line("  scan 0.5 inf 1.25 ").unwrap() {
            FeedLine::Sample(SensorSample::Proximity(scan)) => {
                assert_eq!(scan.ranges.len(), 3);
                assert_eq!(scan.ranges[0], 0.5);
                assert!(scan.ranges[1].is_infinite());
            }
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn bare_scan_is_an_empty_scan() {
        match parse_line("scan").unwrap() {
            FeedLine::Sample(SensorSample::Proximity(scan)) => assert!(scan.ranges.is_empty()),
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn negative_values_are_left_to_the_validator() {
        assert!(matches!(
            parse_line("battery -5").unwrap(),
            FeedLine::Sample(SensorSample::Battery(_))
        ));
    }

    #[test]
    fn control_directives() {
        assert_eq!(parse_line("activate").unwrap(), FeedLine::Activate);
        assert_eq!(parse_line("QUIT").unwrap(), FeedLine::Quit);
        assert_eq!(parse_line("").unwrap(), FeedLine::Empty);
        assert_eq!(parse_line("# comment").unwrap(), FeedLine::Empty);
    }

    #[test]
    fn battery_without_value_is_malformed() {
        let err = parse_line("battery").unwrap_err();
        assert!(matches!(
            err,
            FeedError::Sample(SafetyError::MalformedSample { stream: SensorStream::Battery, .. })
        ));
    }

    #[test]
    fn battery_with_extra_words_is_malformed() {
        assert!(parse_line("battery 40 50").is_err());
    }

    #[test]
    fn non_numeric_range_names_the_stream() {
        let err = parse_line("scan 0.4 far").unwrap_err();
        match err {
            FeedError::Sample(SafetyError::MalformedSample { stream, reason }) => {
                assert_eq!(stream, SensorStream::Proximity);
                assert!(reason.contains("far"));
            }
            other => panic!("expected malformed scan, got {other:?}"),
        }
    }

    #[test]
    fn unknown_directive() {
        assert_eq!(
            parse_line("dance 3").unwrap_err(),
            FeedError::UnknownDirective("dance".to_string())
        );
    }
}
