//! Parsing of `CHANNEL:VALUE` lines from the hardware link.
//!
//! The link is noisy: lines arrive truncated, interleaved with boot chatter,
//! or with units glued to the number (`TEMP: 24.5C`). Parsing never panics
//! and every failure is a [`LineError`] the caller is expected to drop.

use crate::telemetry::data::{Channel, Sample};
use chrono::{DateTime, Utc};
use regex::Regex;

lazy_static::lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"-?[0-9]+\.?[0-9]*").expect("number pattern is valid");
}

/// Why a line did not produce a sample.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineError {
    #[error("line has no ':' separator")]
    MissingSeparator,

    #[error("payload has no numeric token")]
    NoNumber,

    #[error("numeric token {0:?} could not be parsed")]
    InvalidNumber(String),

    #[error("unknown channel {0:?}")]
    UnknownChannel(String),
}

/// A line split into its channel name and numeric value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine<'a> {
    pub channel: &'a str,
    pub value: f64,
}

/// Extract the first number embedded in `text`.
pub fn extract_first_number(text: &str) -> Result<f64, LineError> {
    let token = NUMBER.find(text).ok_or(LineError::NoNumber)?.as_str();
    token
        .parse::<f64>()
        .map_err(|_| LineError::InvalidNumber(token.to_string()))
}

/// Split a raw line into channel name and value.
///
/// The channel name is the trimmed text before the first `':'`; the value is
/// the first numeric token after it.
pub fn parse_line(raw: &str) -> Result<ParsedLine<'_>, LineError> {
    let (channel, payload) = raw
        .trim()
        .split_once(':')
        .ok_or(LineError::MissingSeparator)?;

    Ok(ParsedLine {
        channel: channel.trim(),
        value: extract_first_number(payload)?,
    })
}

/// Parse a raw line into a [`Sample`] for a known channel.
pub fn parse_sample(raw: &str, observed_at: DateTime<Utc>) -> Result<Sample, LineError> {
    let parsed = parse_line(raw)?;
    let channel = Channel::from_wire(parsed.channel)
        .ok_or_else(|| LineError::UnknownChannel(parsed.channel.to_string()))?;

    Ok(Sample::observed(channel, parsed.value, observed_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line() {
        let parsed = parse_line("MQ3:123.45").unwrap();
        assert_eq!(parsed.channel, "MQ3");
        assert_eq!(parsed.value, 123.45);
    }

    #[test]
    fn test_noise_around_value() {
        assert_eq!(parse_line("  TEMP : ~24.5C\r\n").unwrap().value, 24.5);
        assert_eq!(parse_line("TEMP:temp=-3.25 deg").unwrap().value, -3.25);
        assert_eq!(parse_line("DIST_MQ3:12.").unwrap().value, 12.0);
    }

    #[test]
    fn test_only_first_separator_splits() {
        let parsed = parse_line("MQ3:12:30").unwrap();
        assert_eq!(parsed.channel, "MQ3");
        assert_eq!(parsed.value, 12.0);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(parse_line("MQ3 123"), Err(LineError::MissingSeparator));
        assert_eq!(parse_line(""), Err(LineError::MissingSeparator));
        assert_eq!(parse_line("MQ3:nan"), Err(LineError::NoNumber));
        assert_eq!(parse_line("MQ3:"), Err(LineError::NoNumber));
    }

    #[test]
    fn test_unknown_channel_is_typed() {
        let err = parse_sample("HUMIDITY:40", Utc::now()).unwrap_err();
        assert_eq!(err, LineError::UnknownChannel("HUMIDITY".to_string()));
    }

    #[test]
    fn test_sample_for_known_channel() {
        let now = Utc::now();
        let sample = parse_sample("DIST_TEMP: 4.0m", now).unwrap();
        assert_eq!(sample.channel, Channel::TempBeaconDistance);
        assert_eq!(sample.value, 4.0);
        assert_eq!(sample.observed_at, now);
    }

    #[test]
    fn test_non_ascii_digits_are_skipped() {
        assert_eq!(extract_first_number("\u{0663} 24.5"), Ok(24.5));
        assert_eq!(parse_line("TEMP:\u{0663} 24.5").unwrap().value, 24.5);
        assert_eq!(parse_line("MQ3:\u{0663}"), Err(LineError::NoNumber));
    }
}
