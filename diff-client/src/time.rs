//! Conversions between operator-facing time strings and the epoch
//! milliseconds the API speaks.

use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::Utc;
use thiserror::Error;

/// Display format used across the web UI and the CLI.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized time '{0}': expected epoch milliseconds, 'YYYY-MM-DD HH:MM:SS' or RFC 3339")]
pub struct TimeParseError(pub String);

/// Parse epoch milliseconds, `YYYY-MM-DD HH:MM:SS` (UTC), or RFC 3339.
pub fn parse_time(input: &str) -> Result<i64, TimeParseError> {
    let trimmed = input.trim();
    if let Ok(ms) = trimmed.parse::<i64>()
        && ms >= 0
    {
        return Ok(ms);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, TIME_FORMAT) {
        return Ok(naive.and_utc().timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).timestamp_millis());
    }
    Err(TimeParseError(input.to_string()))
}

/// Format epoch milliseconds in [`TIME_FORMAT`], UTC. Out-of-range values are
/// shown as raw milliseconds.
pub fn format_time(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format(TIME_FORMAT).to_string(),
        None => ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_all_accepted_forms() {
        assert_eq!(parse_time("1514764800000"), Ok(1_514_764_800_000));
        assert_eq!(parse_time("2018-01-01 00:00:00"), Ok(1_514_764_800_000));
        assert_eq!(parse_time(" 2018-01-01T01:00:00+01:00 "), Ok(1_514_764_800_000));
    }

    #[test]
    fn rejects_garbage_and_negative_millis() {
        assert!(parse_time("yesterday").is_err());
        assert!(parse_time("-5").is_err());
    }

    #[test]
    fn format_round_trips_the_display_format() {
        assert_eq!(format_time(1_514_764_800_000), "2018-01-01 00:00:00");
    }
}
