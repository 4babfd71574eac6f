//! `HH:MM:SS` timestamp codec.
//!
//! Timestamps are offsets from the start of a run. Hours are unbounded (one or
//! more digits), minutes and seconds are exactly two digits in `00..=59`.

use chrono::Duration;
use thiserror::Error;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;

/// Errors produced while parsing or formatting a timestamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Malformed timestamp {0:?}: expected HH:MM:SS")]
    WrongSegmentCount(String),
    #[error("Malformed timestamp {input:?}: {segment} is not a number")]
    NonNumeric { input: String, segment: &'static str },
    #[error("Malformed timestamp {0:?}: negative values are not allowed")]
    Negative(String),
    #[error("Malformed timestamp {input:?}: {segment} must be between 00 and 59")]
    OutOfRange { input: String, segment: &'static str },
    #[error("Timestamp {0:?} is too large")]
    Overflow(String),
    #[error("Cannot format negative duration ({0} ms)")]
    NegativeDuration(i64),
}

/// Parse one segment. Minutes and seconds must be two digits; hours need at least one.
fn parse_segment(
    input: &str,
    raw: &str,
    segment: &'static str,
    exact_width: Option<usize>,
) -> Result<i64, TimestampError> {
    if raw.starts_with('-') {
        return Err(TimestampError::Negative(input.to_string()));
    }
    let width_ok = match exact_width {
        Some(width) => raw.len() == width,
        None => !raw.is_empty(),
    };
    if !width_ok || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::NonNumeric {
            input: input.to_string(),
            segment,
        });
    }
    raw.parse::<i64>()
        .map_err(|_| TimestampError::Overflow(input.to_string()))
}

/// Parse an `HH:MM:SS` string into the offset it denotes.
///
/// # Examples
/// `"00:01:30"` -> 90 seconds, `"123:00:00"` -> 123 hours.
pub fn parse_timestamp(input: &str) -> Result<Duration, TimestampError> {
    let segments: Vec<&str> = input.split(':').collect();
    let [hours, minutes, seconds] = segments.as_slice() else {
        return Err(TimestampError::WrongSegmentCount(input.to_string()));
    };

    let hours = parse_segment(input, hours, "hours", None)?;
    let minutes = parse_segment(input, minutes, "minutes", Some(2))?;
    let seconds = parse_segment(input, seconds, "seconds", Some(2))?;

    if minutes >= SECONDS_PER_MINUTE {
        return Err(TimestampError::OutOfRange {
            input: input.to_string(),
            segment: "minutes",
        });
    }
    if seconds >= SECONDS_PER_MINUTE {
        return Err(TimestampError::OutOfRange {
            input: input.to_string(),
            segment: "seconds",
        });
    }

    let total = hours
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|h| h.checked_add(minutes * SECONDS_PER_MINUTE + seconds))
        .ok_or_else(|| TimestampError::Overflow(input.to_string()))?;

    Duration::try_seconds(total).ok_or_else(|| TimestampError::Overflow(input.to_string()))
}

/// Format an offset as `HH:MM:SS`. Sub-second parts are truncated.
pub fn format_timestamp(offset: Duration) -> Result<String, TimestampError> {
    if offset < Duration::zero() {
        return Err(TimestampError::NegativeDuration(offset.num_milliseconds()));
    }
    let total = offset.num_seconds();
    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total % SECONDS_PER_MINUTE;
    Ok(format!("{:02}:{:02}:{:02}", hours, minutes, seconds))
}
