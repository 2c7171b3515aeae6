use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::RjnError;

/// Canonical date-time format expected by the RJN Clarity upload endpoint.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Epoch values at or above this magnitude are interpreted as milliseconds.
const EPOCH_MILLIS_CUTOFF: i64 = 100_000_000_000;

/// A timestamp as callers hand it to us: integer epoch, fractional epoch, or
/// a string that is either numeric or already formatted.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampInput {
    Seconds(i64),
    Fractional(f64),
    Text(String),
}

impl From<i64> for TimestampInput {
    fn from(raw: i64) -> Self {
        TimestampInput::Seconds(raw)
    }
}

impl From<f64> for TimestampInput {
    fn from(raw: f64) -> Self {
        TimestampInput::Fractional(raw)
    }
}

impl From<&str> for TimestampInput {
    fn from(raw: &str) -> Self {
        TimestampInput::Text(raw.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(raw: String) -> Self {
        TimestampInput::Text(raw)
    }
}

/// Converts any accepted timestamp representation into the canonical API
/// string. Deterministic: the same input always yields the same output.
pub fn normalize(input: &TimestampInput) -> Result<String, RjnError> {
    match input {
        TimestampInput::Seconds(raw) => from_epoch(*raw),
        TimestampInput::Fractional(raw) => {
            if !raw.is_finite() {
                return Err(RjnError::InvalidArgument(format!(
                    "timestamp is not a finite number: {raw}"
                )));
            }
            let millis = if raw.abs() >= EPOCH_MILLIS_CUTOFF as f64 {
                raw.round() as i64
            } else {
                (raw * 1000.0).round() as i64
            };
            format_millis(millis)
        }
        TimestampInput::Text(raw) => from_text(raw),
    }
}

fn from_epoch(raw: i64) -> Result<String, RjnError> {
    let millis = if raw.abs() >= EPOCH_MILLIS_CUTOFF {
        raw
    } else {
        raw.checked_mul(1000).ok_or_else(|| {
            RjnError::InvalidArgument(format!("epoch timestamp out of range: {raw}"))
        })?
    };
    format_millis(millis)
}

fn format_millis(millis: i64) -> Result<String, RjnError> {
    let datetime = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| {
            RjnError::InvalidArgument(format!("epoch timestamp out of range: {millis} ms"))
        })?;
    Ok(datetime.format(DATE_TIME_FORMAT).to_string())
}

fn from_text(raw: &str) -> Result<String, RjnError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RjnError::InvalidArgument("timestamp is empty".to_string()));
    }
    if let Ok(seconds) = trimmed.parse::<i64>() {
        return from_epoch(seconds);
    }
    if let Ok(fractional) = trimmed.parse::<f64>() {
        return normalize(&TimestampInput::Fractional(fractional));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT) {
        return Ok(naive.format(DATE_TIME_FORMAT).to_string());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed
            .with_timezone(&Utc)
            .format(DATE_TIME_FORMAT)
            .to_string());
    }
    Err(RjnError::InvalidArgument(format!(
        "unrecognized timestamp: {trimmed}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_seconds_normalize_to_utc_string() {
        let formatted = normalize(&TimestampInput::Seconds(1_700_000_000)).unwrap();
        assert_eq!(formatted, "2023-11-14 22:13:20");
    }

    #[test]
    fn epoch_milliseconds_are_detected_by_magnitude() {
        let formatted = normalize(&TimestampInput::Seconds(1_700_000_000_000)).unwrap();
        assert_eq!(formatted, "2023-11-14 22:13:20");
    }

    #[test]
    fn fractional_seconds_truncate_to_whole_seconds() {
        let formatted = normalize(&TimestampInput::Fractional(1_700_000_000.4)).unwrap();
        assert_eq!(formatted, "2023-11-14 22:13:20");
    }

    #[test]
    fn numeric_strings_reenter_the_epoch_path() {
        let formatted = normalize(&"1700000000".into()).unwrap();
        assert_eq!(formatted, "2023-11-14 22:13:20");
    }

    #[test]
    fn preformatted_strings_pass_through() {
        let formatted = normalize(&"2023-11-14 22:13:20".into()).unwrap();
        assert_eq!(formatted, "2023-11-14 22:13:20");
    }

    #[test]
    fn rfc3339_strings_are_reformatted_in_utc() {
        let formatted = normalize(&"2023-11-14T16:13:20-06:00".into()).unwrap();
        assert_eq!(formatted, "2023-11-14 22:13:20");
    }

    #[test]
    fn unparseable_strings_are_invalid_arguments() {
        let err = normalize(&"not a time".into()).unwrap_err();
        assert!(matches!(err, RjnError::InvalidArgument(_)));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let err = normalize(&TimestampInput::Fractional(f64::NAN)).unwrap_err();
        assert!(matches!(err, RjnError::InvalidArgument(_)));
    }
}
