//! Input validation and parsing for configuration values
//!
//! - ARNs: `arn:partition:service:region:account:resource...`
//! - Timestamps: RFC 3339, empty meaning "no bound"
//! - Durations: Go-style strings such as `"0s"`, `"1ms"`, `"5m"`, `"1h30m"`

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Whether a string looks like an AWS ARN
pub fn is_arn(value: &str) -> bool {
    value.starts_with("arn:") && value.matches(':').count() >= 5
}

/// Validate an ARN attribute; an empty value is not an error
pub fn validate_arn(key: &str, value: &str) -> Result<()> {
    if value.is_empty() || is_arn(value) {
        return Ok(());
    }
    Err(Error::invalid_input(format!(
        "{:?} ({}) is an invalid ARN",
        key, value
    )))
}

/// Parse an optional RFC 3339 timestamp
pub fn parse_rfc3339_timestamp(value: &str) -> Result<Option<DateTime<Utc>>> {
    if value.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| Some(ts.with_timezone(&Utc)))
        .map_err(|e| {
            Error::invalid_input(format!("{:?} is not an RFC 3339 timestamp: {}", value, e))
        })
}

/// Parse a duration string made of `<number><unit>` terms
pub fn parse_duration(value: &str) -> Result<Duration> {
    let invalid = || Error::invalid_input(format!("invalid duration {:?}", value));

    let mut rest = value.strip_prefix('+').unwrap_or(value);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_end);
        if number.is_empty() || number == "." {
            return Err(invalid());
        }
        let amount: f64 = number.parse().map_err(|_| invalid())?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };

        nanos += amount * scale;
        rest = tail;
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}
