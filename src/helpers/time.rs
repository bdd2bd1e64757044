use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::time::Instant;

use crate::error::{CredentialError, Result};

/// Layout of `Expiration` fields returned by the metadata service and STS.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Parses `2006-01-02T15:04:05Z`-style timestamps, always UTC.
pub fn parse_expiration(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, EXPIRATION_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|err| {
            CredentialError::protocol(format!("invalid expiration time '{value}': {err}"))
        })
}

pub fn format_expiration(value: &DateTime<Utc>) -> String {
    value.format(EXPIRATION_FORMAT).to_string()
}

/// ISO 8601 timestamp used for the `Timestamp` parameter of STS calls.
pub fn iso8601_timestamp() -> String {
    format_expiration(&Utc::now())
}
