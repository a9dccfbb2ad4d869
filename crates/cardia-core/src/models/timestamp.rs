//! Lenient timestamp encoding.
//!
//! Stored data carries timestamps either as epoch milliseconds or as ISO-8601
//! strings. Both are accepted on read; writes always use the RFC 3339 string
//! form, which is the canonical representation.
//!
//! A string with an explicit offset names one instant. Strings without one
//! (`2024-05-06T07:08:09`, `2024-05-06`) are read as UTC, but other readers
//! may take them as local time, so healing rewrites them.

use jiff::Timestamp;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

use crate::error::CoreError;

/// Parse a stored timestamp value.
pub fn parse_value(value: &Value) -> Result<Timestamp, CoreError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .and_then(from_millis),
        Value::String(s) => parse(s),
        _ => None,
    };
    parsed.ok_or_else(|| CoreError::InvalidTimestamp(value.to_string()))
}

pub fn from_millis(millis: i64) -> Option<Timestamp> {
    Timestamp::from_millisecond(millis).ok()
}

/// Parse an ISO-8601 string. Strings without an offset are read as UTC.
pub fn parse(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if let Ok(ts) = s.parse::<Timestamp>() {
        return Some(ts);
    }
    if let Ok(dt) = s.parse::<DateTime>() {
        return dt.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    if let Ok(date) = s.parse::<Date>() {
        return date.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    None
}

/// Whether `s` carries its own offset, so it means the same instant to
/// every reader.
pub fn is_zoned(s: &str) -> bool {
    s.trim().parse::<Timestamp>().is_ok()
}

/// Canonical string form written to storage.
pub fn canonical(ts: Timestamp) -> String {
    ts.to_string()
}

pub fn serialize<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_str(&canonical(*ts)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match parse_value(&raw) {
        Ok(ts) => Ok(Some(ts)),
        Err(e) => {
            tracing::warn!(error = %e, "unreadable record timestamp, reading as undated");
            Ok(None)
        }
    }
}
