//! Authority response parsing
//!
//! Endpoints differ in schema; all we need is one absolute instant. The body
//! must be a JSON object carrying either an ISO-8601 timestamp or a Unix
//! time field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use timehack_core::{HackError, HackResult, UtcInstant};

/// Timestamp fields, checked in order
const ISO_FIELDS: &[&str] = &["utc_datetime", "datetime", "dateTime", "currentDateTime", "utc"];

/// Parse an authority response body into an absolute instant
///
/// Candidate fields are tried in order; a malformed or out-of-range value
/// moves on to the next one. The first error is reported when none parse.
pub fn parse_authority_body(body: &str) -> HackResult<UtcInstant> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| HackError::InvalidTimestamp(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| HackError::InvalidTimestamp("response is not a JSON object".into()))?;

    let candidates = ISO_FIELDS
        .iter()
        .filter_map(|field| object.get(*field).map(|v| (*field, v)))
        .map(|(field, v)| (field, parse_iso_value(v)))
        .chain(object.get("unixtime_ms").map(|v| ("unixtime_ms", parse_unix_millis(v))))
        .chain(object.get("unixtime").map(|v| ("unixtime", parse_unix_secs(v))));

    let mut first_error = None;
    for (field, candidate) in candidates {
        match candidate.and_then(representable) {
            Ok(instant) => return Ok(instant),
            Err(e) => {
                tracing::debug!(field, error = %e, "timestamp field rejected");
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error
        .unwrap_or_else(|| HackError::InvalidTimestamp("no recognised timestamp field".into())))
}

fn parse_iso_value(value: &Value) -> HackResult<UtcInstant> {
    value
        .as_str()
        .ok_or_else(|| HackError::InvalidTimestamp(format!("expected a string, got {}", value)))
        .and_then(parse_iso8601)
}

fn parse_unix_millis(value: &Value) -> HackResult<UtcInstant> {
    value
        .as_i64()
        .map(UtcInstant::from_millis)
        .ok_or_else(|| HackError::InvalidTimestamp(format!("unixtime_ms out of range: {}", value)))
}

fn parse_unix_secs(value: &Value) -> HackResult<UtcInstant> {
    let instant = match value.as_i64() {
        Some(whole) => UtcInstant::checked_from_secs(whole),
        None => value.as_f64().and_then(UtcInstant::checked_from_secs_f64),
    };
    instant.ok_or_else(|| HackError::InvalidTimestamp(format!("unixtime out of range: {}", value)))
}

/// Reject instants the calendar cannot project
fn representable(instant: UtcInstant) -> HackResult<UtcInstant> {
    match DateTime::<Utc>::from_timestamp_millis(instant.as_millis()) {
        Some(_) => Ok(instant),
        None => Err(HackError::InvalidTimestamp(format!(
            "{}ms is outside the representable calendar range",
            instant.as_millis()
        ))),
    }
}

/// Parse an ISO-8601 timestamp
///
/// Accepts RFC 3339 (`Z` or numeric offset). A timestamp without an offset
/// is read as UTC.
pub fn parse_iso8601(text: &str) -> HackResult<UtcInstant> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(UtcInstant::from_millis(dt.timestamp_millis()));
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| UtcInstant::from_millis(naive.and_utc().timestamp_millis()))
        .map_err(|e| HackError::InvalidTimestamp(format!("{:?}: {}", text, e)))
}
