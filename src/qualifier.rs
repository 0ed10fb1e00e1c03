//! Event extraction and alert qualification

use chrono::{DateTime, Utc};
use serde_json::Value;

/// The color value that makes an event alertable, compared case-insensitively
const CRITICAL_COLOR: &str = "red";

/// Sentinel for absent fields; absence is not an error
const MISSING: &str = "N/A";

/// A normalized event extracted from the top search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub status_color: String,
    pub statement: String,
    pub status_code: String,
    /// Timestamp exactly as the backend sent it, for status messages
    pub timestamp_raw: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of qualifying one fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifyOutcome {
    /// The result contained zero hits
    NoData,
    /// Top event is outside the freshness window; a negative age means the
    /// event is dated in the future
    Stale { event: Event, age_seconds: i64 },
    /// Fresh but not critical
    Informational(Event),
    /// Fresh and critical
    Alertable(Event),
    /// The top hit could not be parsed
    Malformed(String),
}

/// First element of a flattened field array, or the sentinel when absent
fn first_field(fields: &Value, name: &str, default: &str) -> String {
    fields[name][0]
        .as_str()
        .unwrap_or(default)
        .to_string()
}

/// Decide whether the freshest event warrants an alert.
///
/// An event is fresh iff `now - window <= timestamp <= now`, both ends
/// inclusive. Future-dated events are not fresh and come back as `Stale`
/// with a negative age.
pub fn qualify(result: &Value, now: DateTime<Utc>, freshness_window_seconds: u64) -> QualifyOutcome {
    // Some deployments wrap the search payload in a top-level `res` object
    let payload = if result["res"].is_object() {
        &result["res"]
    } else {
        result
    };

    let hits = match payload["hits"]["hits"].as_array() {
        Some(hits) if !hits.is_empty() => hits,
        _ => return QualifyOutcome::NoData,
    };

    let fields = &hits[0]["fields"];
    let timestamp_raw = first_field(fields, "@timestamp", MISSING);

    let timestamp = match DateTime::parse_from_rfc3339(&timestamp_raw) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            return QualifyOutcome::Malformed(format!(
                "invalid @timestamp {:?}: {}",
                timestamp_raw, e
            ))
        }
    };

    let event = Event {
        name: first_field(fields, "notification.data.name", "Unnamed"),
        status_color: first_field(fields, "notification.transition.status.color", MISSING),
        statement: first_field(fields, "notification.data.statement", MISSING),
        status_code: first_field(fields, "notification.transition.status.custom", MISSING),
        timestamp_raw,
        timestamp,
    };

    let age_seconds = (now - event.timestamp).num_seconds();
    let fresh = age_seconds >= 0 && age_seconds <= freshness_window_seconds as i64;
    if !fresh {
        return QualifyOutcome::Stale { event, age_seconds };
    }

    if event.status_color.eq_ignore_ascii_case(CRITICAL_COLOR) {
        QualifyOutcome::Alertable(event)
    } else {
        QualifyOutcome::Informational(event)
    }
}
