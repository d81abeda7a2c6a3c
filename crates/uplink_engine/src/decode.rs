use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use uplink_core::{StatusKind, UploadStatus};

/// Wire shape of `/latest_upload.json`. Every field is optional; the server
/// serves `{}` until the first upload of a run happens.
#[derive(Debug, Deserialize)]
struct RawStatus {
    timestamp: Option<serde_json::Value>,
    #[serde(default)]
    loading: bool,
    link: Option<String>,
    error: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed status payload: {0}")]
    Malformed(String),
}

/// Decode a status payload into an actionable event, if it carries one.
///
/// `Ok(None)` means the payload was well-formed JSON with nothing to report:
/// no timestamp, an unparseable timestamp, or none of loading/link/error set.
/// Only byte-level garbage is an error; the poller treats that as a failed
/// cycle, while `Ok(None)` is a successful cycle.
pub fn decode_status(bytes: &[u8]) -> Result<Option<UploadStatus>, DecodeError> {
    let raw: RawStatus =
        serde_json::from_slice(bytes).map_err(|err| DecodeError::Malformed(err.to_string()))?;

    let Some(ts_value) = raw.timestamp else {
        return Ok(None);
    };
    let Some((raw_timestamp, timestamp)) = parse_timestamp(&ts_value) else {
        return Ok(None);
    };

    // Loading wins over a lingering link: a link only finalizes completion,
    // while loading says a new upload is already underway.
    let kind = if raw.loading {
        StatusKind::Loading
    } else if let Some(link) = raw.link.filter(|link| !link.is_empty()) {
        StatusKind::Complete { link }
    } else if let Some(message) = raw.error.filter(|message| !message.is_empty()) {
        StatusKind::Failed { message }
    } else {
        return Ok(None);
    };

    Ok(Some(UploadStatus {
        raw_timestamp,
        timestamp,
        kind,
    }))
}

/// The status server has been observed writing RFC 3339 strings, naive
/// ISO-8601 local times (Python `datetime.isoformat()`), and epoch numbers.
fn parse_timestamp(value: &serde_json::Value) -> Option<(String, DateTime<Utc>)> {
    match value {
        serde_json::Value::String(text) => {
            let parsed = parse_timestamp_text(text)?;
            Some((text.clone(), parsed))
        }
        serde_json::Value::Number(number) => {
            let parsed = parse_timestamp_epoch(number.as_f64()?)?;
            Some((number.to_string(), parsed))
        }
        _ => None,
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Naive timestamps come from the server's local clock, which is the same
    // machine this runs on.
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

fn parse_timestamp_epoch(epoch: f64) -> Option<DateTime<Utc>> {
    // Heuristic: anything past the year 5138 in seconds must be milliseconds.
    let millis = if epoch.abs() >= 1e11 {
        epoch
    } else {
        epoch * 1000.0
    };
    Utc.timestamp_millis_opt(millis as i64).single()
}
