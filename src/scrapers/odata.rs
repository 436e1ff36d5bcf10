//! Events API (OData) reader.
//!
//! The events endpoint answers with a JSON list of event objects. When the
//! upstream rejects a request it answers with a single object instead
//! (usually `{"Message": "..."}`), so a top-level object is reported as an
//! error and never read as data.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use super::ParseError;
use crate::models::RawRecord;
use crate::utils::truncate_for_log;

pub const EVENT_BODY_NAME: &str = "EventBodyName";
pub const EVENT_DATE: &str = "EventDate";
pub const EVENT_TIME: &str = "EventTime";
pub const EVENT_LOCATION: &str = "EventLocation";
pub const EVENT_URL: &str = "EventInSiteURL";

/// Default result cap for one request.
pub const DEFAULT_TOP: u32 = 100;

/// Query parameters restricting the events endpoint to meetings from `today` on.
pub fn query_params(today: NaiveDate, top: u32) -> Vec<(String, String)> {
    vec![
        (
            "$filter".to_string(),
            format!("EventDate ge datetime'{}'", today.format("%Y-%m-%d")),
        ),
        ("$orderby".to_string(), "EventDate".to_string()),
        ("$top".to_string(), top.to_string()),
    ]
}

/// Read an events payload.
///
/// Every list element yields exactly one record. Absent or `null` properties
/// are simply missing from the record; nested values are skipped.
pub fn extract(body: &[u8]) -> Result<Vec<RawRecord>, ParseError> {
    let payload: Value = serde_json::from_slice(body)?;

    let events = match payload {
        Value::Array(events) => events,
        Value::Object(map) => {
            let detail = map
                .get("Message")
                .or_else(|| map.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    truncate_for_log(&serde_json::to_string(&map).unwrap_or_default(), 200)
                });
            return Err(ParseError::UnexpectedPayload {
                found: "object",
                detail,
            });
        }
        other => {
            return Err(ParseError::UnexpectedPayload {
                found: json_type(&other),
                detail: truncate_for_log(&other.to_string(), 200),
            });
        }
    };

    let records: Vec<RawRecord> = events.iter().map(read_event).collect();
    info!(
        count = records.len(),
        empty = records.iter().filter(|r| r.is_empty()).count(),
        "Parsed events payload"
    );
    Ok(records)
}

fn read_event(event: &Value) -> RawRecord {
    let mut record = RawRecord::new();
    let Some(map) = event.as_object() else {
        debug!(found = json_type(event), "Event entry is not an object");
        return record;
    };

    for (key, value) in map {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => continue,
        };
        record.push(key.clone(), text);
    }
    record
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
