//! JSON output for other programs.
//!
//! The report is written as one pretty-printed object:
//!
//! ```text
//! {
//!   "scope": "society_hill_local",
//!   "status": "ok",
//!   "diagnostic": "12 meetings from html_table source",
//!   "generated_at": "2026-01-15T09:00:00-05:00",
//!   "meetings": [ { "body_name": ..., "relevance": "local" }, ... ]
//! }
//! ```

use tracing::{debug, instrument};

use crate::models::Report;

#[instrument(level = "debug", skip_all, fields(meetings = report.meetings.len()))]
pub fn report_to_json(report: &Report) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string_pretty(report)?;
    debug!(bytes = json.len(), "Serialized report");
    Ok(json)
}
