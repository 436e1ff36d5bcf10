//! Mapping of source-native fields onto [`MeetingRecord`].
//!
//! Normalization is total: every raw record yields exactly one meeting, with
//! placeholders standing in for whatever the source left out. Nothing here
//! touches the network or the clock.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DATE_UNAVAILABLE, MeetingRecord, RawRecord, SourceKind};
use crate::scrapers::html_table::LINK_SUFFIX;
use crate::scrapers::{odata, rss};

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap());
static US_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}:\d{2})\s*([ap])\.?\s*m\b\.?").unwrap());

/// Pull the first calendar date out of free text (`2026-01-20`, `2026-01-20T00:00:00`, `1/20/2026`).
pub fn derive_date(text: &str) -> Option<NaiveDate> {
    if let Some(c) = ISO_DATE.captures(text) {
        let date = NaiveDate::from_ymd_opt(
            c[1].parse().ok()?,
            c[2].parse().ok()?,
            c[3].parse().ok()?,
        );
        if date.is_some() {
            return date;
        }
    }
    let c = US_DATE.captures(text)?;
    NaiveDate::from_ymd_opt(c[3].parse().ok()?, c[1].parse().ok()?, c[2].parse().ok()?)
}

/// Pull a clock time such as `10:00 AM` out of free text, in `H:MM AM` form.
pub fn derive_time(text: &str) -> Option<String> {
    let c = CLOCK_TIME.captures(text)?;
    Some(format!("{} {}M", &c[1], c[2].to_uppercase()))
}

fn structured_date(text: Option<&str>) -> String {
    text.and_then(derive_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| DATE_UNAVAILABLE.to_string())
}

/// Map one raw record of `kind` onto the canonical schema.
///
/// Total and idempotent: every input yields exactly one record, with
/// placeholders standing in for missing body name, date and link.
///
/// # Arguments
///
/// * `kind` - The source kind that produced `raw`, which decides the field names
/// * `raw` - The fields as the extractor found them
///
/// # Returns
///
/// The canonical [`MeetingRecord`], with the date as `YYYY-MM-DD` when one
/// could be derived and [`DATE_UNAVAILABLE`] otherwise.
pub fn normalize(kind: SourceKind, raw: &RawRecord) -> MeetingRecord {
    match kind {
        SourceKind::HtmlTable => normalize_table_row(raw),
        SourceKind::Odata => normalize_event(raw),
        SourceKind::Rss => normalize_feed_item(raw),
    }
}

/// Normalize a whole batch, preserving order and length.
pub fn normalize_all(kind: SourceKind, raws: &[RawRecord]) -> Vec<MeetingRecord> {
    raws.iter().map(|raw| normalize(kind, raw)).collect()
}

fn normalize_table_row(raw: &RawRecord) -> MeetingRecord {
    let column = |key: &str| {
        raw.find(|name| !name.ends_with(LINK_SUFFIX) && name.to_lowercase().contains(key))
    };
    let link_of = |key: &str| {
        raw.find(|name| name.ends_with(LINK_SUFFIX) && name.to_lowercase().contains(key))
    };

    let date_text = column("date");
    let time = column("time")
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| date_text.and_then(derive_time))
        .unwrap_or_default();

    let link = link_of("details")
        .or_else(|| link_of("name"))
        .or_else(|| raw.find(|name| name.ends_with(LINK_SUFFIX)))
        .unwrap_or_default();

    MeetingRecord::new(
        column("name").unwrap_or_default(),
        structured_date(date_text),
        time,
        column("location").unwrap_or_default(),
        link,
    )
}

fn normalize_event(raw: &RawRecord) -> MeetingRecord {
    MeetingRecord::new(
        raw.get(odata::EVENT_BODY_NAME).unwrap_or_default(),
        structured_date(raw.get(odata::EVENT_DATE)),
        raw.get(odata::EVENT_TIME).unwrap_or_default(),
        raw.get(odata::EVENT_LOCATION).unwrap_or_default(),
        raw.get(odata::EVENT_URL).unwrap_or_default(),
    )
}

fn normalize_feed_item(raw: &RawRecord) -> MeetingRecord {
    let date_time = raw.get(rss::FIELD_DATE_TIME);
    MeetingRecord::new(
        raw.get(rss::FIELD_BODY_NAME).unwrap_or_default(),
        structured_date(date_time),
        date_time.and_then(derive_time).unwrap_or_default(),
        "",
        raw.get(rss::FIELD_LINK).unwrap_or_default(),
    )
}
