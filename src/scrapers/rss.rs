//! Calendar RSS feed reader.
//!
//! Feed items carry one title of the form `"<body name> - <date> - <time>"`.
//! The first segment is the body; everything after it is kept together as the
//! date/time text for the normalizer to pick apart.

use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::info;

use super::ParseError;
use crate::models::RawRecord;

pub const FIELD_BODY_NAME: &str = "body_name";
pub const FIELD_DATE_TIME: &str = "date_time";
pub const FIELD_LINK: &str = "link";

/// Separator between title segments.
pub const TITLE_SEPARATOR: &str = " - ";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

/// Split a feed title into the body name and the remaining date/time text.
///
/// Without a separator the whole title is the body name and the date is
/// unavailable (`None`).
pub fn split_title(title: &str) -> (String, Option<String>) {
    let segments: Vec<&str> = title.split(TITLE_SEPARATOR).collect();
    if segments.len() >= 2 {
        let body = segments[0].trim().to_string();
        let rest = segments[1..].join(TITLE_SEPARATOR).trim().to_string();
        (body, Some(rest))
    } else {
        (title.trim().to_string(), None)
    }
}

/// Read every feed item into a record.
pub fn extract(xml: &str) -> Result<Vec<RawRecord>, ParseError> {
    let rss: Rss = from_str(&scrub_html_entities(xml))?;

    let records: Vec<RawRecord> = rss
        .channel
        .items
        .into_iter()
        .map(|item| {
            let mut record = RawRecord::new();
            if let Some(title) = item.title.as_deref() {
                let (body, date_time) = split_title(title);
                record.push(FIELD_BODY_NAME, body);
                if let Some(date_time) = date_time {
                    record.push(FIELD_DATE_TIME, date_time);
                }
            }
            if let Some(link) = item.link {
                record.push(FIELD_LINK, link.trim());
            }
            record
        })
        .collect();

    info!(count = records.len(), "Parsed calendar feed");
    Ok(records)
}

// Feeds generated from HTML templates leak entities XML does not define.
fn scrub_html_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
}
