//! Data models for meeting listings and the results of a fetch.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceKind`]: Which upstream format is being read
//! - [`RawRecord`]: An ordered field mapping produced by a scraper, before normalization
//! - [`MeetingRecord`]: The canonical meeting row every source kind normalizes into
//! - [`SourceResult`]: One fetch+parse attempt with its [`SourceStatus`] and diagnostic
//! - [`TaggedMeeting`] / [`Report`]: Derived views handed to the renderer

use chrono::{DateTime, Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scope::Scope;

/// Placeholder body name when the source omits it.
pub const UNKNOWN_BODY: &str = "Unknown";
/// Free-text date fallback when no structured date can be derived.
pub const DATE_UNAVAILABLE: &str = "Check details";
/// Placeholder link when the source has no detail page.
pub const NO_LINK: &str = "#";

/// The upstream transport/format in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Scrape the schedule table out of the calendar HTML page.
    HtmlTable,
    /// Query the REST/OData events endpoint.
    Odata,
    /// Read the calendar RSS/XML feed.
    Rss,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::HtmlTable => "html_table",
            SourceKind::Odata => "odata",
            SourceKind::Rss => "rss",
        };
        f.write_str(s)
    }
}

/// An ordered sequence of `(field name, value)` pairs as a scraper found them.
///
/// Field names are native to the source kind (table headers, API property
/// names, feed element names). The normalizer maps them onto [`MeetingRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Later duplicates are kept but `get` returns the first.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Builder-style [`push`](Self::push).
    #[cfg(test)]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value whose field name satisfies `pred`.
    pub fn find(&self, pred: impl Fn(&str) -> bool) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| pred(k))
            .map(|(_, v)| v.as_str())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The canonical meeting row.
///
/// Fields are private: a record is built once by the normalizer and only read
/// afterwards. Filters and the classifier produce new views instead of editing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeetingRecord {
    body_name: String,
    date: String,
    time: String,
    location: String,
    link: String,
}

impl MeetingRecord {
    /// Build a record, substituting placeholders for blank required fields.
    pub fn new(
        body_name: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        fn or_placeholder(s: String, placeholder: &str) -> String {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                placeholder.to_string()
            } else {
                trimmed.to_string()
            }
        }

        Self {
            body_name: or_placeholder(body_name.into(), UNKNOWN_BODY),
            date: or_placeholder(date.into(), DATE_UNAVAILABLE),
            time: time.into().trim().to_string(),
            location: location.into().trim().to_string(),
            link: or_placeholder(link.into(), NO_LINK),
        }
    }

    pub fn body_name(&self) -> &str {
        &self.body_name
    }

    /// `YYYY-MM-DD` when structured, otherwise [`DATE_UNAVAILABLE`] or other free text.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// The structured calendar date, if `date` holds one.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    /// Lowercased text of every field, used for keyword matching.
    pub fn search_text(&self) -> String {
        [
            self.body_name.as_str(),
            self.date.as_str(),
            self.time.as_str(),
            self.location.as_str(),
            self.link.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

/// Outcome class of one fetch+parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Empty,
    Blocked,
    Malformed,
    ConnectionError,
}

impl SourceStatus {
    /// Whether the source answered with a usable payload (possibly with zero rows).
    pub fn is_success(self) -> bool {
        matches!(self, SourceStatus::Ok | SourceStatus::Empty)
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceStatus::Ok => "ok",
            SourceStatus::Empty => "empty",
            SourceStatus::Blocked => "blocked",
            SourceStatus::Malformed => "malformed",
            SourceStatus::ConnectionError => "connection_error",
        };
        f.write_str(s)
    }
}

/// Normalized records plus a status signal for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceResult {
    pub records: Vec<MeetingRecord>,
    pub status: SourceStatus,
    pub diagnostic: String,
}

impl SourceResult {
    /// `Ok` when there is at least one record, `Empty` otherwise.
    pub fn from_records(records: Vec<MeetingRecord>, kind: SourceKind) -> Self {
        if records.is_empty() {
            Self {
                records,
                status: SourceStatus::Empty,
                diagnostic: format!("{kind} source returned no meetings"),
            }
        } else {
            let diagnostic = format!("{} meetings from {kind} source", records.len());
            Self {
                records,
                status: SourceStatus::Ok,
                diagnostic,
            }
        }
    }

    /// A failed attempt: no records, a status and a reason.
    pub fn failed(status: SourceStatus, diagnostic: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            status,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Keyword relevance derived by the classifier. Never part of source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceTag {
    Local,
    Broad,
    None,
}

/// A meeting together with the relevance tag computed for this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedMeeting {
    #[serde(flatten)]
    pub record: MeetingRecord,
    pub relevance: RelevanceTag,
}

/// Everything the renderer needs for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scope: Scope,
    pub status: SourceStatus,
    pub diagnostic: String,
    pub generated_at: DateTime<Local>,
    pub meetings: Vec<TaggedMeeting>,
}
