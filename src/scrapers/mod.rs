//! Extractors that turn a raw response body into [`RawRecord`]s.
//!
//! Every source kind has its own module with the same contract: take the
//! response bytes (plus the page URL for resolving links) and return an
//! ordered list of raw field mappings, or a [`ParseError`].
//!
//! # Supported Sources
//!
//! | Kind | Module | Method | Notes |
//! |------|--------|--------|-------|
//! | `html_table` | [`html_table`] | HTML scraping | Picks the schedule table by content, not position |
//! | `odata` | [`odata`] | JSON list | A top-level object is an upstream error, not data |
//! | `rss` | [`rss`] | XML feed | Splits `"<body> - <date> - <time>"` titles |
//!
//! Field names in the returned records are native to each kind; the
//! [`normalize`](crate::normalize) module knows how to read them.

pub mod html_table;
pub mod odata;
pub mod rss;

use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::models::{RawRecord, SourceKind};

/// Why a payload could not be turned into records.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no table found on the calendar page")]
    NoTable,
    #[error("expected a JSON list of events, got {found}: {detail}")]
    UnexpectedPayload { found: &'static str, detail: String },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid RSS feed: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("response body is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Run the extractor for `kind` over `body`.
///
/// # Arguments
///
/// * `kind` - Which upstream format `body` is in
/// * `body` - The raw response bytes
/// * `base` - The source URL, used to resolve relative links
///
/// # Returns
///
/// The raw records in source order, or a [`ParseError`] when the payload does
/// not have the shape `kind` expects.
#[instrument(level = "info", skip_all, fields(%kind, bytes = body.len()))]
pub fn extract(kind: SourceKind, body: &[u8], base: &Url) -> Result<Vec<RawRecord>, ParseError> {
    let result = match kind {
        SourceKind::HtmlTable => html_table::extract(&String::from_utf8_lossy(body), base),
        SourceKind::Odata => odata::extract(body),
        SourceKind::Rss => rss::extract(std::str::from_utf8(body)?),
    };

    match &result {
        Ok(records) => info!(count = records.len(), "Extracted raw records"),
        Err(e) => warn!(error = %e, "Extraction failed"),
    }
    result
}
