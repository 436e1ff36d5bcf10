//! Calendar page table scraper.
//!
//! The calendar page carries many tables (navigation, filters, footer) besides
//! the meeting grid, and their order changes between page revisions. The grid
//! is therefore picked by content: the first table whose text contains a
//! schedule column header such as `Meeting Date`. When no table carries a
//! marker the first table is used as a degraded fallback.
//!
//! Every `<table>` is a candidate, but a table only owns the rows whose
//! nearest enclosing `<table>` is itself. Rows that wrap another table (pager
//! bars, layout cells) are skipped, so a layout wrapper never carries the
//! text of the grid inside it, and a grid with a nested pager stays readable.
//!
//! Header handling follows the table's own markup. A leading row made only of
//! `<th>` cells supplies the column names; otherwise columns get ordinal labels
//! (`"0"`, `"1"`, ...) and the first data row is promoted to the header.
//!
//! Each kept cell becomes a field named after its column. A cell holding a link
//! adds a second field, `"<column>@href"`, with the absolute URL.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::ParseError;
use crate::models::RawRecord;
use crate::utils::collapse_whitespace;

/// Header phrases that identify the meeting grid.
pub const SCHEDULE_MARKERS: &[&str] = &["Meeting Date", "Meeting Time", "Meeting Location"];

/// Columns worth keeping, matched as substrings of the header text.
pub const COLUMN_KEYS: &[&str] = &["Name", "Date", "Time", "Location", "Agenda", "Details"];

/// Suffix for the companion field carrying a cell's link.
pub const LINK_SUFFIX: &str = "@href";

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// One table cell: its visible text and the first usable link inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub href: Option<String>,
}

/// A table lifted out of the page, before any column filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ExtractedTable {
    /// Headers and cell text joined by spaces.
    pub fn serialized_text(&self) -> String {
        self.headers
            .iter()
            .map(String::as_str)
            .chain(self.rows.iter().flatten().map(|c| c.text.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when headers are the placeholder labels `"0"`, `"1"`, ...
    pub fn has_ordinal_headers(&self) -> bool {
        self.headers
            .iter()
            .enumerate()
            .all(|(i, h)| *h == i.to_string())
    }

    /// Replace ordinal headers with the first data row.
    pub fn promote_header_row(mut self) -> Self {
        if self.has_ordinal_headers() && !self.rows.is_empty() {
            let first = self.rows.remove(0);
            self.headers = first.into_iter().map(|c| c.text).collect();
            debug!(headers = ?self.headers, "Promoted first row to header");
        }
        self
    }

    /// Indices of columns whose header mentions a [`COLUMN_KEYS`] entry.
    /// Falls back to every column when none do.
    pub fn wanted_columns(&self) -> Vec<usize> {
        let wanted: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                let h = h.to_lowercase();
                COLUMN_KEYS.iter().any(|k| h.contains(&k.to_lowercase()))
            })
            .map(|(i, _)| i)
            .collect();

        if wanted.is_empty() {
            debug!("No recognized columns; keeping the full table");
            (0..self.headers.len()).collect()
        } else {
            wanted
        }
    }

    /// Turn data rows into raw records. Rows with no text at all are skipped.
    pub fn into_records(self) -> Vec<RawRecord> {
        let columns = self.wanted_columns();
        let mut records = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            if row.iter().all(|c| c.text.is_empty()) {
                continue;
            }
            let mut record = RawRecord::new();
            for &i in &columns {
                let header = &self.headers[i];
                match row.get(i) {
                    Some(cell) => {
                        record.push(header.clone(), cell.text.clone());
                        if let Some(href) = &cell.href {
                            record.push(format!("{header}{LINK_SUFFIX}"), href.clone());
                        }
                    }
                    None => record.push(header.clone(), ""),
                }
            }
            records.push(record);
        }
        records
    }
}

/// Lift every table out of the page, in document order.
///
/// # Arguments
///
/// * `html` - The calendar page source
/// * `base` - The page URL, used to resolve relative links
///
/// # Returns
///
/// One [`ExtractedTable`] per `<table>` element, each built from its own rows only.
#[instrument(level = "debug", skip_all)]
pub fn extract_candidate_tables(html: &str, base: &Url) -> Vec<ExtractedTable> {
    let document = Html::parse_document(html);

    let tables: Vec<ExtractedTable> = document
        .select(&TABLE)
        .map(|table| read_table(table, base))
        .collect();

    debug!(count = tables.len(), "Extracted candidate tables");
    tables
}

/// Pick the meeting grid out of `tables`.
pub fn select_schedule_table(tables: Vec<ExtractedTable>) -> Option<ExtractedTable> {
    let position = tables.iter().position(|t| {
        let text = t.serialized_text().to_lowercase();
        SCHEDULE_MARKERS
            .iter()
            .any(|m| text.contains(&m.to_lowercase()))
    });

    match position {
        Some(i) => {
            debug!(index = i, "Selected schedule table by header marker");
            tables.into_iter().nth(i)
        }
        None => {
            let first = match tables.iter().position(|t| !t.rows.is_empty()) {
                Some(i) => tables.into_iter().nth(i),
                None => tables.into_iter().next(),
            };
            if first.is_some() {
                warn!("No table carries a schedule marker; falling back to the first table");
            }
            first
        }
    }
}

/// Scrape the meeting grid out of a calendar page.
pub fn extract(html: &str, base: &Url) -> Result<Vec<RawRecord>, ParseError> {
    let table = select_schedule_table(extract_candidate_tables(html, base))
        .ok_or(ParseError::NoTable)?
        .promote_header_row();

    let records = table.into_records();
    info!(count = records.len(), "Parsed calendar table");
    Ok(records)
}

/// Whether `table` is the nearest `<table>` enclosing `tr`.
fn owned_by(tr: &ElementRef<'_>, table: &ElementRef<'_>) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|el| el.id() == table.id())
}

fn wraps_table(cell: &ElementRef<'_>) -> bool {
    cell.select(&TABLE).next().is_some()
}

fn read_table(table: ElementRef<'_>, base: &Url) -> ExtractedTable {
    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Cell>> = Vec::new();

    for tr in table.select(&ROW).filter(|tr| owned_by(tr, &table)) {
        let cells: Vec<ElementRef<'_>> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "th" | "td"))
            .collect();
        if cells.is_empty() || cells.iter().any(wraps_table) {
            continue;
        }

        let all_th = cells.iter().all(|c| c.value().name() == "th");
        if all_th && headers.is_none() && rows.is_empty() {
            headers = Some(cells.iter().map(|c| cell_text(c)).collect());
            continue;
        }

        rows.push(cells.iter().map(|c| read_cell(c, base)).collect());
    }

    let width = headers
        .as_ref()
        .map(Vec::len)
        .unwrap_or(0)
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));

    let headers = match headers {
        Some(mut h) => {
            for i in h.len()..width {
                h.push(i.to_string());
            }
            h
        }
        None => (0..width).map(|i| i.to_string()).collect(),
    };

    ExtractedTable { headers, rows }
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    collapse_whitespace(&cell.text().collect::<Vec<_>>().join(" "))
}

fn read_cell(cell: &ElementRef<'_>, base: &Url) -> Cell {
    let href = cell
        .select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|h| !h.is_empty() && !h.starts_with('#') && !h.starts_with("javascript:"))
        .find_map(|h| base.join(h).ok())
        .map(|u| u.to_string());

    Cell {
        text: cell_text(cell),
        href,
    }
}
