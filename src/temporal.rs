//! Upcoming-meeting filter.
//!
//! Meetings dated before today are dropped. Meetings with a structured date
//! are ordered ascending. Meetings whose date is free text (for example
//! `"Check details"`) cannot be compared, so they are kept and placed after
//! every dated meeting in their original relative order.

use chrono::NaiveDate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::models::MeetingRecord;

/// Keep meetings on or after `today`, soonest first.
///
/// # Arguments
///
/// * `records` - Normalized meetings in source order
/// * `today` - The first day still counted as upcoming
///
/// # Returns
///
/// Dated meetings sorted ascending (stable for equal dates), followed by the
/// meetings without a structured date in their original order.
#[instrument(level = "debug", skip_all, fields(%today, count = records.len()))]
pub fn upcoming(records: &[MeetingRecord], today: NaiveDate) -> Vec<MeetingRecord> {
    let (dated, undated): (Vec<_>, Vec<_>) = records
        .iter()
        .partition(|r| r.calendar_date().is_some());

    let past = dated
        .iter()
        .filter(|r| r.calendar_date().is_some_and(|d| d < today))
        .count();

    let kept: Vec<MeetingRecord> = dated
        .into_iter()
        .filter(|r| r.calendar_date().is_some_and(|d| d >= today))
        .sorted_by_key(|r| r.calendar_date())
        .chain(undated)
        .cloned()
        .collect();

    debug!(kept = kept.len(), past, "Applied upcoming filter");
    kept
}
