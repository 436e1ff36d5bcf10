//! Markdown rendering of a [`Report`].
//!
//! Local matches are bold and marked `★`, broad matches are marked `◆`.
//! When the source could not be read, the table is replaced by a warning and
//! the configured fallback links.

use std::fmt::Write;

use crate::config::FallbackLink;
use crate::models::{NO_LINK, RelevanceTag, Report, TaggedMeeting};
use crate::scope::Scope;
use crate::utils::escape_markdown_cell;

pub fn report_to_markdown(report: &Report, fallback_links: &[FallbackLink]) -> String {
    let mut md = String::new();

    writeln!(md, "# Upcoming Meetings\n").unwrap();
    match report.scope {
        Scope::AllActivity => {}
        Scope::SocietyHillLocal => writeln!(
            md,
            "> Focused mode: showing only updates for **{}**.\n",
            report.scope
        )
        .unwrap(),
        Scope::CenterCityBroad => {
            writeln!(md, "> Broad mode: showing updates for **{}**.\n", report.scope).unwrap()
        }
    }
    writeln!(
        md,
        "_Source status: {} ({}). Generated {}._\n",
        report.status,
        escape_markdown_cell(&report.diagnostic),
        report.generated_at.format("%Y-%m-%d %H:%M")
    )
    .unwrap();

    if !report.status.is_success() {
        writeln!(
            md,
            "**Could not pull live data.** The calendar may be down or blocking requests.\n"
        )
        .unwrap();
        if !fallback_links.is_empty() {
            writeln!(md, "## Check directly\n").unwrap();
            for link in fallback_links {
                writeln!(md, "- [{}]({})", link.label, link.url).unwrap();
            }
        }
        return md;
    }

    if report.meetings.is_empty() {
        writeln!(md, "No meetings found for this focus area right now.").unwrap();
        return md;
    }

    writeln!(md, "| | Body | Date | Time | Location | Link |").unwrap();
    writeln!(md, "|---|---|---|---|---|---|").unwrap();
    for meeting in &report.meetings {
        writeln!(md, "{}", table_row(meeting)).unwrap();
    }
    md
}

fn table_row(meeting: &TaggedMeeting) -> String {
    let r = &meeting.record;
    let (marker, strong) = match meeting.relevance {
        RelevanceTag::Local => ("★", true),
        RelevanceTag::Broad => ("◆", false),
        RelevanceTag::None => ("", false),
    };
    let cell = |s: &str| {
        let s = escape_markdown_cell(s);
        if strong && !s.is_empty() {
            format!("**{s}**")
        } else {
            s
        }
    };
    let link = if r.link() == NO_LINK {
        String::new()
    } else {
        format!("[details]({})", r.link())
    };

    format!(
        "| {} | {} | {} | {} | {} | {} |",
        marker,
        cell(r.body_name()),
        cell(r.date()),
        cell(r.time()),
        cell(r.location()),
        link
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MeetingRecord, SourceStatus};
    use chrono::Local;

    fn meeting(body: &str, relevance: RelevanceTag, link: &str) -> TaggedMeeting {
        TaggedMeeting {
            record: MeetingRecord::new(body, "2026-01-20", "10:00 AM", "Room 400", link),
            relevance,
        }
    }

    fn report(status: SourceStatus, scope: Scope, meetings: Vec<TaggedMeeting>) -> Report {
        Report {
            scope,
            status,
            diagnostic: "upstream returned HTTP 403 Forbidden".to_string(),
            generated_at: Local::now(),
            meetings,
        }
    }

    fn links() -> Vec<FallbackLink> {
        vec![FallbackLink {
            label: "ZBA calendar".to_string(),
            url: "https://li.phila.gov/zba-appeals-calendar".to_string(),
        }]
    }

    #[test]
    fn test_blocked_shows_fallback_links() {
        let blocked = report(SourceStatus::Blocked, Scope::AllActivity, vec![]);
        let md = report_to_markdown(&blocked, &links());
        assert!(md.contains("Could not pull live data"));
        assert!(md.contains("403"));
        assert!(md.contains("- [ZBA calendar](https://li.phila.gov/zba-appeals-calendar)"));
        assert!(!md.contains("| Body |"));
    }

    #[test]
    fn test_highlighted_rows() {
        let md = report_to_markdown(
            &report(
                SourceStatus::Ok,
                Scope::AllActivity,
                vec![
                    meeting("Society Hill Civic", RelevanceTag::Local, "https://example.org/1"),
                    meeting("Center City District", RelevanceTag::Broad, "#"),
                    meeting("Parks | Rec", RelevanceTag::None, "#"),
                ],
            ),
            &links(),
        );
        assert!(md.contains("| ★ | **Society Hill Civic** | **2026-01-20** |"));
        assert!(md.contains("[details](https://example.org/1)"));
        assert!(md.contains("| ◆ | Center City District | 2026-01-20 |"));
        assert!(md.contains("Parks \\| Rec"));
        assert!(!md.contains("Check directly"));
    }

    #[test]
    fn test_empty_focus_message_and_banner() {
        let empty = report(SourceStatus::Ok, Scope::SocietyHillLocal, vec![]);
        let md = report_to_markdown(&empty, &links());
        assert!(md.contains("Focused mode"));
        assert!(md.contains("No meetings found for this focus area right now."));
    }
}
