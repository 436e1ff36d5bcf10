//! The acquisition pipeline.
//!
//! ```text
//! fetch → extract → normalize ──(cached for the TTL)──▶ upcoming → classify → scope
//! ```
//!
//! Every stage that can fail is converted into a [`SourceResult`] status at
//! its boundary, so [`Pipeline::run`] always returns a [`Report`] and never
//! an error. The freshness cache sits after normalization: within the TTL a
//! run reuses the previous records and only re-applies the date boundary,
//! classification and scope.

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::cache::FreshnessCache;
use crate::classify::{KeywordSets, tag_all};
use crate::config::{ConfigError, WatchConfig};
use crate::fetch::Fetcher;
use crate::models::{Report, SourceKind, SourceResult, SourceStatus, TaggedMeeting};
use crate::normalize::normalize_all;
use crate::scope::Scope;
use crate::scrapers::{self, odata};
use crate::temporal::upcoming;

#[derive(Debug)]
pub struct Pipeline {
    fetcher: Fetcher,
    keywords: KeywordSets,
    scope: Scope,
    api_top: u32,
    cache: FreshnessCache<SourceResult>,
}

impl Pipeline {
    pub fn new(config: &WatchConfig) -> Result<Self, ConfigError> {
        let descriptor = config.descriptor()?;
        let fetcher = Fetcher::new(descriptor)
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {e}")))?;
        Ok(Self {
            fetcher,
            keywords: config.keywords.clone(),
            scope: config.scope,
            api_top: config.source.api_top,
            cache: FreshnessCache::new(config.ttl()),
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.fetcher.descriptor().kind
    }

    /// One uncached fetch + extract + normalize. Never fails; failures become statuses.
    #[instrument(level = "info", skip_all, fields(kind = %self.kind(), %today))]
    pub async fn acquire(&self, today: NaiveDate) -> SourceResult {
        let kind = self.kind();
        let extra = match kind {
            SourceKind::Odata => odata::query_params(today, self.api_top),
            SourceKind::HtmlTable | SourceKind::Rss => Vec::new(),
        };

        let body = match self.fetcher.fetch(&extra).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, status = %e.status(), "Fetch failed");
                return SourceResult::failed(e.status(), e.to_string());
            }
        };

        let raws = match scrapers::extract(kind, &body, &self.fetcher.descriptor().url) {
            Ok(raws) => raws,
            Err(e) => {
                warn!(error = %e, "Payload could not be parsed");
                return SourceResult::failed(SourceStatus::Malformed, e.to_string());
            }
        };

        let result = SourceResult::from_records(normalize_all(kind, &raws), kind);
        info!(status = %result.status, count = result.records.len(), "Acquired meetings");
        result
    }

    /// The cached result while fresh, otherwise exactly one new acquisition.
    pub async fn source_result(&mut self, today: NaiveDate, now: Instant) -> Arc<SourceResult> {
        if let Some(result) = self.cache.get(now) {
            info!(age = ?self.cache.age(now), "Reusing cached source result");
            return result;
        }
        let result = self.acquire(today).await;
        self.cache.store(result, now)
    }

    /// Run against the process clock.
    pub async fn run(&mut self) -> Report {
        self.run_at(Local::now().date_naive(), Instant::now()).await
    }

    /// Run with an explicit date boundary and cache clock.
    pub async fn run_at(&mut self, today: NaiveDate, now: Instant) -> Report {
        let result = self.source_result(today, now).await;
        let meetings = assemble(&result, today, &self.keywords, self.scope);
        info!(
            scope = %self.scope,
            status = %result.status,
            shown = meetings.len(),
            "Pipeline run complete"
        );
        Report {
            scope: self.scope,
            status: result.status,
            diagnostic: result.diagnostic.clone(),
            generated_at: Local::now(),
            meetings,
        }
    }
}

/// Date boundary, classification and scope over an acquired result.
///
/// Pure: `result` is only read, so a cached result can be assembled again
/// on every render.
///
/// # Arguments
///
/// * `result` - The normalized records of one acquisition
/// * `today` - Meetings dated before this day are dropped
/// * `keywords` - Local and broad keyword sets for tagging
/// * `scope` - Which relevance tags to keep
///
/// # Returns
///
/// The upcoming meetings admitted by `scope`, dated ones first in date order.
pub fn assemble(
    result: &SourceResult,
    today: NaiveDate,
    keywords: &KeywordSets,
    scope: Scope,
) -> Vec<TaggedMeeting> {
    let upcoming = upcoming(&result.records, today);
    scope.apply(tag_all(&upcoming, keywords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelevanceTag;
    use crate::test_support::spawn_server;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn config_for(kind: SourceKind, url: &url::Url, scope: Scope) -> WatchConfig {
        let mut config = WatchConfig::default();
        config.source.kind = kind;
        config.source.url = Some(url.to_string());
        config.source.timeout_secs = 5;
        config.scope = scope;
        config
    }

    fn pipeline_for(kind: SourceKind, url: &url::Url, scope: Scope) -> Pipeline {
        Pipeline::new(&config_for(kind, url, scope)).unwrap()
    }

    const FEED: &str = r#"<rss version="2.0"><channel>
        <item><title>Committee on Parks - 1/20/2026 - 10:00 AM</title><link>https://example.org/1</link></item>
        <item><title>Society Hill Civic Association - 1/10/2026 - 7:00 PM</title><link>https://example.org/2</link></item>
        <item><title>Old City Zoning Hearing - 2/2/2026 - 9:00 AM</title><link>https://example.org/3</link></item>
        <item><title>Special Session</title></item>
        <item><title>Rittenhouse Square Improvements - 1/16/2026</title><link>https://example.org/5</link></item>
    </channel></rss>"#;

    const PAGE: &str = r#"<html><body>
        <table><tr><td>Home</td><td>Calendar</td></tr></table>
        <table>
          <tr><th>Name</th><th>Meeting Date</th><th>Meeting Time</th><th>Meeting Location</th><th>Meeting Details</th></tr>
          <tr><td>City Council</td><td>1/22/2026</td><td>10:00 AM</td><td>Room 400, City Hall</td><td><a href="MeetingDetail.aspx?ID=1">details</a></td></tr>
          <tr><td>Committee on Finance</td><td>1/02/2026</td><td>1:00 PM</td><td>Room 400</td><td><a href="MeetingDetail.aspx?ID=2">details</a></td></tr>
        </table>
    </body></html>"#;

    #[tokio::test]
    async fn test_forbidden_upstream_yields_blocked_report() {
        let (url, _) = spawn_server(403, "text/html", "denied", Duration::ZERO).await;
        let mut pipeline = pipeline_for(SourceKind::HtmlTable, &url, Scope::AllActivity);

        let report = pipeline.run_at(today(), Instant::now()).await;
        assert_eq!(report.status, SourceStatus::Blocked);
        assert!(report.meetings.is_empty());
        assert!(report.diagnostic.contains("403"));
    }

    #[tokio::test]
    async fn test_feed_end_to_end_all_activity() {
        let (url, _) = spawn_server(200, "application/rss+xml", FEED, Duration::ZERO).await;
        let mut pipeline = pipeline_for(SourceKind::Rss, &url, Scope::AllActivity);

        let report = pipeline.run_at(today(), Instant::now()).await;
        assert_eq!(report.status, SourceStatus::Ok);

        let rows: Vec<(&str, RelevanceTag)> = report
            .meetings
            .iter()
            .map(|m| (m.record.body_name(), m.relevance))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Rittenhouse Square Improvements", RelevanceTag::Broad),
                ("Committee on Parks", RelevanceTag::None),
                ("Old City Zoning Hearing", RelevanceTag::Local),
                ("Special Session", RelevanceTag::None),
            ]
        );
    }

    #[tokio::test]
    async fn test_feed_end_to_end_local_scope() {
        let (url, _) = spawn_server(200, "application/rss+xml", FEED, Duration::ZERO).await;
        let mut pipeline = pipeline_for(SourceKind::Rss, &url, Scope::SocietyHillLocal);

        let report = pipeline.run_at(today(), Instant::now()).await;
        let bodies: Vec<_> = report.meetings.iter().map(|m| m.record.body_name()).collect();
        assert_eq!(bodies, vec!["Old City Zoning Hearing"]);
    }

    #[tokio::test]
    async fn test_html_end_to_end() {
        let (url, _) = spawn_server(200, "text/html", PAGE, Duration::ZERO).await;
        let mut pipeline = pipeline_for(SourceKind::HtmlTable, &url, Scope::CenterCityBroad);

        let report = pipeline.run_at(today(), Instant::now()).await;
        assert_eq!(report.status, SourceStatus::Ok);
        assert_eq!(report.meetings.len(), 1);
        let meeting = &report.meetings[0].record;
        assert_eq!(meeting.body_name(), "City Council");
        assert_eq!(meeting.date(), "2026-01-22");
        assert!(meeting.link().ends_with("/MeetingDetail.aspx?ID=1"));
        assert_eq!(report.meetings[0].relevance, RelevanceTag::Broad);
    }

    #[tokio::test]
    async fn test_odata_error_object_is_malformed() {
        let body = r#"{"Message": "Agency not found"}"#;
        let (url, _) = spawn_server(200, "application/json", body, Duration::ZERO).await;
        let mut pipeline = pipeline_for(SourceKind::Odata, &url, Scope::AllActivity);

        let report = pipeline.run_at(today(), Instant::now()).await;
        assert_eq!(report.status, SourceStatus::Malformed);
        assert!(report.meetings.is_empty());
        assert!(report.diagnostic.contains("Agency not found"));
    }

    #[tokio::test]
    async fn test_odata_empty_list_is_empty() {
        let (url, _) = spawn_server(200, "application/json", "[]", Duration::ZERO).await;
        let mut pipeline = pipeline_for(SourceKind::Odata, &url, Scope::AllActivity);

        let report = pipeline.run_at(today(), Instant::now()).await;
        assert_eq!(report.status, SourceStatus::Empty);
    }

    #[tokio::test]
    async fn test_cache_reuses_result_until_ttl() {
        let (url, hits) = spawn_server(200, "application/rss+xml", FEED, Duration::ZERO).await;
        let mut config = config_for(SourceKind::Rss, &url, Scope::AllActivity);
        config.ttl_secs = 60;
        let mut pipeline = Pipeline::new(&config).unwrap();

        let t0 = Instant::now();
        pipeline.run_at(today(), t0).await;
        pipeline.run_at(today(), t0 + Duration::from_secs(30)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        pipeline.run_at(today(), t0 + Duration::from_secs(61)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_cached_too() {
        let (url, hits) = spawn_server(503, "text/html", "", Duration::ZERO).await;
        let mut pipeline = pipeline_for(SourceKind::HtmlTable, &url, Scope::AllActivity);

        let t0 = Instant::now();
        let first = pipeline.run_at(today(), t0).await;
        let second = pipeline.run_at(today(), t0 + Duration::from_secs(1)).await;
        assert_eq!(first.status, SourceStatus::Blocked);
        assert_eq!(second.status, SourceStatus::Blocked);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_assemble_is_pure() {
        use crate::models::MeetingRecord;
        let result = SourceResult::from_records(
            vec![
                MeetingRecord::new("Pine St paving", "2026-03-01", "", "", "#"),
                MeetingRecord::new("Budget", "2025-01-01", "", "", "#"),
            ],
            SourceKind::Odata,
        );
        let keywords = KeywordSets::default();
        let a = assemble(&result, today(), &keywords, Scope::AllActivity);
        let b = assemble(&result, today(), &keywords, Scope::AllActivity);
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].relevance, RelevanceTag::Local);
    }
}
