//! # Civic Watch
//!
//! Monitors a municipal legislative calendar (city council, zoning, historic
//! preservation meetings) and reports the upcoming meetings that matter for a
//! chosen neighborhood focus.
//!
//! ## Features
//!
//! - Reads the calendar from one of three upstream shapes: the HTML calendar
//!   page, the events (OData) API, or the RSS feed
//! - Normalizes every shape into one meeting schema
//! - Drops past meetings and orders the rest by date
//! - Tags meetings by neighborhood keywords and filters by focus scope
//! - Renders a highlighted Markdown table or JSON
//! - Optional watch mode with a freshness-gated cache, and ntfy test alerts
//!
//! ## Usage
//!
//! ```sh
//! civic_watch --scope local
//! civic_watch --source-kind odata --format json -o upcoming.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: One HTTP request to the configured source
//! 2. **Extraction**: Pull raw records out of the payload for its kind
//! 3. **Normalization**: Map raw fields onto `MeetingRecord`
//! 4. **Filtering**: Upcoming only, keyword tagging, scope
//! 5. **Output**: Markdown or JSON to stdout or a file

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod classify;
mod cli;
mod config;
mod fetch;
mod models;
mod normalize;
mod notify;
mod outputs;
mod pipeline;
mod scope;
mod scrapers;
mod temporal;
#[cfg(test)]
mod test_support;
mod utils;

use cli::Cli;
use config::WatchConfig;
use pipeline::Pipeline;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("civic_watch starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match WatchConfig::resolve(&args).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration is invalid");
            return Err(e.into());
        }
    };
    info!(
        kind = %config.source.kind,
        url = %config.source.effective_url(),
        scope = %config.scope,
        ttl_secs = config.ttl_secs,
        local_keywords = config.keywords.local().len(),
        broad_keywords = config.keywords.broad().len(),
        "Configuration resolved"
    );

    // ---- Test alert ----
    if args.test_alert {
        let client = reqwest::Client::new();
        let sent = notify::send_alert(
            &client,
            &config.ntfy.base_url,
            &config.ntfy.topic,
            notify::TEST_MESSAGE,
        )
        .await;
        if sent {
            info!(topic = %config.ntfy.topic, "Ping sent");
            return Ok(());
        }
        error!(topic = %config.ntfy.topic, "Connection failed");
        return Err("test alert was not delivered".into());
    }

    let mut pipeline = Pipeline::new(&config)?;

    if args.watch {
        watch(&mut pipeline, &config, &args).await?;
    } else {
        let report = pipeline.run().await;
        let rendered = outputs::render(&report, args.format, &config.fallback_links)?;
        outputs::write_output(&rendered, args.output.as_deref()).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Re-render every `interval_secs` until Ctrl-C. Fetches only when the cache expires.
#[instrument(level = "info", skip_all, fields(interval_secs = args.interval_secs))]
async fn watch(
    pipeline: &mut Pipeline,
    config: &WatchConfig,
    args: &Cli,
) -> Result<(), Box<dyn Error>> {
    let interval = Duration::from_secs(args.interval_secs.max(1));
    if interval > config.ttl() && config.ttl_secs > 0 {
        warn!(?interval, ttl = ?config.ttl(), "Render interval is longer than the cache TTL");
    }
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = pipeline.run().await;
                let rendered = outputs::render(&report, args.format, &config.fallback_links)?;
                if let Err(e) = outputs::write_output(&rendered, args.output.as_deref()).await {
                    error!(error = %e, "Failed to write report; will retry next tick");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; stopping watch");
                return Ok(());
            }
        }
    }
}
