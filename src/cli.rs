//! Command-line interface definitions for Civic Watch.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every source/scope option overrides the matching key of the YAML config
//! file, which in turn overrides the built-in defaults.

use clap::Parser;

use crate::models::SourceKind;
use crate::outputs::OutputFormat;
use crate::scope::Scope;

/// Command-line arguments for the Civic Watch application.
///
/// # Examples
///
/// ```sh
/// # Upcoming meetings, all activity, as a Markdown table
/// civic_watch
///
/// # Only Society Hill & Old City, read from the events API, as JSON
/// civic_watch --scope local --source-kind odata --format json
///
/// # Keep refreshing every five minutes, refetching once an hour
/// civic_watch --watch --interval-secs 300 --ttl-secs 3600 -o upcoming.md
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "CIVIC_WATCH_CONFIG")]
    pub config: Option<String>,

    /// Focus scope applied after classification
    #[arg(short, long, value_enum)]
    pub scope: Option<Scope>,

    /// Upstream source kind
    #[arg(short = 'k', long, value_enum)]
    pub source_kind: Option<SourceKind>,

    /// Upstream endpoint URL (defaults to the public calendar for the chosen kind)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Request timeout ceiling in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// How long a fetched result is reused before refetching, in seconds
    #[arg(long)]
    pub ttl_secs: Option<u64>,

    /// Accept invalid TLS certificates from this source
    #[arg(long)]
    pub insecure_tls: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Keep running and re-render every `--interval-secs`
    #[arg(short, long)]
    pub watch: bool,

    /// Seconds between renders in watch mode
    #[arg(long, default_value_t = 300)]
    pub interval_secs: u64,

    /// ntfy.sh topic for alerts
    #[arg(long, env = "NTFY_TOPIC")]
    pub ntfy_topic: Option<String>,

    /// Send a test alert to the ntfy topic and exit
    #[arg(long)]
    pub test_alert: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["civic_watch"]);
        assert!(cli.scope.is_none());
        assert!(cli.source_kind.is_none());
        assert_eq!(cli.format, OutputFormat::Markdown);
        assert_eq!(cli.interval_secs, 300);
        assert!(!cli.watch);
        assert!(!cli.insecure_tls);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "civic_watch",
            "-s",
            "local",
            "-k",
            "rss",
            "-f",
            "json",
            "-o",
            "/tmp/upcoming.json",
        ]);

        assert_eq!(cli.scope, Some(Scope::SocietyHillLocal));
        assert_eq!(cli.source_kind, Some(SourceKind::Rss));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.output.as_deref(), Some("/tmp/upcoming.json"));
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "civic_watch",
            "--scope",
            "center-city-broad",
            "--source-kind",
            "html-table",
            "--url",
            "https://example.org/Calendar.aspx",
            "--timeout-secs",
            "10",
            "--ttl-secs",
            "600",
            "--insecure-tls",
            "--watch",
        ]);

        assert_eq!(cli.scope, Some(Scope::CenterCityBroad));
        assert_eq!(cli.source_kind, Some(SourceKind::HtmlTable));
        assert_eq!(cli.timeout_secs, Some(10));
        assert_eq!(cli.ttl_secs, Some(600));
        assert!(cli.insecure_tls);
        assert!(cli.watch);
    }
}
