//! Renderers for a pipeline [`Report`].
//!
//! # Submodules
//!
//! - [`markdown`]: A highlighted Markdown table with status banner and fallback links
//! - [`json`]: The report serialized for other programs
//!
//! Rendered text goes to stdout or replaces the file given with `--output`.

pub mod json;
pub mod markdown;

use clap::ValueEnum;
use std::error::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use crate::config::FallbackLink;
use crate::models::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

/// Render `report` in `format`.
pub fn render(
    report: &Report,
    format: OutputFormat,
    fallback_links: &[FallbackLink],
) -> Result<String, Box<dyn Error>> {
    match format {
        OutputFormat::Markdown => Ok(markdown::report_to_markdown(report, fallback_links)),
        OutputFormat::Json => Ok(json::report_to_json(report)?),
    }
}

/// Write rendered output to `path`, or to stdout when `path` is `None`.
#[instrument(level = "info", skip_all, fields(path = ?path))]
pub async fn write_output(rendered: &str, path: Option<&str>) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => {
            fs::write(path, rendered).await?;
            info!(bytes = rendered.len(), "Wrote report");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await?;
            if !rendered.ends_with('\n') {
                stdout.write_all(b"\n").await?;
            }
            stdout.flush().await?;
        }
    }
    Ok(())
}
