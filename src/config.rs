//! Runtime configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults, an
//! optional YAML file, and command-line flags. The result is validated once and
//! then only read.
//!
//! # Example file
//!
//! ```yaml
//! scope: society_hill_local
//! ttl_secs: 1800
//! source:
//!   kind: odata
//!   timeout_secs: 10
//!   api_top: 50
//! keywords:
//!   local: ["Society Hill", "Old City"]
//!   broad: ["Center City"]
//! ntfy:
//!   topic: art_civic_philly
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

use crate::classify::KeywordSets;
use crate::cli::Cli;
use crate::fetch::SourceDescriptor;
use crate::models::SourceKind;
use crate::scope::Scope;
use crate::scrapers::odata;

pub const DEFAULT_TTL_SECS: u64 = 3600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_NTFY_BASE_URL: &str = "https://ntfy.sh";
pub const DEFAULT_NTFY_TOPIC: &str = "art_civic_philly";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Public endpoint for each source kind when no URL is configured.
pub fn default_url(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::HtmlTable => "https://phila.legistar.com/Calendar.aspx",
        SourceKind::Odata => "https://webapi.legistar.com/v1/phila/events",
        SourceKind::Rss => "https://phila.legistar.com/Feed.ashx?M=Calendar&Mode=All",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Falls back to [`default_url`] for `kind` when unset.
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub relaxed_tls: bool,
    /// Extra query parameters sent with every request.
    pub query: BTreeMap<String, String>,
    /// Result cap for the events API.
    pub api_top: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::HtmlTable,
            url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            relaxed_tls: false,
            query: BTreeMap::new(),
            api_top: odata::DEFAULT_TOP,
        }
    }
}

impl SourceConfig {
    pub fn effective_url(&self) -> &str {
        self.url.as_deref().unwrap_or_else(|| default_url(self.kind))
    }
}

/// A link the renderer offers when live data is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackLink {
    pub label: String,
    pub url: String,
}

impl FallbackLink {
    fn new(label: &str, url: &str) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
        }
    }
}

fn default_fallback_links() -> Vec<FallbackLink> {
    vec![
        FallbackLink::new("City Council calendar", "https://phila.legistar.com/Calendar.aspx"),
        FallbackLink::new("Zoning lookup (Atlas)", "https://atlas.phila.gov/"),
        FallbackLink::new("ZBA calendar", "https://li.phila.gov/zba-appeals-calendar"),
        FallbackLink::new(
            "Historical Commission agenda",
            "https://www.phila.gov/departments/philadelphia-historical-commission/public-meetings/",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NtfyConfig {
    pub base_url: String,
    pub topic: String,
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NTFY_BASE_URL.to_string(),
            topic: DEFAULT_NTFY_TOPIC.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub source: SourceConfig,
    pub ttl_secs: u64,
    pub scope: Scope,
    pub keywords: KeywordSets,
    pub fallback_links: Vec<FallbackLink>,
    pub ntfy: NtfyConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            ttl_secs: DEFAULT_TTL_SECS,
            scope: Scope::default(),
            keywords: KeywordSets::default(),
            fallback_links: default_fallback_links(),
            ntfy: NtfyConfig::default(),
        }
    }
}

impl WatchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a YAML config file.
    #[instrument(level = "info", skip_all)]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Resolve the full configuration for a command line: file (if any), then flags.
    pub async fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path).await?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Overlay command-line flags.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(kind) = cli.source_kind {
            if kind != self.source.kind && cli.url.is_none() {
                self.source.url = None;
            }
            self.source.kind = kind;
        }
        if let Some(url) = &cli.url {
            self.source.url = Some(url.clone());
        }
        if let Some(timeout) = cli.timeout_secs {
            self.source.timeout_secs = timeout;
        }
        if cli.insecure_tls {
            self.source.relaxed_tls = true;
        }
        if let Some(ttl) = cli.ttl_secs {
            self.ttl_secs = ttl;
        }
        if let Some(scope) = cli.scope {
            self.scope = scope;
        }
        if let Some(topic) = &cli.ntfy_topic {
            self.ntfy.topic = topic.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.source.effective_url();
        if url.trim().is_empty() {
            return Err(ConfigError::Invalid("source URL is empty".to_string()));
        }
        Url::parse(url)
            .map_err(|e| ConfigError::Invalid(format!("source URL {url:?} is not valid: {e}")))?;
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// The fetcher's view of the configured source.
    pub fn descriptor(&self) -> Result<SourceDescriptor, ConfigError> {
        let url = self.source.effective_url();
        let url = Url::parse(url)
            .map_err(|e| ConfigError::Invalid(format!("source URL {url:?} is not valid: {e}")))?;
        Ok(SourceDescriptor {
            kind: self.source.kind,
            url,
            timeout: Duration::from_secs(self.source.timeout_secs),
            query: self
                .source
                .query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            relaxed_tls: self.source.relaxed_tls,
        })
    }
}
