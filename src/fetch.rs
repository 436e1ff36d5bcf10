//! HTTP fetcher for one upstream calendar source.
//!
//! A [`Fetcher`] owns a `reqwest` client configured for a single
//! [`SourceDescriptor`]: browser-like headers, an `Accept` header matching the
//! source kind, a hard timeout, and (only when the source asks for it) relaxed
//! TLS verification for legacy certificates.
//!
//! The fetcher makes exactly one request per call and never retries; the
//! refresh cadence of the caller is the retry policy.

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::models::{SourceKind, SourceStatus};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Everything needed to reach one upstream source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    pub url: Url,
    pub timeout: Duration,
    /// Extra query parameters appended to every request.
    pub query: Vec<(String, String)>,
    /// Accept invalid or legacy certificates for this source only.
    pub relaxed_tls: bool,
}

/// Why a fetch produced no body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream returned HTTP {status}")]
    Blocked { status: StatusCode },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// The [`SourceStatus`] this error is reported as.
    pub fn status(&self) -> SourceStatus {
        match self {
            FetchError::Blocked { .. } => SourceStatus::Blocked,
            FetchError::Timeout(_) | FetchError::Connection(_) | FetchError::Client(_) => {
                SourceStatus::ConnectionError
            }
        }
    }
}

fn accept_for(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::HtmlTable => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        SourceKind::Odata => "application/json",
        SourceKind::Rss => "application/rss+xml,application/xml;q=0.9,text/xml;q=0.8",
    }
}

/// One configured HTTP client bound to one source.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    descriptor: SourceDescriptor,
}

impl Fetcher {
    pub fn new(descriptor: SourceDescriptor) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept_for(descriptor.kind)));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        if descriptor.relaxed_tls {
            warn!(url = %descriptor.url, "TLS certificate verification disabled for this source");
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(descriptor.timeout)
            .danger_accept_invalid_certs(descriptor.relaxed_tls)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, descriptor })
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    /// The request URL with configured and `extra` query parameters applied.
    pub fn request_url(&self, extra: &[(String, String)]) -> Url {
        let mut url = self.descriptor.url.clone();
        if !self.descriptor.query.is_empty() || !extra.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.descriptor.query.iter().chain(extra));
        }
        url
    }

    /// Perform one GET and return the body bytes.
    #[instrument(
        level = "info",
        skip_all,
        fields(kind = %self.descriptor.kind, url = %self.descriptor.url)
    )]
    pub async fn fetch(&self, extra: &[(String, String)]) -> Result<Vec<u8>, FetchError> {
        let url = self.request_url(extra);
        let t0 = Instant::now();
        debug!(%url, "Sending request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                %status,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Upstream refused request"
            );
            return Err(FetchError::Blocked { status });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        info!(
            %status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched source"
        );
        Ok(body.to_vec())
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            warn!(timeout = ?self.descriptor.timeout, "Request timed out");
            FetchError::Timeout(self.descriptor.timeout)
        } else {
            warn!(error = %e, "Request failed");
            FetchError::Connection(e)
        }
    }
}
