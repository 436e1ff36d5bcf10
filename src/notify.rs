//! Push alerts through an ntfy server.
//!
//! Alerts are fire-and-forget: any failure is logged and reported as `false`,
//! never as an error.

use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument, warn};

const ALERT_TIMEOUT: Duration = Duration::from_secs(10);

pub const TEST_MESSAGE: &str = "Test: civic_watch is active.";

/// The publish URL for `topic` on `base_url`.
pub fn topic_url(base_url: &str, topic: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(topic.trim())
    )
}

/// POST `message` to `topic`.
///
/// Failures are logged and never propagated.
///
/// # Arguments
///
/// * `client` - HTTP client to send with
/// * `base_url` - The ntfy server, e.g. `https://ntfy.sh`
/// * `topic` - Topic name, URL-encoded into the path
/// * `message` - Plain-text notification body
///
/// # Returns
///
/// `true` when the server answered with a success status.
#[instrument(level = "info", skip(client, message))]
pub async fn send_alert(client: &Client, base_url: &str, topic: &str, message: &str) -> bool {
    if topic.trim().is_empty() {
        warn!("No ntfy topic configured; alert not sent");
        return false;
    }

    let url = topic_url(base_url, topic);
    let result = client
        .post(&url)
        .timeout(ALERT_TIMEOUT)
        .body(message.to_string())
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => {
            info!(%url, "Alert sent");
            true
        }
        Ok(resp) => {
            warn!(%url, status = %resp.status(), "ntfy rejected alert");
            false
        }
        Err(e) => {
            warn!(%url, error = %e, "Alert could not be delivered");
            false
        }
    }
}
