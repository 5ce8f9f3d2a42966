//! Upstream session-provider proxy client.
//!
//! Logged sessions originate from an external co-working provider. The API
//! proxies that provider's session listing so the browser never handles
//! the API key: the key comes from config or environment, date-range
//! parameters pass through, and upstream failures are surfaced with their
//! original status rather than masked.

use serde_json::Value;
use thiserror::Error;

/// Default upstream session provider.
pub const DEFAULT_SESSIONS_API_URL: &str = "https://api.focusmate.com";

/// User-Agent header sent to the provider
const USER_AGENT: &str = "weekbank-cli";

/// Proxy settings resolved from config and environment.
#[derive(Debug, Clone)]
pub struct SessionsProxyConfig {
    /// Base URL of the provider API
    pub api_url: String,
    /// Bearer key; the proxy refuses to run without one
    pub api_key: Option<String>,
}

impl Default for SessionsProxyConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SESSIONS_API_URL.to_string(),
            api_key: None,
        }
    }
}

/// Errors from the session-provider proxy.
#[derive(Debug, Error)]
pub enum SessionsProxyError {
    /// Upstream answered with a non-success status; passed through to the
    /// caller with its details
    #[error("session provider returned {status}")]
    Upstream { status: u16, details: String },

    /// Network or other HTTP error
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response
    #[error("failed to parse session provider response: {0}")]
    Parse(String),
}

/// Fetch the sessions between two dates from the upstream provider.
pub fn fetch_sessions(
    api_url: &str,
    api_key: &str,
    start: &str,
    end: &str,
) -> Result<Value, SessionsProxyError> {
    let url = format!("{}/sessions", api_url.trim_end_matches('/'));

    let response = ureq::get(&url)
        .query("start", start)
        .query("end", end)
        .set("Authorization", &format!("Bearer {}", api_key))
        .set("Content-Type", "application/json")
        .set("User-Agent", USER_AGENT)
        .call();

    match response {
        Ok(resp) => resp
            .into_json()
            .map_err(|e| SessionsProxyError::Parse(e.to_string())),
        Err(ureq::Error::Status(status, resp)) => Err(SessionsProxyError::Upstream {
            status,
            details: resp.into_string().unwrap_or_default(),
        }),
        Err(e) => Err(SessionsProxyError::Http(e.to_string())),
    }
}
