//! Error type for the fetch layer.
//!
//! Everything above the fetch layer returns `Box<dyn Error>`. Fetching needs a
//! concrete type so the retry loop can tell a transient failure (timeout,
//! anti-bot block, 5xx) from one that a new identity will never fix
//! (malformed URL, 404).

use thiserror::Error;

/// Why a single page fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed or uses a scheme we do not fetch.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Connection, TLS, or body read failure.
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    /// The request did not finish within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },
    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// The page came back but is an interstitial (JS wall, bot check).
    #[error("{url} served a javascript or bot-check interstitial")]
    Gated { url: String },
    /// A proxy entry could not be turned into a client proxy.
    #[error("unusable proxy {proxy}: {message}")]
    Proxy { proxy: String, message: String },
    /// The headless browser failed to launch or render.
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    #[error("headless browser failed on {url}: {message}")]
    Browser { url: String, message: String },
    /// Browser rendering was requested but this build cannot provide it.
    #[error("headless browser support was not compiled in (enable the `browser` feature)")]
    BrowserUnavailable,
}

impl FetchError {
    /// Whether another attempt, with a fresh user agent and proxy, may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::InvalidUrl(_) | FetchError::BrowserUnavailable => false,
            FetchError::Status { status, .. } => is_blocking_status(*status) || *status >= 500,
            FetchError::Network { .. }
            | FetchError::Timeout { .. }
            | FetchError::Gated { .. }
            | FetchError::Proxy { .. }
            | FetchError::Browser { .. } => true,
        }
    }
}

/// Statuses anti-bot layers answer with when they refuse a client.
pub fn is_blocking_status(status: u16) -> bool {
    matches!(status, 403 | 429 | 503)
}
