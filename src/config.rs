//! Scraper configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working HTTP-only scraper with rotated user agents and no proxies.
//!
//! ```yaml
//! max_retries: 4
//! base_delay_ms: 500
//! proxies:
//!   - 203.0.113.7:8080
//! proxy_list_url: https://example.com/proxies.txt
//! browser:
//!   enabled: true
//!   timeout_secs: 45
//! sources:
//!   - name: remote-rust
//!     url: https://jobs.example.com/search?q={query}&l={location}
//!     selectors:
//!       listing: ".job-card"
//!       title: ".job-card__title a"
//!       company: ".job-card__company"
//!   - name: example-feed
//!     url: https://jobs.example.com/feed.xml
//!     kind: feed
//! ```

use crate::retry::RetryPolicy;
use crate::sources::SourceConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level configuration for a scrape run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// User agents to rotate through. Empty uses the built-in list.
    pub user_agents: Vec<String>,
    /// Static proxies, `host:port` or `scheme://host:port`.
    pub proxies: Vec<String>,
    /// Optional plain-text proxy list merged into `proxies` at startup.
    pub proxy_list_url: Option<String>,
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
    /// Per-request timeout for the HTTP loader.
    pub timeout_secs: u64,
    /// Bodies shorter than this are treated as JS shells and re-rendered.
    pub min_body_len: usize,
    /// Sources scraped at once.
    pub concurrency: usize,
    pub browser: BrowserSettings,
    pub sources: Vec<SourceConfig>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agents: Vec::new(),
            proxies: Vec::new(),
            proxy_list_url: None,
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter_ms: 250,
            timeout_secs: 30,
            min_body_len: 512,
            concurrency: 4,
            browser: BrowserSettings::default(),
            sources: Vec::new(),
        }
    }
}

/// Headless browser fallback settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub enabled: bool,
    /// Chromium binary; auto-detected when unset.
    pub executable: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            executable: None,
            timeout_secs: 45,
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a YAML file.
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&raw)?;
        info!(
            sources = config.sources.len(),
            proxies = config.proxies.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: Duration::from_millis(self.jitter_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
