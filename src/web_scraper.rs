//! The scraping service: rotation, HTTP-to-browser fallback, and retries.
//!
//! # Architecture
//!
//! ```text
//! WebScraper
//! └── RetryFetch               backoff between attempts
//!     └── RotatingFetcher      one attempt
//!         ├── identity         random user agent + random proxy (or direct)
//!         ├── HttpLoader       tried first
//!         └── BrowserLoader    only if HTTP failed, was blocked, or got a JS shell
//! ```
//!
//! Each attempt draws a new identity, so a retry after a 403 comes from a
//! different proxy with a different user agent. Within one attempt the
//! browser reuses the identity the HTTP request was refused with.
//!
//! The scraper hands back raw pages; it does not dedupe URLs, coordinate
//! rate limits across requests, or extract content.

use crate::config::ScraperConfig;
use crate::error::{FetchError, is_blocking_status};
use crate::fetchers::{BrowserLoader, FetchedPage, HttpLoader, Identity, PageLoader};
use crate::retry::{Fetcher, RetryFetch, RetryPolicy};
use crate::rotation::{ProxyPool, UserAgentPool};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Phrases served by JS-only app shells and bot-check interstitials.
static GATE_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(please enable javascript|you need to enable javascript|enable javascript to run this app|just a moment\.\.\.|cf-browser-verification|checking your browser before accessing|verify you are human|captcha-delivery)",
    )
    .unwrap()
});

/// Whether a successful response is an app shell or interstitial rather
/// than the page itself. XML feeds are exempt from the length check.
pub fn is_gated(body: &str, min_body_len: usize) -> bool {
    let trimmed = body.trim_start();
    let is_xml = ["<?xml", "<rss", "<feed"].iter().any(|p| trimmed.starts_with(p));
    (!is_xml && trimmed.trim_end().len() < min_body_len) || GATE_MARKERS.is_match(body)
}

/// Check a loaded page; `Ok` means it can be handed to the caller.
fn accept(page: &FetchedPage, min_body_len: usize) -> Result<(), FetchError> {
    if !page.is_success() {
        return Err(FetchError::Status {
            url: page.url.to_string(),
            status: page.status,
        });
    }
    if is_gated(&page.body, min_body_len) {
        return Err(FetchError::Gated {
            url: page.url.to_string(),
        });
    }
    Ok(())
}

/// A single attempt with a fresh identity and browser fallback.
pub struct RotatingFetcher<H, B> {
    user_agents: UserAgentPool,
    proxies: ProxyPool,
    http: H,
    browser: Option<B>,
    min_body_len: usize,
}

impl<H, B> RotatingFetcher<H, B>
where
    H: PageLoader,
    B: PageLoader,
{
    pub fn new(
        user_agents: UserAgentPool,
        proxies: ProxyPool,
        http: H,
        browser: Option<B>,
        min_body_len: usize,
    ) -> Self {
        Self {
            user_agents,
            proxies,
            http,
            browser,
            min_body_len,
        }
    }

    fn draw_identity(&self) -> Identity {
        Identity {
            user_agent: self.user_agents.pick().to_string(),
            proxy: self.proxies.pick().map(str::to_string),
        }
    }
}

impl<H, B> Fetcher for RotatingFetcher<H, B>
where
    H: PageLoader,
    B: PageLoader,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let identity = self.draw_identity();

        let http_failure = match self.http.load(url, &identity).await {
            Ok(page) => match accept(&page, self.min_body_len) {
                Ok(()) => return Ok(page),
                Err(e) => e,
            },
            Err(e) => e,
        };

        // A 404 or a malformed URL will not render any better in Chromium.
        if !http_failure.is_retryable() {
            return Err(http_failure);
        }

        let Some(browser) = &self.browser else {
            return Err(http_failure);
        };

        let blocked = matches!(http_failure, FetchError::Status { status, .. } if is_blocking_status(status));
        info!(
            reason = %http_failure,
            blocked,
            proxy = identity.proxy.as_deref().unwrap_or("direct"),
            "HTTP fetch unusable; falling back to headless browser"
        );

        let page = browser.load(url, &identity).await?;
        accept(&page, self.min_body_len)?;
        Ok(page)
    }
}

/// Fetches pages with rotation, browser fallback, and retry-with-backoff.
pub struct WebScraper<F = RotatingFetcher<HttpLoader, BrowserLoader>> {
    inner: RetryFetch<F>,
}

impl WebScraper {
    /// Build the production scraper from configuration.
    ///
    /// Fetches the remote proxy list when one is configured; a failure there
    /// is logged and the static proxies are used alone. A browser that cannot
    /// be provided (feature off) leaves the scraper HTTP-only.
    #[instrument(level = "info", skip_all)]
    pub async fn from_config(config: &ScraperConfig) -> Result<Self, Box<dyn Error>> {
        let user_agents = UserAgentPool::new(config.user_agents.clone());
        let mut proxies = ProxyPool::new(&config.proxies);

        if let Some(list_url) = &config.proxy_list_url {
            let client = Client::builder().timeout(config.request_timeout()).build()?;
            match ProxyPool::fetch(&client, list_url).await {
                Ok(fetched) => proxies.extend(fetched),
                Err(e) => warn!(%list_url, error = %e, "Could not fetch proxy list; using static proxies only"),
            }
        }

        if proxies.is_empty() {
            debug!("No proxies configured; connecting directly");
        }

        let browser = if config.browser.enabled {
            match BrowserLoader::new(&config.browser) {
                Ok(loader) => Some(loader),
                Err(e) => {
                    warn!(error = %e, "Headless browser fallback disabled");
                    None
                }
            }
        } else {
            None
        };

        info!(
            user_agents = user_agents.len(),
            proxies = proxies.len(),
            browser = browser.is_some(),
            max_retries = config.max_retries,
            "WebScraper ready"
        );

        let fetcher = RotatingFetcher::new(
            user_agents,
            proxies,
            HttpLoader::new(config.request_timeout()),
            browser,
            config.min_body_len,
        );
        Ok(WebScraper::new(fetcher, config.retry_policy()))
    }
}

impl<F> WebScraper<F>
where
    F: Fetcher,
{
    pub fn new(fetcher: F, policy: RetryPolicy) -> Self {
        Self {
            inner: RetryFetch::new(fetcher, policy),
        }
    }

    /// Fetch one URL. Only `http` and `https` URLs are accepted.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url} ({e})")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "{url} (unsupported scheme {})",
                parsed.scheme()
            )));
        }

        let t0 = Instant::now();
        let result = self.inner.fetch(&parsed).await;
        match &result {
            Ok(page) => info!(
                status = page.status,
                method = ?page.method,
                bytes = page.body.len(),
                elapsed_ms_total = t0.elapsed().as_millis() as u64,
                "Scraped page"
            ),
            Err(e) => warn!(
                elapsed_ms_total = t0.elapsed().as_millis() as u64,
                error = %e,
                "Scrape failed"
            ),
        }
        result
    }

    /// Fetch many URLs, at most `concurrency` at a time.
    ///
    /// One result per input URL, in completion order. A failing URL never
    /// aborts the batch.
    #[instrument(level = "info", skip_all, fields(count = urls.len(), concurrency = concurrency))]
    pub async fn scrape_all(
        &self,
        urls: Vec<String>,
        concurrency: usize,
    ) -> Vec<(String, Result<FetchedPage, FetchError>)> {
        let results: Vec<(String, Result<FetchedPage, FetchError>)> = stream::iter(urls)
            .map(|url| async move {
                let result = self.scrape(&url).await;
                (url, result)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let ok = results.iter().filter(|(_, r)| r.is_ok()).count();
        debug!(ok, failed = results.len() - ok, "Batch scrape finished");
        results
    }
}
