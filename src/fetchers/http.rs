//! Plain HTTP loader built on `reqwest`.
//!
//! A client is built per attempt because the proxy is a client-level setting
//! in `reqwest` and every attempt may use a different one.

use super::{FetchMethod, FetchedPage, Identity, PageLoader};
use crate::error::FetchError;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Proxy, redirect};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,application/rss+xml;q=0.8,*/*;q=0.7";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";
const MAX_REDIRECTS: usize = 10;

/// Fetches pages with a lightweight HTTP client.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    timeout: Duration,
}

impl HttpLoader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client_for(&self, url: &Url, identity: &Identity) -> Result<Client, FetchError> {
        let mut builder = Client::builder()
            .user_agent(identity.user_agent.as_str())
            .timeout(self.timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS));

        builder = match &identity.proxy {
            Some(proxy) => builder.proxy(Proxy::all(proxy.as_str()).map_err(|e| {
                FetchError::Proxy {
                    proxy: proxy.clone(),
                    message: e.to_string(),
                }
            })?),
            None => builder.no_proxy(),
        };

        builder.build().map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl PageLoader for HttpLoader {
    #[instrument(level = "debug", skip_all, fields(%url, proxy = identity.proxy.as_deref().unwrap_or("direct")))]
    async fn load(&self, url: &Url, identity: &Identity) -> Result<FetchedPage, FetchError> {
        let t0 = Instant::now();
        let client = self.client_for(url, identity)?;

        let response = client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_EN)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| transport_error(url, e))?;

        let elapsed = t0.elapsed();
        debug!(status, bytes = body.len(), elapsed_ms = elapsed.as_millis() as u64, "HTTP response");

        Ok(FetchedPage {
            url: url.clone(),
            final_url,
            status,
            body,
            method: FetchMethod::Http,
            elapsed,
        })
    }
}

fn transport_error(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
