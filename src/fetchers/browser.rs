//! Headless browser loader built on `chromiumoxide`.
//!
//! Only compiled in with the `browser` feature. Without it,
//! [`BrowserLoader::new`] reports [`FetchError::BrowserUnavailable`] and the
//! scraper runs HTTP-only, so callers never need `#[cfg]` of their own.
//!
//! Chromium takes its proxy and user agent as launch arguments, so each
//! attempt launches and tears down its own browser process.

use super::{FetchedPage, Identity, PageLoader};
use crate::config::BrowserSettings;
use crate::error::FetchError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Renders pages in a headless Chromium.
#[derive(Debug, Clone)]
pub struct BrowserLoader {
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    timeout: Duration,
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    executable: Option<PathBuf>,
}

impl BrowserLoader {
    #[cfg(feature = "browser")]
    pub fn new(settings: &BrowserSettings) -> Result<Self, FetchError> {
        Ok(Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            executable: settings.executable.clone(),
        })
    }

    #[cfg(not(feature = "browser"))]
    pub fn new(_settings: &BrowserSettings) -> Result<Self, FetchError> {
        Err(FetchError::BrowserUnavailable)
    }
}

#[cfg(not(feature = "browser"))]
impl PageLoader for BrowserLoader {
    async fn load(&self, _url: &Url, _identity: &Identity) -> Result<FetchedPage, FetchError> {
        Err(FetchError::BrowserUnavailable)
    }
}

#[cfg(feature = "browser")]
mod chromium {
    use super::*;
    use crate::fetchers::FetchMethod;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use std::time::Instant;
    use tracing::{debug, instrument, warn};

    impl BrowserLoader {
        fn config_for(&self, url: &Url, identity: &Identity) -> Result<BrowserConfig, FetchError> {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(self.timeout)
                .arg(format!("--user-agent={}", identity.user_agent));
            if let Some(proxy) = &identity.proxy {
                builder = builder.arg(format!("--proxy-server={proxy}"));
            }
            if let Some(path) = &self.executable {
                builder = builder.chrome_executable(path);
            }
            builder.build().map_err(|message| FetchError::Browser {
                url: url.to_string(),
                message,
            })
        }
    }

    impl PageLoader for BrowserLoader {
        #[instrument(level = "debug", skip_all, fields(%url, proxy = identity.proxy.as_deref().unwrap_or("direct")))]
        async fn load(&self, url: &Url, identity: &Identity) -> Result<FetchedPage, FetchError> {
            let t0 = Instant::now();
            let browser_error = |message: String| FetchError::Browser {
                url: url.to_string(),
                message,
            };

            let config = self.config_for(url, identity)?;
            let (mut browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| browser_error(e.to_string()))?;

            let driver = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let render = async {
                let page = browser.new_page(url.as_str()).await?;
                page.wait_for_navigation().await?;
                let final_url = page.url().await?;
                let html = page.content().await?;
                Ok::<_, chromiumoxide::error::CdpError>((final_url, html))
            };
            let rendered = tokio::time::timeout(self.timeout, render).await;

            if let Err(e) = browser.close().await {
                warn!(error = %e, "Failed to close browser cleanly");
            }
            let _ = browser.wait().await;
            driver.abort();

            let (final_url, body) = match rendered {
                Err(_) => {
                    return Err(FetchError::Timeout {
                        url: url.to_string(),
                    });
                }
                Ok(Err(e)) => return Err(browser_error(e.to_string())),
                Ok(Ok(rendered)) => rendered,
            };

            let final_url = final_url
                .and_then(|u| Url::parse(&u).ok())
                .unwrap_or_else(|| url.clone());
            let elapsed = t0.elapsed();
            debug!(bytes = body.len(), elapsed_ms = elapsed.as_millis() as u64, "Rendered page");

            Ok(FetchedPage {
                url: url.clone(),
                final_url,
                // CDP does not surface the document status through this path.
                status: 200,
                body,
                method: FetchMethod::Browser,
                elapsed,
            })
        }
    }
}
