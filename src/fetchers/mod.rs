//! Page loaders: the two ways a single URL can be turned into HTML.
//!
//! | Loader | Module | Cost | Handles |
//! |--------|--------|------|---------|
//! | HTTP | [`http`] | one request | server-rendered pages, feeds |
//! | Headless browser | [`browser`] | one Chromium process | JS-rendered pages, bot walls |
//!
//! Loaders do not classify what they get back. A 403 from the HTTP loader is
//! still `Ok`; deciding whether to fall back or retry belongs to
//! [`crate::web_scraper`].

use crate::error::FetchError;
use serde::Serialize;
use std::time::Duration;
use url::Url;

pub mod browser;
pub mod http;

pub use browser::BrowserLoader;
pub use http::HttpLoader;

/// What one attempt presents to the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    /// `None` means a direct connection.
    pub proxy: Option<String>,
}

/// Which loader produced a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMethod {
    Http,
    Browser,
}

impl FetchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMethod::Http => "http",
            FetchMethod::Browser => "browser",
        }
    }
}

/// A page as returned by a loader.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested.
    pub url: Url,
    /// The URL after redirects.
    pub final_url: Url,
    pub status: u16,
    pub body: String,
    pub method: FetchMethod,
    pub elapsed: Duration,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Turns a URL into a page using the given identity.
pub trait PageLoader {
    async fn load(&self, url: &Url, identity: &Identity) -> Result<FetchedPage, FetchError>;
}
