//! Turning fetched pages into job postings.
//!
//! | Format | Module | Used for |
//! |--------|--------|----------|
//! | schema.org `JobPosting` JSON-LD | [`json_ld`] | detail pages and many listing pages |
//! | CSS selector profile | [`selectors`] | listing pages without structured data |
//! | RSS 2.0 / Atom | [`feed`] | job feeds |
//!
//! For HTML sources JSON-LD wins when present; the selector profile is only
//! consulted when the page carries no structured postings.

use crate::fetchers::FetchedPage;
use crate::models::JobPosting;
use crate::sources::{SourceConfig, SourceKind};
use chrono::NaiveDate;
use std::error::Error;
use tracing::{debug, info, instrument};

pub mod feed;
pub mod json_ld;
pub mod selectors;

pub use selectors::SelectorProfile;

/// Extract every posting a page carries, according to its source kind.
///
/// `today` anchors relative dates such as "3 days ago".
#[instrument(level = "info", skip_all, fields(source = %source.name, url = %page.final_url))]
pub fn extract_jobs(
    page: &FetchedPage,
    source: &SourceConfig,
    today: NaiveDate,
) -> Result<Vec<JobPosting>, Box<dyn Error>> {
    let jobs = match source.kind {
        SourceKind::Feed => feed::extract_feed(&page.body, &page.final_url, &source.name, today)?,
        SourceKind::Html => {
            let structured = json_ld::extract_json_ld(&page.body, &page.final_url, &source.name, today);
            if !structured.is_empty() {
                debug!(count = structured.len(), "Using JSON-LD postings");
                structured
            } else if let Some(profile) = &source.selectors {
                selectors::extract_with_selectors(
                    &page.body,
                    &page.final_url,
                    profile,
                    &source.name,
                    today,
                )?
            } else {
                debug!("No JSON-LD postings and no selector profile");
                Vec::new()
            }
        }
    };

    info!(count = jobs.len(), "Extracted job postings");
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::FetchMethod;
    use std::time::Duration;
    use url::Url;

    fn page(body: &str) -> FetchedPage {
        let url = Url::parse("https://jobs.example.com/list").unwrap();
        FetchedPage {
            url: url.clone(),
            final_url: url,
            status: 200,
            body: body.to_string(),
            method: FetchMethod::Http,
            elapsed: Duration::ZERO,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    const LISTING: &str = r#"
        <html><body>
          <div class="job"><a class="title" href="/jobs/1">Rust Engineer</a></div>
          <div class="job"><a class="title" href="/jobs/2">Go Engineer</a></div>
        </body></html>"#;

    fn profile() -> SelectorProfile {
        SelectorProfile {
            listing: ".job".into(),
            title: ".title".into(),
            ..SelectorProfile::default()
        }
    }

    #[test]
    fn test_html_prefers_json_ld() {
        let body = format!(
            r#"<script type="application/ld+json">{{"@type":"JobPosting","title":"From JSON-LD"}}</script>{LISTING}"#
        );
        let source = SourceConfig {
            name: "board".into(),
            url: "https://jobs.example.com/list".into(),
            kind: SourceKind::Html,
            selectors: Some(profile()),
        };
        let jobs = extract_jobs(&page(&body), &source, today()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "From JSON-LD");
    }

    #[test]
    fn test_html_falls_back_to_selectors() {
        let source = SourceConfig {
            name: "board".into(),
            url: "https://jobs.example.com/list".into(),
            kind: SourceKind::Html,
            selectors: Some(profile()),
        };
        let jobs = extract_jobs(&page(LISTING), &source, today()).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].url, "https://jobs.example.com/jobs/2");
    }

    #[test]
    fn test_html_without_profile_yields_nothing() {
        let source = SourceConfig::from_url("https://jobs.example.com/list");
        let jobs = extract_jobs(&page(LISTING), &source, today()).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_feed_source() {
        let rss = r#"<?xml version="1.0"?><rss><channel>
            <item><title>Feed Job</title><link>https://jobs.example.com/f/1</link></item>
        </channel></rss>"#;
        let source = SourceConfig::from_url("https://jobs.example.com/jobs.rss");
        let jobs = extract_jobs(&page(rss), &source, today()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Feed Job");
        assert_eq!(jobs[0].source, "jobs.example.com");
    }
}
