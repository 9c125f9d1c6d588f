//! CSS-selector extraction for listing pages without structured data.
//!
//! A [`SelectorProfile`] names one selector for the repeated listing element
//! and, relative to it, selectors for each field. Only `listing` and `title`
//! are required.
//!
//! # Link resolution
//!
//! 1. `link` selector's `href`, when configured
//! 2. the title element's own `href`
//! 3. the first `a[href]` inside the listing element
//! 4. the page URL with a `#job-{n}` fragment

use super::json_ld::page_anchor;
use crate::models::{JobPosting, JobType, parse_salary};
use crate::utils::{collapse_whitespace, non_empty, parse_posted_date};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::{debug, instrument};
use url::Url;

static ANY_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Selectors describing one site's listing markup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SelectorProfile {
    /// Matches each job card on the page.
    pub listing: String,
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Element whose `datetime` attribute or text holds the posting date.
    #[serde(default)]
    pub posted_at: Option<String>,
}

/// Profile with every selector parsed.
struct Compiled {
    listing: Selector,
    title: Selector,
    link: Option<Selector>,
    company: Option<Selector>,
    location: Option<Selector>,
    salary: Option<Selector>,
    job_type: Option<Selector>,
    description: Option<Selector>,
    posted_at: Option<Selector>,
}

impl SelectorProfile {
    fn compile(&self) -> Result<Compiled, Box<dyn Error>> {
        let optional = |sel: &Option<String>| sel.as_deref().map(parse_selector).transpose();
        Ok(Compiled {
            listing: parse_selector(&self.listing)?,
            title: parse_selector(&self.title)?,
            link: optional(&self.link)?,
            company: optional(&self.company)?,
            location: optional(&self.location)?,
            salary: optional(&self.salary)?,
            job_type: optional(&self.job_type)?,
            description: optional(&self.description)?,
            posted_at: optional(&self.posted_at)?,
        })
    }
}

fn parse_selector(raw: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(raw).map_err(|e| format!("invalid CSS selector {raw:?}: {e:?}").into())
}

/// Extract one posting per `listing` element that has a non-empty title.
///
/// # Errors
///
/// Returns an error if any selector in the profile fails to parse.
#[instrument(level = "debug", skip_all, fields(%page_url, listing = %profile.listing))]
pub fn extract_with_selectors(
    html: &str,
    page_url: &Url,
    profile: &SelectorProfile,
    source: &str,
    today: NaiveDate,
) -> Result<Vec<JobPosting>, Box<dyn Error>> {
    let compiled = profile.compile()?;
    let document = Html::parse_document(html);

    let mut jobs = Vec::new();
    for (index, card) in document.select(&compiled.listing).enumerate() {
        let Some(title_el) = card.select(&compiled.title).next() else {
            continue;
        };
        let Some(title) = non_empty(text(&title_el)) else {
            continue;
        };

        let href = compiled
            .link
            .as_ref()
            .and_then(|sel| card.select(sel).next())
            .and_then(|el| el.value().attr("href"))
            .or_else(|| title_el.value().attr("href"))
            .or_else(|| card.select(&ANY_LINK).next().and_then(|a| a.value().attr("href")));
        let url = href
            .and_then(|h| page_url.join(h).ok())
            .unwrap_or_else(|| page_anchor(page_url, index));

        let mut job = JobPosting::new(title, url.to_string(), source);
        job.company = field(&card, compiled.company.as_ref());
        job.location = field(&card, compiled.location.as_ref());
        job.remote = job
            .location
            .as_deref()
            .is_some_and(|l| l.to_lowercase().contains("remote"));
        job.salary = field(&card, compiled.salary.as_ref()).and_then(|s| parse_salary(&s));
        job.job_type = field(&card, compiled.job_type.as_ref()).map(|t| JobType::parse(&t));
        job.description = field(&card, compiled.description.as_ref());
        job.posted_at = compiled
            .posted_at
            .as_ref()
            .and_then(|sel| card.select(sel).next())
            .and_then(|el| {
                el.value()
                    .attr("datetime")
                    .and_then(|dt| parse_posted_date(dt, today))
                    .or_else(|| parse_posted_date(&text(&el), today))
            });

        jobs.push(job);
    }

    debug!(count = jobs.len(), "Selector extraction finished");
    Ok(jobs)
}

fn text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn field(card: &ElementRef<'_>, selector: Option<&Selector>) -> Option<String> {
    let el = card.select(selector?).next()?;
    non_empty(text(&el))
}
