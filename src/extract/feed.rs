//! RSS 2.0 and Atom job feeds.
//!
//! Besides the standard elements, job boards add their own per-item tags;
//! the common ones (`company`, `location`/`region`, `type`/`job_type`,
//! `salary`) are mapped too. Namespace prefixes are ignored, so
//! `dc:creator` reads as `creator`.

use super::json_ld::page_anchor;
use crate::models::{JobPosting, JobType, parse_salary};
use crate::utils::{html_to_text, non_empty, parse_posted_date};
use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::borrow::Cow;
use std::error::Error;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Default)]
struct FeedItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    description: Option<String>,
    date: Option<String>,
    company: Option<String>,
    location: Option<String>,
    job_type: Option<String>,
    salary: Option<String>,
}

impl FeedItem {
    fn set(&mut self, field: &str, value: String) {
        let slot = match field {
            "title" => &mut self.title,
            "link" => &mut self.link,
            "guid" | "id" => &mut self.guid,
            "description" | "summary" | "content" | "encoded" => &mut self.description,
            "pubdate" | "published" | "updated" | "date" => &mut self.date,
            "company" | "company_name" | "creator" | "name" => &mut self.company,
            "location" | "region" | "job_location" => &mut self.location,
            "type" | "job_type" | "employment_type" => &mut self.job_type,
            "salary" => &mut self.salary,
            _ => return,
        };
        // First occurrence wins: `published` before `updated`, `link` before `guid`.
        if slot.is_none() {
            *slot = non_empty(value);
        }
    }

    fn into_posting(self, index: usize, feed_url: &Url, source: &str, today: NaiveDate) -> Option<JobPosting> {
        let title = self.title.map(|t| html_to_text(&t)).and_then(non_empty)?;
        let url = self
            .link
            .or(self.guid.filter(|g| g.starts_with("http")))
            .and_then(|l| feed_url.join(&l).ok())
            .unwrap_or_else(|| page_anchor(feed_url, index));

        let mut job = JobPosting::new(title, url.to_string(), source);
        job.company = self.company;
        job.remote = job
            .title
            .to_lowercase()
            .contains("remote")
            || self
                .location
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains("remote"));
        job.location = self.location;
        job.job_type = self.job_type.as_deref().map(JobType::parse);
        job.salary = self
            .salary
            .as_deref()
            .and_then(parse_salary)
            .or_else(|| self.description.as_deref().and_then(parse_salary));
        job.posted_at = self.date.as_deref().and_then(|d| parse_posted_date(d, today));
        job.description = self.description.map(|d| html_to_text(&d)).and_then(non_empty);
        Some(job)
    }
}

/// Parse every `<item>` (RSS) or `<entry>` (Atom) into a posting.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML.
#[instrument(level = "debug", skip_all, fields(%feed_url))]
pub fn extract_feed(
    xml: &str,
    feed_url: &Url,
    source: &str,
    today: NaiveDate,
) -> Result<Vec<JobPosting>, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    let mut items: Vec<FeedItem> = Vec::new();
    let mut current: Option<FeedItem> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                if name == "item" || name == "entry" {
                    current = Some(FeedItem::default());
                } else if let Some(item) = current.as_mut() {
                    // Atom nests <name> inside <author>; descend into it.
                    if name != "author" {
                        if let Some(href) = href_of(&e) {
                            item.set(&name, href);
                        }
                        let raw = reader.read_text(e.name())?;
                        item.set(&name, decode_text(&raw));
                    }
                }
            }
            Event::Empty(e) => {
                if let Some(item) = current.as_mut() {
                    if let Some(href) = href_of(&e) {
                        item.set(&local_name(&e), href);
                    }
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if name == "item" || name == "entry" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let total = items.len();
    let jobs: Vec<JobPosting> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| item.into_posting(index, feed_url, source, today))
        .collect();
    debug!(items = total, jobs = jobs.len(), "Parsed feed");
    Ok(jobs)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase()
}

fn href_of(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"href")
        .map(|attr| decode_text(&String::from_utf8_lossy(&attr.value)))
}

/// Unwrap CDATA or unescape entities in raw element text.
fn decode_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
    {
        return inner.trim().to_string();
    }
    quick_xml::escape::unescape(trimmed)
        .unwrap_or(Cow::Borrowed(trimmed))
        .into_owned()
}
