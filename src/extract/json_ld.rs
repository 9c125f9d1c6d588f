//! schema.org `JobPosting` extraction from JSON-LD blocks.
//!
//! Sites embed postings as a top-level object, inside an array, or inside an
//! `@graph`; all three are walked. Fields are read leniently because real
//! markup mixes strings, objects, and arrays for the same property.

use crate::models::{JobPosting, JobType, SalaryPeriod, SalaryRange};
use crate::utils::{html_to_text, non_empty, parse_posted_date};
use chrono::NaiveDate;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

static LD_JSON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// Collect every `JobPosting` embedded in the page.
pub fn extract_json_ld(html: &str, page_url: &Url, source: &str, today: NaiveDate) -> Vec<JobPosting> {
    let document = Html::parse_document(html);
    let mut nodes = Vec::new();

    for script in document.select(&LD_JSON_SELECTOR) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => collect_job_nodes(value, &mut nodes),
            Err(e) => debug!(error = %e, "Skipping unparsable JSON-LD block"),
        }
    }

    nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| posting_from_node(node, index, page_url, source, today))
        .collect()
}

/// Stand-in link for a posting without its own URL: the page plus
/// `#job-{n}`, so postings sharing a page stay distinct.
pub(crate) fn page_anchor(page_url: &Url, index: usize) -> Url {
    let mut url = page_url.clone();
    url.set_fragment(Some(&format!("job-{}", index + 1)));
    url
}

fn collect_job_nodes(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| collect_job_nodes(item, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                collect_job_nodes(graph, out);
            }
            let value = Value::Object(map);
            if is_job_posting(&value) {
                out.push(value);
            }
        }
        _ => {}
    }
}

fn is_job_posting(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == "JobPosting",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn posting_from_node(
    node: &Value,
    index: usize,
    page_url: &Url,
    source: &str,
    today: NaiveDate,
) -> Option<JobPosting> {
    let title = node.get("title").and_then(text_of).and_then(non_empty)?;

    let url = node
        .get("url")
        .and_then(Value::as_str)
        .and_then(|u| page_url.join(u).ok())
        .unwrap_or_else(|| page_anchor(page_url, index));

    let mut job = JobPosting::new(title, url.to_string(), source);
    job.company = node.get("hiringOrganization").and_then(name_of);
    job.location = node.get("jobLocation").and_then(location_of);
    job.remote = node
        .get("jobLocationType")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("TELECOMMUTE"))
        || job
            .location
            .as_deref()
            .is_some_and(|l| l.to_lowercase().contains("remote"));
    job.job_type = node.get("employmentType").and_then(|v| match v {
        Value::Array(items) => items.first().and_then(Value::as_str).map(JobType::parse),
        other => other.as_str().map(JobType::parse),
    });
    job.salary = node.get("baseSalary").and_then(salary_of);
    job.posted_at = node
        .get("datePosted")
        .and_then(Value::as_str)
        .and_then(|d| parse_posted_date(d, today));
    job.description = node
        .get("description")
        .and_then(Value::as_str)
        .map(html_to_text)
        .and_then(non_empty);
    Some(job)
}

fn text_of(value: &Value) -> Option<String> {
    value.as_str().map(html_to_text)
}

/// `"Acme"` or `{"@type": "Organization", "name": "Acme"}`.
fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Object(_) => value.get("name").and_then(Value::as_str).and_then(non_empty),
        Value::Array(items) => items.iter().find_map(name_of),
        _ => None,
    }
}

/// One or more `Place`s, each with a `PostalAddress` or a plain address string.
fn location_of(value: &Value) -> Option<String> {
    let places: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(place_of).collect(),
        other => place_of(other).into_iter().collect(),
    };
    let joined = places.into_iter().unique().join(" / ");
    non_empty(joined)
}

fn place_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Object(_) => match value.get("address") {
            Some(Value::String(s)) => non_empty(s),
            Some(address @ Value::Object(_)) => {
                let parts = ["addressLocality", "addressRegion", "addressCountry"]
                    .iter()
                    .filter_map(|key| address.get(*key).and_then(name_of))
                    .unique()
                    .collect::<Vec<_>>();
                non_empty(parts.join(", "))
            }
            _ => value.get("name").and_then(Value::as_str).and_then(non_empty),
        },
        _ => None,
    }
}

/// `MonetaryAmount` whose `value` is a number or a `QuantitativeValue`.
fn salary_of(value: &Value) -> Option<SalaryRange> {
    let currency = value.get("currency").and_then(Value::as_str).and_then(non_empty);
    let amount = value.get("value")?;

    let (min, max, unit) = match amount {
        Value::Object(_) => {
            let exact = amount.get("value").and_then(number_of);
            let min = amount.get("minValue").and_then(number_of).or(exact);
            let max = amount.get("maxValue").and_then(number_of).or(exact).or(min);
            let unit = amount.get("unitText").and_then(Value::as_str);
            (min.or(max)?, max?, unit)
        }
        other => {
            let v = number_of(other)?;
            (v, v, value.get("unitText").and_then(Value::as_str))
        }
    };

    Some(SalaryRange {
        min: min.min(max),
        max: min.max(max),
        currency,
        period: unit.and_then(SalaryPeriod::parse),
    })
}

/// Numbers sometimes arrive as strings (`"85000"`, `"85,000.00"`).
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    }
}
