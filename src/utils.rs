//! Utility functions for text cleanup, date parsing, and file system checks.
//!
//! - Preview truncation and slugification for Markdown reports
//! - Whitespace collapsing and HTML stripping for scraped text
//! - Relative and absolute posting-date parsing
//! - File system validation for output directories

use chrono::{DateTime, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Shorten text for a report preview.
///
/// Keeps at most `max_chars` characters, backs off to the last whole word,
/// and marks the cut with an ellipsis.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_preview("short", 100), "short");
/// assert_eq!(truncate_preview("build reliable services", 12), "build…");
/// ```
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let kept = match cut.rfind(char::is_whitespace) {
        Some(i) if i > 0 => &cut[..i],
        _ => cut.as_str(),
    };
    format!("{}…", kept.trim_end())
}

/// Convert a title to a URL-friendly slug for Markdown anchors.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Acme, Inc."), "acme-inc");
/// ```
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip tags from an HTML fragment and collapse the remaining text.
pub fn html_to_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    collapse_whitespace(&parsed.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Trim and drop empty strings.
pub fn non_empty(s: impl AsRef<str>) -> Option<String> {
    let trimmed = s.as_ref().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

static RELATIVE_AGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?P<n>\d+|an?)\s*\+?\s*(?P<unit>minute|min|hour|hr|day|week|month)s?\s+ago").unwrap()
});

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<date>\d{4}-\d{2}-\d{2})").unwrap());

/// Parse a posting date as sites print it.
///
/// Handles ISO dates and timestamps (`2025-05-06`, `2025-05-06T09:00:00Z`),
/// RFC 2822 feed dates, and relative ages (`today`, `yesterday`,
/// `3 days ago`, `30+ days ago`, `a week ago`). Relative ages are resolved
/// against `today`; months count as 30 days.
pub fn parse_posted_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    if let Some(caps) = ISO_DATE_RE.captures(text) {
        if let Ok(date) = NaiveDate::parse_from_str(&caps["date"], "%Y-%m-%d") {
            return Some(date);
        }
    }

    let lower = text.to_lowercase();
    if lower.contains("just posted") || lower.contains("today") || lower.contains("just now") {
        return Some(today);
    }
    if lower.contains("yesterday") {
        return today.checked_sub_signed(Duration::days(1));
    }

    let caps = RELATIVE_AGE_RE.captures(&lower)?;
    let n: i64 = match &caps["n"] {
        "a" | "an" => 1,
        digits => digits.parse().ok()?,
    };
    let days = match &caps["unit"] {
        "minute" | "min" | "hour" | "hr" => 0,
        "day" => n,
        "week" => n * 7,
        "month" => n * 30,
        _ => return None,
    };
    today.checked_sub_signed(Duration::days(days))
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and deletes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
