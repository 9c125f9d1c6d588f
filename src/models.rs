//! Data models for sourced job postings.
//!
//! - [`JobPosting`]: one job as extracted from a listing page, JSON-LD block, or feed
//! - [`JobType`]: normalized employment type
//! - [`SalaryRange`]: salary parsed from structured data or free text
//! - [`JobBoard`]: everything one run produced, serialized to the outputs

use crate::fetchers::FetchMethod;
use crate::search::JobQuery;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single job posting.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JobPosting {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    /// Remote or telecommute role.
    pub remote: bool,
    pub job_type: Option<JobType>,
    pub salary: Option<SalaryRange>,
    /// Absolute URL of the posting (or of the page it was found on).
    pub url: String,
    pub description: Option<String>,
    pub posted_at: Option<NaiveDate>,
    /// Name of the source it was scraped from.
    pub source: String,
}

impl JobPosting {
    /// A posting with only the required fields set.
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: None,
            location: None,
            remote: false,
            job_type: None,
            salary: None,
            url: url.into(),
            description: None,
            posted_at: None,
            source: source.into(),
        }
    }
}

/// Employment type, parsed leniently from whatever a site writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
    Volunteer,
    Other,
}

impl JobType {
    /// Accepts schema.org values (`FULL_TIME`) and human ones (`Full-time`,
    /// `full time`, `Contractor`). Anything unrecognized is [`JobType::Other`].
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "fulltime" | "permanent" => JobType::FullTime,
            "parttime" => JobType::PartTime,
            "contract" | "contractor" | "freelance" | "perdiem" => JobType::Contract,
            "intern" | "internship" => JobType::Internship,
            "temporary" | "temp" | "seasonal" => JobType::Temporary,
            "volunteer" => JobType::Volunteer,
            _ => JobType::Other,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
            JobType::Temporary => "Temporary",
            JobType::Volunteer => "Volunteer",
            JobType::Other => "Other",
        };
        f.write_str(label)
    }
}

/// Pay period of a salary figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryPeriod {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl SalaryPeriod {
    /// Parse schema.org `unitText` or a free-text unit ("hr", "annum").
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" | "hr" | "h" => Some(SalaryPeriod::Hour),
            "day" | "daily" => Some(SalaryPeriod::Day),
            "week" | "weekly" | "wk" => Some(SalaryPeriod::Week),
            "month" | "monthly" | "mo" => Some(SalaryPeriod::Month),
            "year" | "yearly" | "yr" | "annum" | "annual" | "annually" => Some(SalaryPeriod::Year),
            _ => None,
        }
    }

    fn per_year(self) -> f64 {
        match self {
            SalaryPeriod::Hour => 2_080.0,
            SalaryPeriod::Day => 260.0,
            SalaryPeriod::Week => 52.0,
            SalaryPeriod::Month => 12.0,
            SalaryPeriod::Year => 1.0,
        }
    }
}

/// Salary as a range; a single figure has `min == max`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
    /// ISO 4217 code when known.
    pub currency: Option<String>,
    pub period: Option<SalaryPeriod>,
}

impl SalaryRange {
    /// Upper bound annualized. Unknown periods count as yearly.
    pub fn annual_max(&self) -> f64 {
        self.max * self.period.unwrap_or(SalaryPeriod::Year).per_year()
    }
}

impl fmt::Display for SalaryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            f.write_str(&format_amount(self.min))?;
        } else {
            write!(f, "{}-{}", format_amount(self.min), format_amount(self.max))?;
        }
        if let Some(currency) = &self.currency {
            write!(f, " {currency}")?;
        }
        if let Some(period) = self.period {
            write!(f, " per {}", format!("{period:?}").to_lowercase())?;
        }
        Ok(())
    }
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

static SALARY_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<c1>[$£€])?\s*(?P<lo>\d[\d,]*(?:\.\d+)?)(?:\s*(?P<k1>k)\b)?\s*(?:-|–|—|\bto\b)\s*(?P<c2>[$£€])?\s*(?P<hi>\d[\d,]*(?:\.\d+)?)(?:\s*(?P<k2>k)\b)?",
    )
    .unwrap()
});

static SALARY_SINGLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?P<c>[$£€])\s*(?P<v>\d[\d,]*(?:\.\d+)?)(?:\s*(?P<k>k)\b)?").unwrap()
});

/// Period written straight after an amount: `/hr`, `per month`, `a year`, `hourly`.
static SALARY_PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:/\s*(?P<slash>hour|hr|h|day|week|wk|month|mo|year|yr|annum)|(?:per|an?)\s+(?P<word>hour|hr|day|week|wk|month|mo|year|yr|annum)|(?P<adverb>hourly|daily|weekly|monthly|yearly|annually))\b",
    )
    .unwrap()
});

/// Parse a salary from free text such as `$80,000 - $100,000`, `$50k`,
/// `£30k–£40k a year` or `$25/hr`. A currency symbol is required on at
/// least one side so stray numbers (dates, "3-5 years") are not mistaken for
/// pay. The period is only read from the words right after the amount.
pub fn parse_salary(text: &str) -> Option<SalaryRange> {
    let range = SALARY_RANGE_RE
        .captures_iter(text)
        .find(|caps| caps.name("c1").is_some() || caps.name("c2").is_some());

    if let Some(caps) = range {
        let symbol = caps.name("c1").or_else(|| caps.name("c2"))?;
        let hi_k = caps.name("k2").is_some();
        let lo_k = caps.name("k1").is_some() || hi_k;
        let min = parse_amount(&caps["lo"], lo_k)?;
        let max = parse_amount(&caps["hi"], hi_k)?;
        let end = caps.get(0)?.end();
        return Some(SalaryRange {
            min: min.min(max),
            max: min.max(max),
            currency: currency_code(symbol.as_str()),
            period: period_after(&text[end..]),
        });
    }

    let caps = SALARY_SINGLE_RE.captures(text)?;
    let value = parse_amount(&caps["v"], caps.name("k").is_some())?;
    let end = caps.get(0)?.end();
    Some(SalaryRange {
        min: value,
        max: value,
        currency: currency_code(&caps["c"]),
        period: period_after(&text[end..]),
    })
}

fn period_after(rest: &str) -> Option<SalaryPeriod> {
    let caps = SALARY_PERIOD_RE.captures(rest)?;
    let unit = caps
        .name("slash")
        .or_else(|| caps.name("word"))
        .or_else(|| caps.name("adverb"))?;
    SalaryPeriod::parse(unit.as_str())
}

fn parse_amount(raw: &str, thousands: bool) -> Option<f64> {
    let value: f64 = raw.replace(',', "").parse().ok()?;
    Some(if thousands { value * 1_000.0 } else { value })
}

fn currency_code(symbol: &str) -> Option<String> {
    match symbol {
        "$" => Some("USD".to_string()),
        "£" => Some("GBP".to_string()),
        "€" => Some("EUR".to_string()),
        _ => None,
    }
}

/// How one source fared in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub url: String,
    pub method: Option<FetchMethod>,
    pub status: Option<u16>,
    pub jobs_found: usize,
    pub elapsed_ms: Option<u64>,
    pub error: Option<String>,
}

/// The result of one run: what was asked, where it looked, what it found.
#[derive(Debug, Serialize)]
pub struct JobBoard {
    /// `YYYY-MM-DD`.
    pub local_date: String,
    /// `HH:MM:SS`.
    pub local_time: String,
    pub query: JobQuery,
    pub sources: Vec<SourceReport>,
    pub jobs: Vec<JobPosting>,
}
