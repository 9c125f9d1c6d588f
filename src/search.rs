//! Job search and filtering over sourced postings.
//!
//! The same filters a job board offers on its search page, applied to
//! whatever the scraper collected:
//!
//! | Filter | Rule |
//! |--------|------|
//! | keywords | every keyword appears in title, company, or description (case-insensitive) |
//! | location | substring of the posting location; `remote` also matches remote postings |
//! | job types | posting type is one of them; untyped postings are dropped when set |
//! | remote only | posting is remote |
//! | min salary | annualized upper bound reaches it; postings without salary are kept |
//! | posted within | posting date is inside the window; undated postings are kept |
//!
//! [`JobQuery::apply`] also dedupes by URL, sorts newest first, and truncates.

use crate::models::{JobPosting, JobType};
use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, instrument};

/// Search criteria. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobQuery {
    pub keywords: Vec<String>,
    pub location: Option<String>,
    pub job_types: Vec<JobType>,
    pub remote_only: bool,
    /// Minimum yearly pay.
    pub min_salary: Option<f64>,
    pub posted_within_days: Option<u32>,
    pub limit: Option<usize>,
}

impl JobQuery {
    /// Keywords joined for use in a search URL.
    pub fn keyword_text(&self) -> String {
        self.keywords.join(" ")
    }

    pub fn matches(&self, job: &JobPosting, today: NaiveDate) -> bool {
        self.matches_keywords(job)
            && self.matches_location(job)
            && self.matches_job_type(job)
            && (!self.remote_only || job.remote)
            && self.matches_salary(job)
            && self.matches_age(job, today)
    }

    fn matches_keywords(&self, job: &JobPosting) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let haystack = [
            Some(job.title.as_str()),
            job.company.as_deref(),
            job.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .join(" ")
        .to_lowercase();

        self.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .all(|k| haystack.contains(&k))
    }

    fn matches_location(&self, job: &JobPosting) -> bool {
        let Some(wanted) = self.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) else {
            return true;
        };
        let wanted = wanted.to_lowercase();
        if wanted == "remote" && job.remote {
            return true;
        }
        job.location
            .as_deref()
            .is_some_and(|loc| loc.to_lowercase().contains(&wanted))
    }

    fn matches_job_type(&self, job: &JobPosting) -> bool {
        if self.job_types.is_empty() {
            return true;
        }
        job.job_type
            .as_ref()
            .is_some_and(|t| self.job_types.contains(t))
    }

    fn matches_salary(&self, job: &JobPosting) -> bool {
        match (self.min_salary, &job.salary) {
            (Some(min), Some(salary)) => salary.annual_max() >= min,
            _ => true,
        }
    }

    fn matches_age(&self, job: &JobPosting, today: NaiveDate) -> bool {
        let (Some(days), Some(posted)) = (self.posted_within_days, job.posted_at) else {
            return true;
        };
        // A window reaching past the calendar's start admits everything.
        match Duration::try_days(i64::from(days)).and_then(|d| today.checked_sub_signed(d)) {
            Some(oldest) => posted >= oldest,
            None => true,
        }
    }

    /// Dedupe by URL (first occurrence wins), filter, sort newest first with
    /// undated postings last, then truncate to `limit`.
    #[instrument(level = "info", skip_all, fields(input = jobs.len()))]
    pub fn apply(&self, jobs: Vec<JobPosting>, today: NaiveDate) -> Vec<JobPosting> {
        let mut selected: Vec<JobPosting> = jobs
            .into_iter()
            .unique_by(|job| job.url.clone())
            .filter(|job| self.matches(job, today))
            .collect();

        // Stable sort keeps source order among equal dates.
        selected.sort_by_key(|job| Reverse(job.posted_at));

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        debug!(output = selected.len(), "Applied job query");
        selected
    }
}
