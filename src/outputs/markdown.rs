//! Markdown rendering of a [`JobBoard`].
//!
//! Postings are grouped by company (alphabetically, unknown companies last)
//! with a contents list linking to each group's anchor. A sources table at
//! the end shows how every source fared.

use super::compact_time;
use crate::models::{JobBoard, JobPosting};
use crate::utils::{slugify, truncate_preview};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

const UNKNOWN_COMPANY: &str = "Unknown company";
const DESCRIPTION_PREVIEW: usize = 400;

/// Render the whole board as one Markdown document.
pub fn board_to_markdown(board: &JobBoard) -> String {
    let mut md = String::new();

    writeln!(md, "# Jobs found on {} at {}\n", board.local_date, board.local_time).unwrap();
    writeln!(md, "{}\n", describe_query(board)).unwrap();

    let mut by_company: BTreeMap<&str, Vec<&JobPosting>> = BTreeMap::new();
    let mut unknown: Vec<&JobPosting> = Vec::new();
    for job in &board.jobs {
        match job.company.as_deref() {
            Some(company) => by_company.entry(company).or_default().push(job),
            None => unknown.push(job),
        }
    }
    let groups: Vec<(&str, Vec<&JobPosting>)> = by_company
        .into_iter()
        .chain((!unknown.is_empty()).then_some((UNKNOWN_COMPANY, unknown)))
        .collect();

    if groups.is_empty() {
        md.push_str("_No postings matched._\n\n");
    } else {
        md.push_str("## Contents\n\n");
        for (company, jobs) in &groups {
            writeln!(md, "- [{}](#{}) ({})", company, slugify(company), jobs.len()).unwrap();
        }
        md.push('\n');
    }

    for (company, jobs) in &groups {
        writeln!(md, "## {company}\n").unwrap();
        for job in jobs {
            write_job(&mut md, job);
        }
    }

    if !board.sources.is_empty() {
        md.push_str("## Sources\n\n");
        md.push_str("| Source | Method | Status | Jobs | Error |\n");
        md.push_str("|--------|--------|--------|------|-------|\n");
        for source in &board.sources {
            writeln!(
                md,
                "| [{}]({}) | {} | {} | {} | {} |",
                source.name,
                source.url,
                source.method.map(|m| m.as_str()).unwrap_or("-"),
                source.status.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                source.jobs_found,
                source.error.as_deref().unwrap_or("").replace('|', "\\|"),
            )
            .unwrap();
        }
        md.push('\n');
    }

    md
}

fn describe_query(board: &JobBoard) -> String {
    let query = &board.query;
    let mut parts = Vec::new();
    if !query.keywords.is_empty() {
        parts.push(format!("keywords **{}**", query.keyword_text()));
    }
    if let Some(location) = &query.location {
        parts.push(format!("location **{location}**"));
    }
    if query.remote_only {
        parts.push("remote only".to_string());
    }
    if !query.job_types.is_empty() {
        let types: Vec<String> = query.job_types.iter().map(|t| t.to_string()).collect();
        parts.push(format!("types **{}**", types.join(", ")));
    }
    if let Some(min) = query.min_salary {
        parts.push(format!("salary at least **{min}** a year"));
    }
    if let Some(days) = query.posted_within_days {
        parts.push(format!("posted in the last **{days}** days"));
    }

    let filters = if parts.is_empty() {
        "no filters".to_string()
    } else {
        parts.join("; ")
    };
    format!(
        "{} postings from {} sources ({filters}).",
        board.jobs.len(),
        board.sources.len()
    )
}

fn write_job(md: &mut String, job: &JobPosting) {
    writeln!(md, "### [{}]({})\n", job.title, job.url).unwrap();

    if let Some(location) = &job.location {
        writeln!(md, "- **Location:** {location}").unwrap();
    }
    if job.remote {
        md.push_str("- **Remote:** yes\n");
    }
    if let Some(job_type) = &job.job_type {
        writeln!(md, "- **Type:** {job_type}").unwrap();
    }
    if let Some(salary) = &job.salary {
        writeln!(md, "- **Salary:** {salary}").unwrap();
    }
    if let Some(posted) = job.posted_at {
        writeln!(md, "- **Posted:** {posted}").unwrap();
    }
    writeln!(md, "- **Source:** {}", job.source).unwrap();

    if let Some(description) = &job.description {
        writeln!(md, "\n> {}", truncate_preview(description, DESCRIPTION_PREVIEW)).unwrap();
    }
    md.push('\n');
}

/// Write the Markdown report to `{output_dir}/{date}_jobs_{HHMMSS}.md`.
#[instrument(level = "info", skip_all, fields(%output_dir, date = %board.local_date))]
pub async fn write_markdown(board: &JobBoard, output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let md = board_to_markdown(board);
    let path = Path::new(output_dir).join(format!(
        "{}_jobs_{}.md",
        board.local_date,
        compact_time(&board.local_time)
    ));

    if let Err(e) = fs::write(&path, md).await {
        error!(path = %path.display(), error = %e, "Failed writing Markdown");
        return Err(e.into());
    }
    info!(path = %path.display(), "Wrote job board Markdown");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::FetchMethod;
    use crate::models::{JobType, SourceReport};
    use crate::search::JobQuery;

    fn board() -> JobBoard {
        let mut rust = JobPosting::new("Rust Engineer", "https://a.example/1", "a");
        rust.company = Some("Ferris Corp".into());
        rust.location = Some("Berlin".into());
        rust.job_type = Some(JobType::FullTime);
        rust.description = Some("Build things.".into());

        let mut data = JobPosting::new("Data Engineer", "https://a.example/2", "a");
        data.company = Some("Acme".into());
        data.remote = true;

        let anonymous = JobPosting::new("Mystery Role", "https://b.example/3", "b");

        JobBoard {
            local_date: "2025-05-06".into(),
            local_time: "09:30:12".into(),
            query: JobQuery {
                keywords: vec!["engineer".into()],
                remote_only: false,
                ..JobQuery::default()
            },
            sources: vec![
                SourceReport {
                    name: "a".into(),
                    url: "https://a.example/jobs".into(),
                    method: Some(FetchMethod::Browser),
                    status: Some(200),
                    jobs_found: 2,
                    elapsed_ms: Some(1200),
                    error: None,
                },
                SourceReport {
                    name: "b".into(),
                    url: "https://b.example/jobs".into(),
                    method: None,
                    status: None,
                    jobs_found: 0,
                    elapsed_ms: None,
                    error: Some("HTTP 404 for x | y".into()),
                },
            ],
            jobs: vec![rust, data, anonymous],
        }
    }

    #[test]
    fn test_groups_by_company_with_unknown_last() {
        let md = board_to_markdown(&board());

        let acme = md.find("## Acme").unwrap();
        let ferris = md.find("## Ferris Corp").unwrap();
        let unknown = md.find("## Unknown company").unwrap();
        assert!(acme < ferris && ferris < unknown);

        assert!(md.contains("- [Ferris Corp](#ferris-corp) (1)"));
        assert!(md.contains("### [Rust Engineer](https://a.example/1)"));
        assert!(md.contains("- **Type:** Full-time"));
        assert!(md.contains("- **Remote:** yes"));
        assert!(md.contains("> Build things."));
        assert!(!md.contains("bytes)"));
        assert!(md.contains("3 postings from 2 sources (keywords **engineer**)."));
    }

    #[test]
    fn test_sources_table_escapes_pipes() {
        let md = board_to_markdown(&board());
        assert!(md.contains("| [a](https://a.example/jobs) | browser | 200 | 2 |  |"));
        assert!(md.contains("| [b](https://b.example/jobs) | - | - | 0 | HTTP 404 for x \\| y |"));
    }

    #[test]
    fn test_empty_board() {
        let mut board = board();
        board.jobs.clear();
        board.sources.clear();
        let md = board_to_markdown(&board);
        assert!(md.contains("_No postings matched._"));
        assert!(!md.contains("## Contents"));
        assert!(!md.contains("## Sources"));
    }

    #[tokio::test]
    async fn test_write_markdown_path() {
        let dir = std::env::temp_dir().join(format!("job_scraper_md_{}", std::process::id()));
        fs::create_dir_all(&dir).await.unwrap();

        let path = write_markdown(&board(), dir.to_str().unwrap()).await.unwrap();
        assert_eq!(path, dir.join("2025-05-06_jobs_093012.md"));
        assert!(fs::read_to_string(&path).await.unwrap().starts_with("# Jobs found on 2025-05-06"));

        let _ = fs::remove_dir_all(&dir).await;
    }
}
