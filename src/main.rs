//! # Job Scraper
//!
//! Scrapes job postings from listing pages and feeds, filters them with a
//! job-board style search, and writes the result as JSON and Markdown.
//!
//! ## Features
//!
//! - Rotates user agents and proxies on every request attempt
//! - Falls back to a headless browser when plain HTTP is blocked or gated
//!   (with the `browser` feature)
//! - Retries with exponential backoff and jitter
//! - Reads schema.org JSON-LD, CSS selector profiles, and RSS/Atom feeds
//! - Filters by keywords, location, job type, remote, salary, and age
//!
//! ## Usage
//!
//! ```sh
//! job_scraper -o ./out -c scraper.yaml -q rust --remote-only
//! ```
//!
//! ## Architecture
//!
//! 1. **Sources**: configured sources plus URLs from the command line,
//!    with `{query}`/`{location}` templates filled in
//! 2. **Fetching**: every URL through [`web_scraper::WebScraper`], a few at a time
//! 3. **Extraction**: postings pulled out of each page by source kind
//! 4. **Search**: dedupe, filter, sort, and truncate
//! 5. **Output**: JSON file, Markdown report, and the runs index

use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod fetchers;
mod models;
mod outputs;
mod retry;
mod rotation;
mod search;
mod sources;
mod utils;
mod web_scraper;

use cli::Cli;
use config::ScraperConfig;
use extract::extract_jobs;
use models::{JobBoard, JobPosting, SourceReport};
use outputs::{indexes, json, markdown};
use sources::SourceConfig;
use utils::ensure_writable_dir;
use web_scraper::WebScraper;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("job_scraper starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.config, urls = args.urls.len(), "Parsed CLI arguments");

    // ---- Config ----
    let mut config = match &args.config {
        Some(path) => ScraperConfig::load(path).await?,
        None => ScraperConfig::default(),
    };
    args.apply_overrides(&mut config);

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Sources ----
    let query = args.to_query();
    let sources: Vec<SourceConfig> = config
        .sources
        .iter()
        .cloned()
        .chain(args.urls.iter().map(|u| SourceConfig::from_url(u)))
        .collect();
    if sources.is_empty() {
        error!("No sources: pass URLs on the command line or list them in the config file");
        return Err("no sources to scrape".into());
    }
    info!(sources = sources.len(), keywords = %query.keyword_text(), "Sources resolved");

    // ---- Fetch ----
    let scraper = WebScraper::from_config(&config).await?;
    let resolved: Vec<String> = sources.iter().map(|s| s.resolve_url(&query)).collect();
    let unique_urls: Vec<String> = resolved.iter().cloned().unique().collect();
    let pages: HashMap<String, _> = scraper
        .scrape_all(unique_urls, config.concurrency)
        .await
        .into_iter()
        .collect();

    // ---- Extract ----
    let today = Local::now().date_naive();
    let mut reports = Vec::with_capacity(sources.len());
    let mut all_jobs: Vec<JobPosting> = Vec::new();

    for (source, url) in sources.iter().zip(&resolved) {
        let mut report = SourceReport {
            name: source.name.clone(),
            url: url.clone(),
            method: None,
            status: None,
            jobs_found: 0,
            elapsed_ms: None,
            error: None,
        };

        match pages.get(url) {
            Some(Ok(page)) => {
                report.method = Some(page.method);
                report.status = Some(page.status);
                report.elapsed_ms = Some(page.elapsed.as_millis() as u64);
                match extract_jobs(page, source, today) {
                    Ok(jobs) => {
                        report.jobs_found = jobs.len();
                        all_jobs.extend(jobs);
                    }
                    Err(e) => {
                        warn!(source = %source.name, error = %e, "Extraction failed; skipping source");
                        report.error = Some(e.to_string());
                    }
                }
            }
            Some(Err(e)) => {
                report.error = Some(e.to_string());
            }
            None => {
                report.error = Some("not scraped".to_string());
            }
        }
        reports.push(report);
    }

    let failed_sources = reports.iter().filter(|r| r.error.is_some()).count();
    let found = all_jobs.len();
    let jobs = query.apply(all_jobs, today);
    info!(
        sources = reports.len(),
        failed_sources,
        found,
        kept = jobs.len(),
        "Search applied"
    );

    // ---- Output ----
    let now = Local::now();
    let board = JobBoard {
        local_date: now.date_naive().to_string(),
        local_time: now.time().format("%H:%M:%S").to_string(),
        query,
        sources: reports,
        jobs,
    };

    if let Err(e) = json::write_board(&board, &args.output_dir).await {
        error!(error = %e, "Failed to write JSON");
    }

    match markdown::write_markdown(&board, &args.output_dir).await {
        Ok(path) => {
            let markdown_filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Err(e) =
                indexes::update_runs_index(&args.output_dir, &board, &markdown_filename).await
            {
                error!(error = %e, "Failed to update runs index");
            }
        }
        Err(e) => error!(error = %e, "Failed to write Markdown"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        jobs = board.jobs.len(),
        "Execution complete"
    );

    if failed_sources == board.sources.len() {
        error!(failed_sources, "Every source failed");
        return Err(format!("all {failed_sources} sources failed").into());
    }

    Ok(())
}
