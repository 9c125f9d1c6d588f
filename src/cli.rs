//! Command-line interface definitions for the job scraper.
//!
//! Flags describe the search and override values from the optional YAML
//! config file. Proxy settings can also come from the environment.

use crate::config::ScraperConfig;
use crate::models::JobType;
use crate::search::JobQuery;
use clap::Parser;

/// Command-line arguments for a scrape run.
///
/// # Examples
///
/// ```sh
/// # Scrape two listing pages directly
/// job_scraper -o ./out https://jobs.example.com/rust https://careers.example.org/feed.xml
///
/// # Search configured sources for remote Rust jobs posted this week
/// job_scraper -o ./out -c scraper.yaml -q rust --remote-only --posted-within-days 7
///
/// # Route through proxies, HTTP only
/// SCRAPER_PROXIES=10.0.0.1:3128,socks5://10.0.0.2:1080 job_scraper -o ./out --no-browser -c scraper.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Listing pages or feeds to scrape in addition to configured sources
    pub urls: Vec<String>,

    /// Directory for JSON and Markdown output
    #[arg(short, long)]
    pub output_dir: String,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "JOB_SCRAPER_CONFIG")]
    pub config: Option<String>,

    /// Keyword every posting must contain (repeatable)
    #[arg(short = 'q', long = "keyword")]
    pub keywords: Vec<String>,

    /// Location filter; "remote" matches remote postings
    #[arg(short, long)]
    pub location: Option<String>,

    /// Employment type to keep, e.g. full-time or contract (repeatable)
    #[arg(long = "job-type")]
    pub job_types: Vec<String>,

    /// Keep only remote postings
    #[arg(long)]
    pub remote_only: bool,

    /// Minimum yearly salary; postings without a salary are kept
    #[arg(long)]
    pub min_salary: Option<f64>,

    /// Drop postings older than this many days
    #[arg(long)]
    pub posted_within_days: Option<u32>,

    /// Maximum number of postings in the output
    #[arg(long)]
    pub limit: Option<usize>,

    /// Proxies to rotate through, comma separated
    #[arg(long = "proxy", env = "SCRAPER_PROXIES", value_delimiter = ',')]
    pub proxies: Vec<String>,

    /// URL of a plain-text proxy list, one proxy per line
    #[arg(long, env = "SCRAPER_PROXY_LIST_URL")]
    pub proxy_list_url: Option<String>,

    /// Never fall back to the headless browser
    #[arg(long)]
    pub no_browser: bool,

    /// Retries per URL after the first attempt
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Number of URLs scraped at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl Cli {
    /// The search described by the flags.
    pub fn to_query(&self) -> JobQuery {
        JobQuery {
            keywords: self.keywords.clone(),
            location: self.location.clone(),
            job_types: self.job_types.iter().map(|t| JobType::parse(t)).collect(),
            remote_only: self.remote_only,
            min_salary: self.min_salary,
            posted_within_days: self.posted_within_days,
            limit: self.limit,
        }
    }

    /// Apply flag values on top of the file configuration.
    ///
    /// Proxies from flags are added to the configured ones rather than
    /// replacing them.
    pub fn apply_overrides(&self, config: &mut ScraperConfig) {
        config.proxies.extend(self.proxies.iter().cloned());
        if let Some(url) = &self.proxy_list_url {
            config.proxy_list_url = Some(url.clone());
        }
        if self.no_browser {
            config.browser.enabled = false;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "job_scraper",
            "--output-dir",
            "./out",
            "https://jobs.example.com/a",
            "https://jobs.example.com/b",
        ]);

        assert_eq!(cli.output_dir, "./out");
        assert_eq!(cli.urls.len(), 2);
        assert!(!cli.remote_only);
        assert!(!cli.no_browser);
    }

    #[test]
    fn test_cli_short_flags_and_query() {
        let cli = Cli::parse_from([
            "job_scraper",
            "-o",
            "/tmp/out",
            "-q",
            "rust",
            "-q",
            "tokio",
            "-l",
            "Berlin",
            "--job-type",
            "full time",
            "--job-type",
            "contract",
            "--remote-only",
            "--min-salary",
            "80000",
            "--posted-within-days",
            "14",
            "--limit",
            "25",
        ]);

        let query = cli.to_query();
        assert_eq!(query.keywords, vec!["rust", "tokio"]);
        assert_eq!(query.location.as_deref(), Some("Berlin"));
        assert_eq!(query.job_types, vec![JobType::FullTime, JobType::Contract]);
        assert!(query.remote_only);
        assert_eq!(query.min_salary, Some(80_000.0));
        assert_eq!(query.posted_within_days, Some(14));
        assert_eq!(query.limit, Some(25));
    }

    #[test]
    fn test_overrides_extend_and_replace() {
        let cli = Cli::parse_from([
            "job_scraper",
            "-o",
            "./out",
            "--proxy",
            "10.0.0.1:3128,socks5://10.0.0.2:1080",
            "--proxy-list-url",
            "https://lists.example.com/proxies.txt",
            "--no-browser",
            "--max-retries",
            "5",
            "--concurrency",
            "8",
        ]);

        let mut config = ScraperConfig {
            proxies: vec!["http://192.0.2.1:8080".into()],
            ..ScraperConfig::default()
        };
        cli.apply_overrides(&mut config);

        assert_eq!(
            config.proxies,
            vec!["http://192.0.2.1:8080", "10.0.0.1:3128", "socks5://10.0.0.2:1080"]
        );
        assert_eq!(
            config.proxy_list_url.as_deref(),
            Some("https://lists.example.com/proxies.txt")
        );
        assert!(!config.browser.enabled);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.concurrency, 8);
    }

    #[test]
    fn test_negative_age_window_is_rejected() {
        let parsed = Cli::try_parse_from(["job_scraper", "-o", "./out", "--posted-within-days", "-3"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["job_scraper", "-o", "./out", "--posted-within-days", "99999999999"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let cli = Cli::parse_from(["job_scraper", "-o", "./out"]);
        let mut config = ScraperConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config, ScraperConfig::default());
    }
}
