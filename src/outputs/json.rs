//! JSON output of a run.
//!
//! Runs are grouped by date, one file per run:
//! `{output_dir}/{date}/jobs_{HHMMSS}.json`.

use super::compact_time;
use crate::models::JobBoard;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`JobBoard`] to its date directory and return the file path.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_board(board: &JobBoard, output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(board)?;

    let date_dir = Path::new(output_dir).join(&board.local_date);
    info!(dir = %date_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&date_dir).await {
        error!(dir = %date_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = date_dir.join(format!("jobs_{}.json", compact_time(&board.local_time)));
    fs::write(&path, json).await?;
    info!(path = %path.display(), jobs = board.jobs.len(), "Wrote JSON file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobPosting;
    use crate::search::JobQuery;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("job_scraper_{name}_{}", std::process::id()))
    }

    #[tokio::test]
    async fn test_write_board_layout_and_content() {
        let dir = scratch_dir("json");
        let board = JobBoard {
            local_date: "2025-05-06".to_string(),
            local_time: "09:30:12".to_string(),
            query: JobQuery {
                keywords: vec!["rust".to_string()],
                ..JobQuery::default()
            },
            sources: vec![],
            jobs: vec![JobPosting::new("Rust Engineer", "https://x/1", "x")],
        };

        let path = write_board(&board, dir.to_str().unwrap()).await.unwrap();
        assert_eq!(path, dir.join("2025-05-06").join("jobs_093012.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(written["local_date"], "2025-05-06");
        assert_eq!(written["query"]["keywords"][0], "rust");
        assert_eq!(written["jobs"][0]["title"], "Rust Engineer");

        let _ = fs::remove_dir_all(&dir).await;
    }
}
