//! Running index of every report written to an output directory.
//!
//! `index.md` lists dates newest first, each with the runs made that day:
//!
//! ```text
//! # Job Board Runs
//!
//! - **2025-05-06**
//!     - [09:30:12](./2025-05-06_jobs_093012.md): 14 jobs from 3 sources
//! - **2025-05-05**
//!     - [17:45:01](./2025-05-05_jobs_174501.md): 9 jobs from 3 sources
//! ```
//!
//! Re-running with the same report file name does not duplicate its entry.

use crate::models::JobBoard;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

const INDEX_FILE: &str = "index.md";
const INDEX_HEADING: &str = "# Job Board Runs";

/// Insert this run's report into `{output_dir}/index.md`, creating it if needed.
#[instrument(level = "info", skip_all, fields(%output_dir, date = %board.local_date, file = %markdown_filename))]
pub async fn update_runs_index(
    output_dir: &str,
    board: &JobBoard,
    markdown_filename: &str,
) -> Result<(), Box<dyn Error>> {
    let index_path = Path::new(output_dir).join(INDEX_FILE);
    let existing = if index_path.exists() {
        fs::read_to_string(&index_path).await?
    } else {
        String::new()
    };

    let entry = format!(
        "    - [{}](./{}): {} jobs from {} sources",
        board.local_time,
        markdown_filename,
        board.jobs.len(),
        board.sources.len()
    );
    let updated = insert_run(&existing, &board.local_date, markdown_filename, &entry);

    fs::write(&index_path, updated).await?;
    info!(path = %index_path.display(), "Updated runs index");
    Ok(())
}

/// Pure text transformation behind [`update_runs_index`].
fn insert_run(existing: &str, date: &str, markdown_filename: &str, entry: &str) -> String {
    let date_heading = format!("- **{date}**");
    let link_target = format!("(./{markdown_filename})");

    let mut lines: Vec<String> = existing.lines().map(str::to_string).collect();
    if lines.first().map(String::as_str) != Some(INDEX_HEADING) {
        lines.insert(0, INDEX_HEADING.to_string());
        lines.insert(1, String::new());
    }

    if lines.iter().any(|l| l.contains(&link_target)) {
        debug!(file = %markdown_filename, "Run already indexed");
        return join_lines(lines);
    }

    match lines.iter().position(|l| l == &date_heading) {
        Some(pos) => {
            let mut end = pos + 1;
            while end < lines.len() && lines[end].starts_with("    - ") {
                end += 1;
            }
            lines.insert(end, entry.to_string());
        }
        None => {
            // Newest date goes first, right under the heading.
            let at = lines
                .iter()
                .position(|l| l.starts_with("- **"))
                .unwrap_or(lines.len());
            lines.insert(at, entry.to_string());
            lines.insert(at, date_heading);
        }
    }

    join_lines(lines)
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
