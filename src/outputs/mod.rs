//! Output generation for a finished run.
//!
//! # Submodules
//!
//! - [`json`]: writes the [`JobBoard`](crate::models::JobBoard) as JSON for other tools
//! - [`markdown`]: renders the board as a readable Markdown report
//! - [`indexes`]: keeps `index.md` listing every run
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-06/
//! │   ├── jobs_093012.json
//! │   └── jobs_174501.json
//! ├── index.md
//! ├── 2025-05-06_jobs_093012.md
//! └── 2025-05-06_jobs_174501.md
//! ```

pub mod indexes;
pub mod json;
pub mod markdown;

/// `HH:MM:SS` (optionally with fractional seconds) to `HHMMSS` for file names.
pub fn compact_time(local_time: &str) -> String {
    local_time
        .split('.')
        .next()
        .unwrap_or(local_time)
        .replace(':', "")
}
