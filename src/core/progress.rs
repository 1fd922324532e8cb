//! Progress bar management

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

use super::stats::SyncStatistics;

const DEFAULT_PROGRESS_BAR_LENGTH: u64 = 100;
const PROGRESS_CHARS: &str = "##-";
const PROGRESS_TEMPLATE: &str = "{prefix:.bold} {wide_msg}";
const CLONING_MESSAGE: &str = "cloning...";

/// Creates and configures a progress bar for a repository
pub fn create_progress_bar(
    multi: &MultiProgress,
    style: &ProgressStyle,
    repo_name: &str,
) -> ProgressBar {
    let pb = multi.add(ProgressBar::new(DEFAULT_PROGRESS_BAR_LENGTH));
    pb.set_style(style.clone());
    pb.set_prefix(format!("🟡 {}", repo_name));
    pb.set_message(CLONING_MESSAGE);
    pb
}

/// Creates a progress bar style configuration
pub fn create_progress_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)?
        .progress_chars(PROGRESS_CHARS))
}

/// Adds a blank separator line to the progress display
pub fn create_separator_progress_bar(multi: &MultiProgress) -> ProgressBar {
    let pb = multi.add(ProgressBar::new(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template(" ")
            .expect("separator template is static"),
    );
    pb.finish();
    pb
}

/// Creates the footer progress bar that carries the running summary
pub fn create_footer_progress_bar(multi: &MultiProgress) -> ProgressBar {
    let pb = multi.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{wide_msg}")
        .expect("footer template is static");
    pb.set_style(style);
    pb
}

/// Helper function to safely acquire a lock on the statistics mutex
pub fn acquire_stats_lock(stats: &Mutex<SyncStatistics>) -> std::sync::MutexGuard<'_, SyncStatistics> {
    stats
        .lock()
        .expect("Failed to acquire lock on statistics mutex - mutex may be poisoned")
}
