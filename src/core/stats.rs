//! Statistics tracking and reporting

use std::time::Duration;

use crate::cloner::{FailureReason, SyncOutcome, SyncResult};
use crate::utils::shorten_path;

/// Statistics for tracking one run's outcomes
#[derive(Clone, Default)]
pub struct SyncStatistics {
    pub cloned_repos: u32,
    pub skipped_repos: u32,
    pub error_repos: u32,
    pub failed_repos: Vec<(String, String, String)>, // (repo_name, clone_url, error_message)
    pub registration_warnings: Vec<(String, String)>, // (provider, reason)
    pub provider_errors: Vec<(String, String)>,      // (provider, reason)
}

impl SyncStatistics {
    /// Creates a new statistics tracker with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on one record's sync result
    pub fn update(&mut self, result: &SyncResult) {
        match &result.outcome {
            SyncOutcome::Cloned => self.cloned_repos += 1,
            SyncOutcome::Skipped => self.skipped_repos += 1,
            SyncOutcome::Failed(reason) => {
                self.error_repos += 1;
                let message = match reason {
                    FailureReason::DirectoryConflict => "directory conflict".to_string(),
                    FailureReason::Process(_) => clean_error_message(&result.message),
                };
                self.failed_repos.push((
                    format!("{} ({})", result.record.name, result.record.provider),
                    result.record.clone_url.clone(),
                    message,
                ));
            }
        }
    }

    /// Records a non-fatal key registration rejection for a provider
    pub fn note_registration_rejected(&mut self, provider: &str, reason: &str) {
        self.registration_warnings
            .push((provider.to_string(), reason.to_string()));
    }

    /// Records a provider that could not be bootstrapped at all
    pub fn note_provider_failed(&mut self, provider: &str, reason: &str) {
        self.provider_errors
            .push((provider.to_string(), clean_error_message(reason)));
    }

    /// Whether the run's exit status should be non-zero
    pub fn has_failures(&self) -> bool {
        self.error_repos > 0 || !self.provider_errors.is_empty()
    }

    /// Generates the one-line footer summary
    pub fn generate_summary(&self, duration: Duration) -> String {
        let duration_secs = duration.as_secs_f64();

        if self.error_repos > 0 {
            format!(
                "✅ Completed in {:.1}s • {} cloned • {} skipped • {} failed",
                duration_secs, self.cloned_repos, self.skipped_repos, self.error_repos
            )
        } else {
            format!(
                "✅ Completed in {:.1}s • {} cloned • {} skipped",
                duration_secs, self.cloned_repos, self.skipped_repos
            )
        }
    }

    /// Generates detailed warning messages for anything needing attention
    pub fn generate_detailed_summary(&self) -> String {
        let mut lines = Vec::new();

        // Failed clones get priority
        if !self.failed_repos.is_empty() {
            lines.push(format!("🔴 FAILED CLONES ({})", self.failed_repos.len()));
            for (i, (repo_name, clone_url, error)) in self.failed_repos.iter().enumerate() {
                let tree_char = if i == self.failed_repos.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                let short_url = shorten_path(clone_url, 30);
                lines.push(format!(
                    "   {} {:20} {:30} # {}",
                    tree_char, repo_name, short_url, error
                ));
            }
            lines.push(String::new()); // Add blank line
        }

        // Providers that could not be bootstrapped
        if !self.provider_errors.is_empty() {
            lines.push(format!("🔴 PROVIDER ERRORS ({})", self.provider_errors.len()));
            for (i, (provider, reason)) in self.provider_errors.iter().enumerate() {
                let tree_char = if i == self.provider_errors.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                lines.push(format!("   {} {:20} # {}", tree_char, provider, reason));
            }
            lines.push(String::new()); // Add blank line
        }

        // Rejected key registrations
        if !self.registration_warnings.is_empty() {
            lines.push(format!(
                "🟡 KEY REGISTRATION WARNINGS ({})",
                self.registration_warnings.len()
            ));
            for (i, (provider, reason)) in self.registration_warnings.iter().enumerate() {
                let tree_char = if i == self.registration_warnings.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                lines.push(format!("   {} {:20} # {}", tree_char, provider, reason));
            }
        }

        // Remove trailing blank line if it exists
        if lines.last() == Some(&String::new()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

/// Cleans and formats error messages for display
pub fn clean_error_message(error: &str) -> String {
    // Replace newlines/tabs with spaces and collapse whitespace
    let cleaned = error.replace('\n', " ").replace('\r', "").replace('\t', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    // Extract key error patterns
    if cleaned.contains("already exists") {
        "directory conflict".to_string()
    } else if cleaned.contains("Permission denied (publickey)") {
        "ssh authentication failed".to_string()
    } else if cleaned.contains("authentication failed") || cleaned.contains("Permission denied") {
        "authentication failed".to_string()
    } else if cleaned.contains("timed out") {
        "timeout".to_string()
    } else if cleaned.contains("Could not resolve host")
        || cleaned.contains("Connection")
        || cleaned.contains("network")
    {
        "network error".to_string()
    } else if cleaned.chars().count() > 40 {
        // Truncate long messages on a character boundary; git stderr can
        // echo non-ASCII paths and URLs
        let truncated: String = cleaned.chars().take(37).collect();
        format!("{}...", truncated)
    } else {
        cleaned
    }
}
