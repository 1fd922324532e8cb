//! Full bootstrap-and-sync pipeline
//!
//! Per provider, sequentially: authenticate, ensure passwordless SSH trust,
//! enumerate repositories. Then the merged catalog is handed to the clone
//! orchestrator, which fans out on a bounded worker pool while this module
//! drives the progress display.

use anyhow::Result;
use indicatif::MultiProgress;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::catalog::RepositoryCatalog;
use crate::cloner::{CloneOrchestrator, GitCloneRunner, SyncOutcome};
use crate::core::{
    acquire_stats_lock, clean_error_message, create_footer_progress_bar, create_progress_bar,
    create_progress_style, create_separator_progress_bar, Identity, ProviderConfig, RunConfig,
    SyncStatistics,
};
use crate::provider;
use crate::ssh::{SshIdentity, SshProbe, SshTrustManager, TrustState};
use crate::utils::{set_terminal_title, set_terminal_title_and_flush};

const NO_PROVIDERS_MESSAGE: &str =
    "No providers configured. Add one to the config file or pass --github/--gitlab.";
const NO_REPOS_MESSAGE: &str = "No repositories found for the configured providers.";

/// Handles the sync command. Returns true when any clone failed or a
/// provider could not be bootstrapped (mapped to a non-zero exit).
pub async fn handle_sync_command(config: RunConfig, concurrency: usize) -> Result<bool> {
    set_terminal_title("🚀 reposeed");
    println!();

    if config.providers.is_empty() {
        println!("{}", NO_PROVIDERS_MESSAGE);
        set_terminal_title_and_flush("✅ reposeed");
        return Ok(false);
    }

    let ssh_identity = SshIdentity::default_location()?;
    let mut statistics = SyncStatistics::new();
    let mut catalogs = Vec::new();

    // Trust establishment and enumeration are sequential per provider; a
    // failing provider is reported and the rest continue
    for provider_config in &config.providers {
        let tag = provider_config.provider;
        print!("🔐 {}: ", tag.name());
        let _ = std::io::stdout().flush();

        match bootstrap_provider(provider_config, &config.identity, &ssh_identity).await {
            Ok((state, catalog)) => {
                println!(
                    "{} {} • {} repositories",
                    state.symbol(),
                    state.text(),
                    catalog.len()
                );
                if let TrustState::RegistrationRejected { reason } = &state {
                    statistics.note_registration_rejected(tag.name(), reason);
                }
                catalogs.push(catalog);
            }
            Err(e) => {
                println!("🔴 {}", e);
                statistics.note_provider_failed(tag.name(), &e.to_string());
            }
        }
    }

    let records = RepositoryCatalog::merge(catalogs);
    if records.is_empty() {
        println!("{}", NO_REPOS_MESSAGE);
        set_terminal_title_and_flush("✅ reposeed");
        return Ok(statistics.has_failures());
    }

    let dest_dir = config.dest_dir()?;
    let total = records.len();
    let repo_word = if total == 1 {
        "repository"
    } else {
        "repositories"
    };
    println!("\n🚀 Syncing {} {} into {}\n", total, repo_word, dest_dir.display());

    // Per-record progress bars first, then separator, footer, separator
    let multi_progress = MultiProgress::new();
    let progress_style = create_progress_style()?;
    let max_name_length = records.iter().map(|r| r.name.len()).max().unwrap_or(0);

    let mut progress_bars = Vec::new();
    for record in &records {
        progress_bars.push(create_progress_bar(
            &multi_progress,
            &progress_style,
            &record.name,
        ));
    }
    let _separator = create_separator_progress_bar(&multi_progress);
    let footer_pb = create_footer_progress_bar(&multi_progress);
    let _separator_below = create_separator_progress_bar(&multi_progress);

    let start_time = std::time::Instant::now();
    let statistics = Mutex::new(statistics);
    footer_pb.set_message(acquire_stats_lock(&statistics).generate_summary(start_time.elapsed()));

    let orchestrator = CloneOrchestrator::new(Arc::new(GitCloneRunner), concurrency);
    orchestrator
        .sync_with(records, &dest_dir, |index, result| {
            let display_message = match &result.outcome {
                SyncOutcome::Cloned => "done".to_string(),
                SyncOutcome::Skipped => "already present".to_string(),
                SyncOutcome::Failed(_) => clean_error_message(&result.message),
            };

            let progress_bar = &progress_bars[index];
            progress_bar.set_prefix(format!(
                "{} {:width$}",
                result.outcome.symbol(),
                result.record.name,
                width = max_name_length
            ));
            progress_bar.set_message(format!("{:<10}   {}", result.outcome.text(), display_message));
            progress_bar.finish();

            // Update statistics and the footer as each record settles
            let mut stats_guard = acquire_stats_lock(&statistics);
            stats_guard.update(result);
            footer_pb.set_message(stats_guard.generate_summary(start_time.elapsed()));
        })
        .await?;

    footer_pb.finish();

    // Print the final detailed summary if there is anything to report
    let final_stats = acquire_stats_lock(&statistics);
    let detailed_summary = final_stats.generate_detailed_summary();
    if !detailed_summary.is_empty() {
        println!("\n{}", "━".repeat(70));
        println!("{}", detailed_summary);
        println!("{}", "━".repeat(70));
    }
    println!();

    set_terminal_title_and_flush("✅ reposeed");
    Ok(final_stats.has_failures())
}

/// Opens a session, ensures passwordless trust, and enumerates one
/// provider's repositories
async fn bootstrap_provider(
    provider_config: &ProviderConfig,
    identity: &Identity,
    ssh_identity: &SshIdentity,
) -> Result<(TrustState, RepositoryCatalog)> {
    let credential = provider_config.credential()?;
    let session = provider::open(provider_config.provider, credential).await?;

    let probe = SshProbe;
    let manager = SshTrustManager::new(&probe, ssh_identity);
    let key_title = identity.key_title();
    let state = manager
        .ensure(
            session.as_ref(),
            &provider_config.host_alias(),
            &key_title,
            &key_title,
        )
        .await?;

    let records = session.list_repositories().await?;
    Ok((
        state,
        RepositoryCatalog::new(provider_config.provider, records),
    ))
}
