//! Clone orchestration
//!
//! Reconciles a merged catalog against the destination directory: records
//! whose directory already exists are skipped without I/O, the rest are
//! cloned on a semaphore-bounded worker pool with per-record failure
//! isolation. Results come back in submission order once the whole batch
//! has settled.

pub mod runner;

pub use runner::{CloneRunner, GitCloneRunner};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::catalog::RepositoryRecord;

/// Why a clone failed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// The target directory appeared between the existence check and the
    /// clone, usually a same-named record from another provider
    DirectoryConflict,
    /// The clone process failed or could not be spawned
    Process(String),
}

/// Per-record outcome of a sync run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The repository was cloned this run
    Cloned,
    /// The directory already existed; nothing was done
    Skipped,
    /// The clone failed; sibling records are unaffected
    Failed(FailureReason),
}

impl SyncOutcome {
    /// Returns the emoji symbol for this outcome
    pub fn symbol(&self) -> &str {
        match self {
            SyncOutcome::Cloned => "🟢",
            SyncOutcome::Skipped => "🟠",
            SyncOutcome::Failed(_) => "🔴",
        }
    }

    /// Returns the text representation of this outcome
    pub fn text(&self) -> &str {
        match self {
            SyncOutcome::Cloned => "cloned",
            SyncOutcome::Skipped => "skip",
            SyncOutcome::Failed(FailureReason::DirectoryConflict) => "conflict",
            SyncOutcome::Failed(FailureReason::Process(_)) => "failed",
        }
    }
}

/// One record's result; produced exactly once per record per run
#[derive(Clone, Debug)]
pub struct SyncResult {
    pub record: RepositoryRecord,
    pub outcome: SyncOutcome,
    pub message: String,
}

/// Clones missing repositories with bounded concurrency
pub struct CloneOrchestrator {
    runner: Arc<dyn CloneRunner>,
    max_concurrency: usize,
}

impl CloneOrchestrator {
    pub fn new(runner: Arc<dyn CloneRunner>, max_concurrency: usize) -> Self {
        Self {
            runner,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Synchronizes the destination with the given records
    pub async fn sync(
        &self,
        records: Vec<RepositoryRecord>,
        dest_dir: &Path,
    ) -> Result<Vec<SyncResult>> {
        self.sync_with(records, dest_dir, |_, _| {}).await
    }

    /// Like `sync`, invoking `notify` with the submission index as each
    /// record settles (drives the progress display)
    pub async fn sync_with<F>(
        &self,
        records: Vec<RepositoryRecord>,
        dest_dir: &Path,
        notify: F,
    ) -> Result<Vec<SyncResult>>
    where
        F: Fn(usize, &SyncResult) + Send + Sync,
    {
        // An uncreatable destination is the one condition that aborts the
        // whole run
        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("creating destination directory {}", dest_dir.display()))?;

        let total = records.len();
        let mut results: Vec<Option<SyncResult>> = (0..total).map(|_| None).collect();

        // Existence pass first: repeated runs settle everything here with
        // zero clone invocations
        let mut pending: Vec<(usize, RepositoryRecord, PathBuf)> = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            let target = dest_dir.join(&record.name);
            if target.exists() {
                let result = SyncResult {
                    record,
                    outcome: SyncOutcome::Skipped,
                    message: "already present".to_string(),
                };
                notify(index, &result);
                results[index] = Some(result);
            } else {
                pending.push((index, record, target));
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut futures = FuturesUnordered::new();

        for (index, record, target) in pending {
            let semaphore = Arc::clone(&semaphore);
            let runner = Arc::clone(&self.runner);
            let dest = dest_dir.to_path_buf();

            futures.push(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("failed to acquire semaphore permit for clone worker");

                // Re-check at dispatch: a sibling worker may have created
                // the directory since the existence pass (same-named
                // records from two providers land here)
                if target.exists() {
                    let result = SyncResult {
                        record,
                        outcome: SyncOutcome::Failed(FailureReason::DirectoryConflict),
                        message: format!("{} already exists", target.display()),
                    };
                    return (index, result);
                }

                let result = match runner.clone_repository(&record.clone_url, &dest).await {
                    Ok(output) => SyncResult {
                        record,
                        outcome: SyncOutcome::Cloned,
                        message: output,
                    },
                    Err(e) => {
                        let message = e.to_string();
                        // If the target exists after a failed clone, a
                        // sibling won the race for the name
                        let outcome = if target.exists() {
                            SyncOutcome::Failed(FailureReason::DirectoryConflict)
                        } else {
                            SyncOutcome::Failed(FailureReason::Process(message.clone()))
                        };
                        SyncResult {
                            record,
                            outcome,
                            message,
                        }
                    }
                };
                (index, result)
            });
        }

        while let Some((index, result)) = futures.next().await {
            notify(index, &result);
            results[index] = Some(result);
        }

        Ok(results
            .into_iter()
            .map(|r| r.expect("every record settles exactly once"))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProviderTag;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn record(name: &str, url: &str, provider: ProviderTag) -> RepositoryRecord {
        RepositoryRecord {
            name: name.to_string(),
            clone_url: url.to_string(),
            provider,
        }
    }

    /// Scripted runner: records invocations, optionally delays, optionally
    /// fails for specific urls, and creates the target directory the way a
    /// real clone would.
    #[derive(Default)]
    struct FakeRunner {
        invocations: Mutex<Vec<String>>,
        fail_urls: Vec<String>,
        delay_ms: u64,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeRunner {
        fn invocation_count(&self) -> usize {
            self.invocations.lock().unwrap().len()
        }

        fn dir_name_for(url: &str) -> &str {
            url.rsplit('/')
                .next()
                .unwrap_or(url)
                .trim_end_matches(".git")
        }
    }

    #[async_trait]
    impl CloneRunner for FakeRunner {
        async fn clone_repository(&self, url: &str, dest_dir: &Path) -> Result<String> {
            self.invocations.lock().unwrap().push(url.to_string());

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            // Like git, fail without leaving a directory behind
            if self.fail_urls.iter().any(|f| f == url) {
                anyhow::bail!("fatal: could not read from remote repository");
            }
            let target = dest_dir.join(Self::dir_name_for(url));
            if target.exists() {
                anyhow::bail!("fatal: destination path '{}' already exists", url);
            }
            std::fs::create_dir_all(&target)?;
            Ok(format!("Cloning into '{}'...", Self::dir_name_for(url)))
        }
    }

    #[tokio::test]
    async fn test_existing_directory_is_skipped_without_io() {
        let dest = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir(dest.path().join("a")).unwrap();

        let runner = Arc::new(FakeRunner::default());
        let orchestrator = CloneOrchestrator::new(Arc::clone(&runner) as Arc<dyn CloneRunner>, 2);

        let results = orchestrator
            .sync(
                vec![
                    record("a", "git@github.com:me/a.git", ProviderTag::GitHub),
                    record("b", "git@github.com:me/b.git", ProviderTag::GitHub),
                ],
                dest.path(),
            )
            .await
            .expect("sync should succeed");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].outcome, SyncOutcome::Skipped);
        assert_eq!(results[1].outcome, SyncOutcome::Cloned);
        // The skip must cost zero clone invocations
        let invocations = runner.invocations.lock().unwrap();
        assert_eq!(*invocations, vec!["git@github.com:me/b.git"]);
    }

    #[tokio::test]
    async fn test_second_run_is_fully_idempotent() {
        let dest = tempfile::tempdir().expect("temp dir");
        let runner = Arc::new(FakeRunner::default());
        let orchestrator = CloneOrchestrator::new(Arc::clone(&runner) as Arc<dyn CloneRunner>, 4);

        let catalog = vec![
            record("a", "git@github.com:me/a.git", ProviderTag::GitHub),
            record("b", "git@github.com:me/b.git", ProviderTag::GitHub),
            record("c", "git@github.com:me/c.git", ProviderTag::GitHub),
        ];

        let first = orchestrator
            .sync(catalog.clone(), dest.path())
            .await
            .expect("first run");
        assert!(first.iter().all(|r| r.outcome == SyncOutcome::Cloned));
        assert_eq!(runner.invocation_count(), 3);

        let second = orchestrator
            .sync(catalog, dest.path())
            .await
            .expect("second run");
        assert!(second.iter().all(|r| r.outcome == SyncOutcome::Skipped));
        // No further clone invocations on the second run
        assert_eq!(runner.invocation_count(), 3);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_siblings() {
        let dest = tempfile::tempdir().expect("temp dir");
        let runner = Arc::new(FakeRunner {
            fail_urls: vec!["git@github.com:me/bad.git".to_string()],
            ..Default::default()
        });
        let orchestrator = CloneOrchestrator::new(Arc::clone(&runner) as Arc<dyn CloneRunner>, 2);

        let results = orchestrator
            .sync(
                vec![
                    record("a", "git@github.com:me/a.git", ProviderTag::GitHub),
                    record("bad", "git@github.com:me/bad.git", ProviderTag::GitHub),
                    record("c", "git@github.com:me/c.git", ProviderTag::GitHub),
                ],
                dest.path(),
            )
            .await
            .expect("sync should succeed");

        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results
            .iter()
            .filter(|r| matches!(r.outcome, SyncOutcome::Failed(_)))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].record.name, "bad");
        assert_eq!(
            results
                .iter()
                .filter(|r| r.outcome == SyncOutcome::Cloned)
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_cross_provider_collision_reports_conflict() {
        let dest = tempfile::tempdir().expect("temp dir");
        let runner = Arc::new(FakeRunner::default());
        // Sequential so the winner is deterministic
        let orchestrator = CloneOrchestrator::new(Arc::clone(&runner) as Arc<dyn CloneRunner>, 1);

        let results = orchestrator
            .sync(
                vec![
                    record("tools", "git@github.com:me/tools.git", ProviderTag::GitHub),
                    record("tools", "git@gitlab.com:me/tools.git", ProviderTag::GitLab),
                ],
                dest.path(),
            )
            .await
            .expect("sync should succeed");

        assert_eq!(results.len(), 2);
        let cloned = results
            .iter()
            .filter(|r| r.outcome == SyncOutcome::Cloned)
            .count();
        let conflicts = results
            .iter()
            .filter(|r| r.outcome == SyncOutcome::Failed(FailureReason::DirectoryConflict))
            .count();
        assert_eq!(cloned, 1);
        assert_eq!(conflicts, 1);
        // The loser never reached the clone runner
        assert_eq!(runner.invocation_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_stays_bounded() {
        let dest = tempfile::tempdir().expect("temp dir");
        let runner = Arc::new(FakeRunner {
            delay_ms: 30,
            ..Default::default()
        });
        let limit = 3;
        let orchestrator =
            CloneOrchestrator::new(Arc::clone(&runner) as Arc<dyn CloneRunner>, limit);

        let records: Vec<_> = (0..10)
            .map(|i| {
                record(
                    &format!("repo-{}", i),
                    &format!("git@github.com:me/repo-{}.git", i),
                    ProviderTag::GitHub,
                )
            })
            .collect();

        let results = orchestrator
            .sync(records, dest.path())
            .await
            .expect("sync should succeed");

        assert_eq!(results.len(), 10);
        let max_seen = runner.max_in_flight.load(Ordering::SeqCst);
        assert!(
            max_seen <= limit,
            "saw {} clones in flight with limit {}",
            max_seen,
            limit
        );
        assert_eq!(max_seen, limit, "pool should actually fill up");
    }

    #[tokio::test]
    async fn test_results_come_back_in_submission_order() {
        let dest = tempfile::tempdir().expect("temp dir");
        let runner = Arc::new(FakeRunner {
            delay_ms: 5,
            ..Default::default()
        });
        let orchestrator = CloneOrchestrator::new(Arc::clone(&runner) as Arc<dyn CloneRunner>, 4);

        let records: Vec<_> = ["zeta", "alpha", "mid"]
            .iter()
            .map(|name| {
                record(
                    name,
                    &format!("git@github.com:me/{}.git", name),
                    ProviderTag::GitHub,
                )
            })
            .collect();

        let results = orchestrator
            .sync(records, dest.path())
            .await
            .expect("sync should succeed");

        let names: Vec<_> = results.iter().map(|r| r.record.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_end_to_end_skip_and_clone() {
        // Catalog [a, b], destination already contains a/
        let dest = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir(dest.path().join("a")).unwrap();

        let runner = Arc::new(FakeRunner::default());
        let orchestrator = CloneOrchestrator::new(Arc::clone(&runner) as Arc<dyn CloneRunner>, 2);

        let results = orchestrator
            .sync(
                vec![
                    record("a", "u1", ProviderTag::GitHub),
                    record("b", "u2", ProviderTag::GitHub),
                ],
                dest.path(),
            )
            .await
            .expect("sync should succeed");

        assert_eq!(results[0].outcome, SyncOutcome::Skipped);
        assert_eq!(results[1].outcome, SyncOutcome::Cloned);
        let invocations = runner.invocations.lock().unwrap();
        assert_eq!(*invocations, vec!["u2"]);
    }

    #[tokio::test]
    async fn test_notify_reports_each_record_once() {
        let dest = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir(dest.path().join("a")).unwrap();

        let runner = Arc::new(FakeRunner::default());
        let orchestrator = CloneOrchestrator::new(Arc::clone(&runner) as Arc<dyn CloneRunner>, 2);

        let seen = Mutex::new(Vec::new());
        orchestrator
            .sync_with(
                vec![
                    record("a", "u1", ProviderTag::GitHub),
                    record("b", "u2", ProviderTag::GitHub),
                ],
                dest.path(),
                |index, result| {
                    seen.lock().unwrap().push((index, result.outcome.clone()));
                },
            )
            .await
            .expect("sync should succeed");

        let mut seen = seen.into_inner().unwrap();
        seen.sort_by_key(|(index, _)| *index);
        assert_eq!(
            seen,
            vec![(0, SyncOutcome::Skipped), (1, SyncOutcome::Cloned)]
        );
    }
}
