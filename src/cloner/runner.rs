//! Clone execution seam

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::process::{run_command, CLONE_TIMEOUT_SECS};

/// Executes a single clone. The orchestrator depends on this trait so tests
/// can substitute a scripted runner.
#[async_trait]
pub trait CloneRunner: Send + Sync {
    /// Clones `url` into a subdirectory of `dest_dir` (named by the remote
    /// repository). Returns the combined process output on success.
    async fn clone_repository(&self, url: &str, dest_dir: &Path) -> Result<String>;
}

/// Production runner that shells out to `git clone`
pub struct GitCloneRunner;

#[async_trait]
impl CloneRunner for GitCloneRunner {
    async fn clone_repository(&self, url: &str, dest_dir: &Path) -> Result<String> {
        let (success, stdout, stderr) =
            run_command("git", &["clone", url], dest_dir, CLONE_TIMEOUT_SECS).await?;

        // git clone narrates on stderr even when it succeeds
        let output = if stderr.is_empty() { stdout } else { stderr };
        if success {
            Ok(output)
        } else {
            anyhow::bail!("{}", output)
        }
    }
}
