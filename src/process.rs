//! External command execution
//!
//! Every component that shells out (ssh probing, key generation, cloning)
//! goes through `run_command` so timeouts and output capture behave the
//! same way everywhere.

use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

// Timeout constants
pub const CLONE_TIMEOUT_SECS: u64 = 180; // 3 minutes per repository
pub const PROBE_TIMEOUT_SECS: u64 = 15; // SSH handshake must never hang the run
pub const KEYGEN_TIMEOUT_SECS: u64 = 30;

/// Runs an external command in the specified directory with a timeout
/// Returns (success, stdout, stderr)
pub async fn run_command(
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout_secs: u64,
) -> Result<(bool, String, String)> {
    let timeout_duration = Duration::from_secs(timeout_secs);

    let result = tokio::time::timeout(
        timeout_duration,
        Command::new(program).args(args).current_dir(cwd).output(),
    )
    .await;

    match result {
        Ok(Ok(output)) => Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        )),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(anyhow::anyhow!(
            "{} timed out after {} seconds",
            program,
            timeout_secs
        )),
    }
}
