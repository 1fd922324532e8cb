//! Common test utilities and helpers
#![allow(dead_code)]

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Checks whether git is available on the test machine
pub fn is_git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn run_git(cwd: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git").args(args).current_dir(cwd).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

/// Creates a bare repository named `<name>.git` under `root` with one
/// commit. Cloning it produces a working copy named `<name>`.
pub fn create_source_repo(root: &Path, name: &str) -> Result<PathBuf> {
    let work = root.join(format!("{}-work", name));
    std::fs::create_dir_all(&work)?;
    run_git(&work, &["init", "-q"])?;
    run_git(&work, &["config", "user.email", "test@example.com"])?;
    run_git(&work, &["config", "user.name", "Test User"])?;
    std::fs::write(work.join("README.md"), format!("# {}\n", name))?;
    run_git(&work, &["add", "."])?;
    run_git(&work, &["commit", "-q", "-m", "initial commit"])?;

    let bare = root.join(format!("{}.git", name));
    run_git(
        root,
        &[
            "clone",
            "-q",
            "--bare",
            work.to_str().expect("utf-8 path"),
            bare.to_str().expect("utf-8 path"),
        ],
    )?;
    Ok(bare)
}
