//! Local SSH key pair management

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::process::{run_command, KEYGEN_TIMEOUT_SECS};

/// The local RSA key pair used for passwordless provider access
///
/// The key lives on the filesystem; only the public key text is ever held
/// in memory, and only for the duration of a registration call.
pub struct SshIdentity {
    private_path: PathBuf,
    public_path: PathBuf,
}

impl SshIdentity {
    /// The default identity location, `~/.ssh/id_rsa`
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().context("home directory not found")?;
        Ok(Self::at(home.join(".ssh").join("id_rsa")))
    }

    /// An identity rooted at an explicit private key path
    pub fn at(private_path: PathBuf) -> Self {
        let public_path = private_path.with_extension("pub");
        Self {
            private_path,
            public_path,
        }
    }

    pub fn private_path(&self) -> &Path {
        &self.private_path
    }

    /// Whether a private key already exists at the identity location
    pub fn exists(&self) -> bool {
        self.private_path.exists()
    }

    /// Generates a fresh RSA key pair with no passphrase, non-interactively.
    /// Callers must check `exists()` first; ssh-keygen will not overwrite.
    pub async fn generate(&self, comment: &str) -> Result<String> {
        if let Some(parent) = self.private_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating key directory {}", parent.display()))?;
        }

        let private = self.private_path.to_string_lossy().to_string();
        let args = [
            "-t",
            "rsa",
            "-q",
            "-N",
            "",
            "-C",
            comment,
            "-f",
            private.as_str(),
        ];
        let cwd = std::env::temp_dir();

        let (success, _, stderr) = run_command("ssh-keygen", &args, &cwd, KEYGEN_TIMEOUT_SECS)
            .await
            .context("spawning ssh-keygen")?;
        if !success {
            anyhow::bail!("ssh-keygen failed: {}", stderr);
        }

        self.public_key_text()
    }

    /// Returns the trimmed single-line public key text
    pub fn public_key_text(&self) -> Result<String> {
        let content = std::fs::read_to_string(&self.public_path)
            .with_context(|| format!("public key not found at {}", self.public_path.display()))?;
        Ok(content.lines().next().unwrap_or("").trim().to_string())
    }

    /// Generate-if-absent. Returns the public key text and whether a new
    /// pair was generated this call. This is the at-most-once guard for
    /// key creation within a run.
    pub async fn ensure(&self, comment: &str) -> Result<(String, bool)> {
        if self.exists() {
            Ok((self.public_key_text()?, false))
        } else {
            Ok((self.generate(comment).await?, true))
        }
    }
}
