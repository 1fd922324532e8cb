//! Bearer token sourcing
//!
//! A credential is read exactly once from a file or an environment variable
//! and handed to one provider session. It is never written back out and
//! never appears in Debug output.

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

/// An opaque bearer token for one provider
pub struct Credential(String);

impl Credential {
    /// Reads a token from the first line of a file, trimmed
    pub fn from_token_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading token file {}", path.display()))?;
        let token = content.lines().next().unwrap_or("").trim();
        if token.is_empty() {
            anyhow::bail!("token file {} is empty", path.display());
        }
        Ok(Self(token.to_string()))
    }

    /// Reads a token from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let token = std::env::var(var)
            .with_context(|| format!("environment variable {} is not set", var))?;
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("environment variable {} is empty", var);
        }
        Ok(Self(token.to_string()))
    }

    /// Returns the raw token for the authenticating call
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
