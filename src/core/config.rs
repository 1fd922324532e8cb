//! Run configuration
//!
//! Everything the pipeline needs is an explicit value here: the operator's
//! identity, one entry per provider (host alias + token source), the
//! destination directory, and the worker limit. Loaded from a TOML file and
//! overridable by CLI flags; no component reads hidden global state.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::ProviderTag;
use crate::provider::Credential;

// Default concurrency cap to avoid hammering provider rate limits
pub const CLONE_CONCURRENT_CAP: usize = 8;

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = "reposeed";

/// The local operator's configured name and email; immutable per run
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Identity {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    /// The label attached to a registered key: the configured email, else
    /// `user@host`
    pub fn key_title(&self) -> String {
        if let Some(email) = &self.email {
            return email.clone();
        }
        let user = self
            .username
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "reposeed".to_string());
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        format!("{}@{}", user, host)
    }
}

/// One provider to bootstrap and enumerate
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderTag,
    #[serde(default)]
    pub host_alias: Option<String>,
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(default)]
    pub token_env: Option<String>,
}

impl ProviderConfig {
    pub fn for_provider(provider: ProviderTag) -> Self {
        Self {
            provider,
            host_alias: None,
            token_file: None,
            token_env: None,
        }
    }

    /// The SSH host alias probed for passwordless access
    pub fn host_alias(&self) -> String {
        self.host_alias
            .clone()
            .unwrap_or_else(|| self.provider.default_host_alias().to_string())
    }

    /// Reads this provider's bearer token: token file first, then the
    /// configured environment variable, then the provider's default one
    pub fn credential(&self) -> Result<Credential> {
        if let Some(path) = &self.token_file {
            return Credential::from_token_file(path);
        }
        if let Some(var) = &self.token_env {
            return Credential::from_env(var);
        }
        Credential::from_env(self.provider.default_token_env())
    }
}

/// Full configuration for one run
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub identity: Identity,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub dest_dir: Option<PathBuf>,
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl RunConfig {
    /// Parses a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// `~/.config/reposeed/config.toml` on most platforms
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the default config file if present, otherwise an empty config
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// The destination directory, defaulting to `~/src`
    pub fn dest_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dest_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().context("home directory not found")?;
        Ok(home.join("src"))
    }
}

/// Determines the clone worker limit
///
/// Priority order:
/// 1. --sequential flag → 1
/// 2. --jobs N flag (or config `jobs`) → N
/// 3. Smart default → min(CPU_CORES + 2, 8)
pub fn get_clone_concurrency(jobs: Option<usize>, sequential: bool) -> usize {
    if sequential {
        return 1;
    }
    if let Some(n) = jobs {
        return n.max(1); // Ensure at least 1
    }
    let cpu_count = num_cpus::get();
    (cpu_count + 2).min(CLONE_CONCURRENT_CAP)
}
