//! Provider-tagged repository records and catalog merging

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Identifies which hosting provider a record came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTag {
    GitHub,
    GitLab,
}

impl ProviderTag {
    /// Returns the lowercase identifier used in config files and flags
    pub fn name(&self) -> &'static str {
        match self {
            ProviderTag::GitHub => "github",
            ProviderTag::GitLab => "gitlab",
        }
    }

    /// Returns the SSH host alias probed for passwordless access
    pub fn default_host_alias(&self) -> &'static str {
        match self {
            ProviderTag::GitHub => "git@github.com",
            ProviderTag::GitLab => "git@gitlab.com",
        }
    }

    /// Returns the environment variable consulted when no token file is configured
    pub fn default_token_env(&self) -> &'static str {
        match self {
            ProviderTag::GitHub => "GITHUB_TOKEN",
            ProviderTag::GitLab => "GITLAB_TOKEN",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderTag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(ProviderTag::GitHub),
            "gitlab" => Ok(ProviderTag::GitLab),
            other => Err(anyhow::anyhow!("unknown provider: {}", other)),
        }
    }
}

/// One repository owned by the authenticated account
///
/// Names are unique within a provider; the same name may appear under two
/// providers and is treated as two distinct clone targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub name: String,
    pub clone_url: String,
    pub provider: ProviderTag,
}

/// The ordered enumeration result for one provider
#[derive(Clone, Debug)]
pub struct RepositoryCatalog {
    pub provider: ProviderTag,
    pub records: Vec<RepositoryRecord>,
}

impl RepositoryCatalog {
    /// Builds a catalog, ordering records alphabetically by name (case-insensitive)
    pub fn new(provider: ProviderTag, mut records: Vec<RepositoryRecord>) -> Self {
        records.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Self { provider, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flattens per-provider catalogs into one clone batch, preserving
    /// provider order and name order within each provider. Cross-provider
    /// name collisions are kept; the orchestrator reports the loser as a
    /// directory conflict.
    pub fn merge(catalogs: Vec<RepositoryCatalog>) -> Vec<RepositoryRecord> {
        catalogs
            .into_iter()
            .flat_map(|catalog| catalog.records)
            .collect()
    }
}
