//! Provider session abstraction
//!
//! Each hosting provider implements the same capability set: authenticate
//! with a bearer token, register an SSH public key, and enumerate the
//! repositories the account owns. Callers never branch on provider identity
//! outside this module.

pub mod credential;
pub mod github;
pub mod gitlab;

pub use credential::Credential;

use crate::catalog::{ProviderTag, RepositoryRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Failures scoped to one provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The credential is missing, malformed, or was rejected remotely.
    /// Fatal for this provider; other providers continue.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// The remote rejected the key, usually because the same key content is
    /// already registered. Non-fatal; logged and the run continues.
    #[error("key registration rejected: {0}")]
    Registration(String),
    /// Any other API failure (network, unexpected status, bad payload)
    #[error("provider API error: {0}")]
    Api(String),
}

/// An authenticated session against one hosting provider
#[async_trait]
pub trait ProviderSession: Send + Sync {
    /// Which provider this session talks to
    fn tag(&self) -> ProviderTag;

    /// The account identity echoed by the provider's SSH endpoint on a
    /// successful handshake (the login name). Used by the trust probe.
    fn identity_marker(&self) -> &str;

    /// Registers an SSH public key under the given title
    async fn register_key(&self, title: &str, key: &str) -> Result<(), ProviderError>;

    /// Enumerates all repositories owned by the authenticated account.
    /// Pagination is handled internally; one full pass per call.
    async fn list_repositories(&self) -> Result<Vec<RepositoryRecord>, ProviderError>;
}

/// Opens an authenticated session for the given provider
pub async fn open(
    tag: ProviderTag,
    credential: Credential,
) -> Result<Box<dyn ProviderSession>, ProviderError> {
    match tag {
        ProviderTag::GitHub => Ok(Box::new(github::GitHubSession::open(credential).await?)),
        ProviderTag::GitLab => Ok(Box::new(gitlab::GitLabSession::open(credential).await?)),
    }
}
