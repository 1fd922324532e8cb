//! Trust establishment state machine
//!
//! `ensure` walks one provider through probe → keygen → register. Probing
//! gates registration: registering a key is the one non-idempotent remote
//! effect, so it only happens when the probe reports untrusted. Key
//! generation has its own independent generate-if-absent guard.

use anyhow::Result;

use super::identity::SshIdentity;
use super::probe::TrustProbe;
use crate::provider::{ProviderError, ProviderSession};

/// Terminal state reached by `ensure` for one provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrustState {
    /// The probe succeeded; nothing was generated or registered
    AlreadyTrusted,
    /// A public key was registered with the provider this run
    Registered { generated_key: bool },
    /// The provider rejected the key (usually a duplicate). Non-fatal:
    /// reported and the run continues.
    RegistrationRejected { reason: String },
}

impl TrustState {
    /// Returns the emoji symbol for this state
    pub fn symbol(&self) -> &str {
        match self {
            TrustState::AlreadyTrusted | TrustState::Registered { .. } => "🟢",
            TrustState::RegistrationRejected { .. } => "🟡",
        }
    }

    /// Returns the text representation of this state
    pub fn text(&self) -> &str {
        match self {
            TrustState::AlreadyTrusted => "trusted",
            TrustState::Registered {
                generated_key: true,
            } => "key-generated-and-registered",
            TrustState::Registered {
                generated_key: false,
            } => "key-registered",
            TrustState::RegistrationRejected { .. } => "key-rejected",
        }
    }
}

/// Orchestrates probe, identity, and provider session to guarantee
/// passwordless access for one provider, idempotently
pub struct SshTrustManager<'a> {
    probe: &'a dyn TrustProbe,
    identity: &'a SshIdentity,
}

impl<'a> SshTrustManager<'a> {
    pub fn new(probe: &'a dyn TrustProbe, identity: &'a SshIdentity) -> Self {
        Self { probe, identity }
    }

    /// Ensures `host_alias` accepts the local key for this provider's
    /// account. The fast path (already trusted) has zero side effects.
    /// Auth and API failures are fatal for this provider only.
    pub async fn ensure(
        &self,
        provider: &dyn ProviderSession,
        host_alias: &str,
        key_title: &str,
        key_comment: &str,
    ) -> Result<TrustState> {
        if self
            .probe
            .is_password_free(host_alias, provider.identity_marker())
            .await
        {
            return Ok(TrustState::AlreadyTrusted);
        }

        let (public_key, generated_key) = self.identity.ensure(key_comment).await?;

        match provider.register_key(key_title, &public_key).await {
            Ok(()) => Ok(TrustState::Registered { generated_key }),
            Err(ProviderError::Registration(reason)) => {
                Ok(TrustState::RegistrationRejected { reason })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ProviderTag, RepositoryRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeProbe {
        trusted: bool,
    }

    #[async_trait]
    impl TrustProbe for FakeProbe {
        async fn is_password_free(&self, _host_alias: &str, _identity_marker: &str) -> bool {
            self.trusted
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        register_calls: AtomicUsize,
        registered_keys: Mutex<Vec<(String, String)>>,
        reject_registration: bool,
        fail_auth: bool,
    }

    #[async_trait]
    impl ProviderSession for FakeProvider {
        fn tag(&self) -> ProviderTag {
            ProviderTag::GitHub
        }

        fn identity_marker(&self) -> &str {
            "octocat"
        }

        async fn register_key(&self, title: &str, key: &str) -> Result<(), ProviderError> {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_auth {
                return Err(ProviderError::Auth("token expired".to_string()));
            }
            if self.reject_registration {
                return Err(ProviderError::Registration(
                    "key is already registered".to_string(),
                ));
            }
            self.registered_keys
                .lock()
                .unwrap()
                .push((title.to_string(), key.to_string()));
            Ok(())
        }

        async fn list_repositories(&self) -> Result<Vec<RepositoryRecord>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn identity_with_key(dir: &std::path::Path) -> SshIdentity {
        std::fs::write(dir.join("id_rsa"), "PRIVATE KEY MATERIAL").unwrap();
        std::fs::write(dir.join("id_rsa.pub"), "ssh-rsa AAAA luc@work\n").unwrap();
        SshIdentity::at(dir.join("id_rsa"))
    }

    #[tokio::test]
    async fn test_trusted_host_short_circuits() {
        let dir = tempfile::tempdir().expect("temp dir");
        // No key on disk at all: the fast path must not need one
        let identity = SshIdentity::at(dir.path().join("id_rsa"));
        let probe = FakeProbe { trusted: true };
        let provider = FakeProvider::default();

        let manager = SshTrustManager::new(&probe, &identity);
        let state = manager
            .ensure(&provider, "git@github.com", "luc@work", "luc@work")
            .await
            .expect("ensure should succeed");

        assert_eq!(state, TrustState::AlreadyTrusted);
        assert_eq!(provider.register_calls.load(Ordering::SeqCst), 0);
        assert!(!identity.exists());
    }

    #[tokio::test]
    async fn test_untrusted_host_registers_existing_key() {
        let dir = tempfile::tempdir().expect("temp dir");
        let identity = identity_with_key(dir.path());
        let probe = FakeProbe { trusted: false };
        let provider = FakeProvider::default();

        let manager = SshTrustManager::new(&probe, &identity);
        let state = manager
            .ensure(&provider, "git@github.com", "luc@work", "luc@work")
            .await
            .expect("ensure should succeed");

        assert_eq!(
            state,
            TrustState::Registered {
                generated_key: false
            }
        );
        assert_eq!(state.text(), "key-registered");
        let keys = provider.registered_keys.lock().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].0, "luc@work");
        assert_eq!(keys[0].1, "ssh-rsa AAAA luc@work");
    }

    #[test]
    fn test_text_reports_whether_a_key_was_generated() {
        let generated = TrustState::Registered {
            generated_key: true,
        };
        assert_eq!(generated.text(), "key-generated-and-registered");
        let reused = TrustState::Registered {
            generated_key: false,
        };
        assert_eq!(reused.text(), "key-registered");
    }

    #[tokio::test]
    async fn test_duplicate_key_rejection_is_not_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        let identity = identity_with_key(dir.path());
        let probe = FakeProbe { trusted: false };
        let provider = FakeProvider {
            reject_registration: true,
            ..Default::default()
        };

        let manager = SshTrustManager::new(&probe, &identity);
        let state = manager
            .ensure(&provider, "git@github.com", "luc@work", "luc@work")
            .await
            .expect("rejection must not surface as Err");

        assert!(matches!(state, TrustState::RegistrationRejected { .. }));
    }

    #[tokio::test]
    async fn test_auth_failure_is_fatal_for_provider() {
        let dir = tempfile::tempdir().expect("temp dir");
        let identity = identity_with_key(dir.path());
        let probe = FakeProbe { trusted: false };
        let provider = FakeProvider {
            fail_auth: true,
            ..Default::default()
        };

        let manager = SshTrustManager::new(&probe, &identity);
        let result = manager
            .ensure(&provider, "git@github.com", "luc@work", "luc@work")
            .await;

        assert!(result.is_err());
    }
}
