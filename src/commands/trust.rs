//! Trust-only command: establish passwordless SSH access per provider
//! without enumerating or cloning anything.

use anyhow::Result;

use crate::core::RunConfig;
use crate::provider;
use crate::ssh::{SshIdentity, SshProbe, SshTrustManager};
use crate::utils::set_terminal_title_and_flush;

const NO_PROVIDERS_MESSAGE: &str =
    "No providers configured. Add one to the config file or pass --github/--gitlab.";

/// Handles the trust command. Returns true when any provider failed.
pub async fn handle_trust_command(config: RunConfig) -> Result<bool> {
    println!();
    if config.providers.is_empty() {
        println!("{}", NO_PROVIDERS_MESSAGE);
        return Ok(false);
    }

    let ssh_identity = SshIdentity::default_location()?;
    let probe = SshProbe;
    let manager = SshTrustManager::new(&probe, &ssh_identity);
    let key_title = config.identity.key_title();

    let mut any_failed = false;
    for provider_config in &config.providers {
        let tag = provider_config.provider;
        let outcome = async {
            let credential = provider_config.credential()?;
            let session = provider::open(tag, credential).await?;
            let state = manager
                .ensure(
                    session.as_ref(),
                    &provider_config.host_alias(),
                    &key_title,
                    &key_title,
                )
                .await?;
            Ok::<_, anyhow::Error>(state)
        }
        .await;

        match outcome {
            Ok(state) => println!("{} {:10} {}", state.symbol(), tag.name(), state.text()),
            Err(e) => {
                any_failed = true;
                println!("🔴 {:10} {}", tag.name(), e);
            }
        }
    }

    println!();
    set_terminal_title_and_flush("✅ reposeed");
    Ok(any_failed)
}
