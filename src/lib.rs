//! # reposeed
//!
//! `reposeed` provisions a new machine against one or more code-hosting
//! providers in a single idempotent run. It powers the `reposeed` CLI tool.
//!
//! ## Core Features
//!
//! - **Passwordless Trust**: Probes SSH access, generates a key pair only
//!   when absent, and registers the public key with each provider exactly
//!   once.
//! - **Multi-Provider Catalogs**: Enumerates every repository the account
//!   owns on GitHub and GitLab behind one session abstraction.
//! - **Concurrent Cloning**: Clones missing repositories on a bounded
//!   worker pool with per-repository failure isolation.
//! - **Idempotent Sync**: Repositories already present on disk are skipped;
//!   repeated runs perform zero clone invocations.
//!
//! ## Example
//!
//! ```rust,no_run
//! use reposeed::catalog::{ProviderTag, RepositoryRecord};
//! use reposeed::cloner::{CloneOrchestrator, GitCloneRunner};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let records = vec![RepositoryRecord {
//!         name: "dotfiles".to_string(),
//!         clone_url: "git@github.com:me/dotfiles.git".to_string(),
//!         provider: ProviderTag::GitHub,
//!     }];
//!     let orchestrator = CloneOrchestrator::new(Arc::new(GitCloneRunner), 4);
//!     for result in orchestrator.sync(records, Path::new("/home/me/src")).await? {
//!         println!("{}: {}", result.record.name, result.outcome.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cloner;
pub mod commands;
pub mod core;
pub mod process;
pub mod provider;
pub mod ssh;
pub mod utils;
