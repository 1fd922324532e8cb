//! Core infrastructure for the bootstrap pipeline
//!
//! This module provides:
//! - Run configuration (identity, providers, destination, worker limit)
//! - Statistics tracking and reporting
//! - Progress bar management

pub mod config;
pub mod progress;
pub mod stats;

pub use config::{
    get_clone_concurrency, Identity, ProviderConfig, RunConfig, CLONE_CONCURRENT_CAP,
};
pub use stats::{clean_error_message, SyncStatistics};

pub(crate) use progress::{
    acquire_stats_lock, create_footer_progress_bar, create_progress_bar, create_progress_style,
    create_separator_progress_bar,
};
