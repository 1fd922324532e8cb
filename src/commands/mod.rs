//! Command implementations for the CLI

pub mod sync;
pub mod trust;

pub use sync::handle_sync_command;
pub use trust::handle_trust_command;
