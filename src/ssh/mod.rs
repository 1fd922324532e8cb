//! SSH trust establishment
//!
//! This module guarantees passwordless access to each provider:
//! - Local key pair management (generate-if-absent)
//! - Non-interactive trust probing against a host alias
//! - The idempotent probe → keygen → register state machine

pub mod identity;
pub mod probe;
pub mod trust;

pub use identity::SshIdentity;
pub use probe::{SshProbe, TrustProbe};
pub use trust::{SshTrustManager, TrustState};
