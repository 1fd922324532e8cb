//! Shared utilities

pub mod fs;
pub mod terminal;

pub use fs::shorten_path;
pub use terminal::{set_terminal_title, set_terminal_title_and_flush};
