//! Core types and constants shared across quic-proxy crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Stage name constants for diagnostics
//! - The relayed [`Message`] and its [`FramingMode`]
//! - Message I/O: framed reads and full-buffer writes

pub mod defaults;
pub mod errors;
pub mod io;
pub mod message;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use errors::*;
pub use io::{ReadError, read_message, write_message};
pub use message::{FramingMode, Message};

/// Project name.
pub const PROJECT_NAME: &str = "quic-proxy";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
