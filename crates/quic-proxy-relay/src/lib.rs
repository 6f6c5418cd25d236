//! Single-shot transport-bridging relay.
//!
//! A relay accepts exactly one inbound connection on one transport (plain
//! TCP or QUIC), reads one framed message, dials the configured peer on the
//! other transport and writes the message to it once:
//!
//! ```text
//! send ──tcp──▶ relay (tcp-to-quic) ──quic──▶ relay (quic-to-tcp) ──tcp──▶ sink
//! ```
//!
//! # Modules
//!
//! - [`config`]: TOML configuration, CLI overrides and validation
//! - [`pipeline`]: the generic relay state machine
//! - [`configured`]: assembling a relay from its configuration
//! - [`tools`]: `send` and `sink` companion endpoints
//! - [`cli`]: command-line entry points

pub mod cli;
pub mod config;
pub mod configured;
pub mod error;
pub mod pipeline;
pub mod tools;

pub use config::{RelayConfig, Topology, TransportKind};
pub use configured::ConfiguredRelay;
pub use error::RelayError;
pub use pipeline::{Relay, RelayOutcome, RelayState, StageDeadlines};
pub use tokio_util::sync::CancellationToken;
