//! # quic-proxy
//!
//! A single-shot relay that carries one message between plain TCP and QUIC.
//!
//! ## Crates
//!
//! - [`quic_proxy_core`] - Message type, framing and default values
//! - [`quic_proxy_transport`] - Plain TCP and QUIC transports, session TLS
//! - [`quic_proxy_relay`] - Relay orchestration, configuration and CLI

pub use quic_proxy_core as core;
pub use quic_proxy_relay as relay;
pub use quic_proxy_transport as transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use quic_proxy_core::{FramingMode, Message};
    pub use quic_proxy_relay::config::{load_config, validate_config};
    pub use quic_proxy_relay::{
        CancellationToken, ConfiguredRelay, RelayConfig, RelayError, RelayState, Topology,
    };
}
