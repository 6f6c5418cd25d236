//! Relay configuration.
//!
//! A relay is described by one [`RelayConfig`]: where it listens and on which
//! transport, where it forwards to and on which transport, how the message is
//! framed, and the optional per-stage deadlines. The struct is passed
//! explicitly into the relay, so several relays can coexist in one process.

mod loader;
mod overrides;
mod validate;

use std::collections::HashMap;
use std::time::Duration;

use quic_proxy_core::defaults::{
    DEFAULT_LISTEN_HOST, DEFAULT_QUIC_DRAIN_TIMEOUT_SECS, DEFAULT_QUIC_PORT, DEFAULT_REMOTE_HOST,
    DEFAULT_SERVER_NAME, DEFAULT_TCP_PORT,
};
use quic_proxy_core::FramingMode;
use quic_proxy_transport::tls::KeyAlgorithm;
use serde::{Deserialize, Serialize};

pub use loader::{ConfigError, load_config};
pub use overrides::{CliOverrides, apply_overrides};
pub use validate::validate_config;

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub ingress: IngressConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub framing: FramingMode,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Configuration for one of the two stock topologies.
    pub fn for_topology(topology: Topology) -> Self {
        match topology {
            Topology::TcpToQuic => Self::default(),
            Topology::QuicToTcp => Self {
                ingress: IngressConfig {
                    listen_port: DEFAULT_QUIC_PORT,
                    transport: TransportKind::Quic,
                    ..IngressConfig::default()
                },
                egress: EgressConfig {
                    remote_port: DEFAULT_TCP_PORT,
                    transport: TransportKind::Plain,
                    ..EgressConfig::default()
                },
                ..Self::default()
            },
        }
    }
}

/// The two deployment directions of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Plain TCP in, QUIC out.
    TcpToQuic,
    /// QUIC in, plain TCP out.
    QuicToTcp,
}

/// Transport kind of an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Plain TCP (no encryption).
    #[default]
    Plain,
    /// QUIC over UDP, TLS 1.3 with an ephemeral self-signed certificate.
    Quic,
}

impl TransportKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Quic => "quic",
        }
    }
}

/// Inbound side: the single connection the relay accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressConfig {
    #[serde(default = "default_listen_host")]
    pub listen_host: String,
    /// Port to bind; 0 selects an ephemeral port.
    #[serde(default = "default_tcp_port")]
    pub listen_port: u16,
    #[serde(default)]
    pub transport: TransportKind,
    /// Subject alternative name of the generated certificate (QUIC only).
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Key algorithm of the generated certificate (QUIC only).
    #[serde(default)]
    pub key_algorithm: KeyAlgorithm,
}

impl IngressConfig {
    pub fn listen_addr(&self) -> String {
        join_host_port(&self.listen_host, self.listen_port)
    }
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            listen_port: default_tcp_port(),
            transport: TransportKind::Plain,
            server_name: default_server_name(),
            key_algorithm: KeyAlgorithm::default(),
        }
    }
}

/// Outbound side: the peer the message is forwarded to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgressConfig {
    #[serde(default = "default_remote_host")]
    pub remote_host: String,
    #[serde(default = "default_quic_port")]
    pub remote_port: u16,
    #[serde(default = "default_egress_transport")]
    pub transport: TransportKind,
    /// SNI sent when dialing QUIC.
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Accept any certificate from the QUIC peer. Off unless set.
    #[serde(default)]
    pub tls_insecure_skip_verify: bool,
}

impl EgressConfig {
    pub fn remote_addr(&self) -> String {
        join_host_port(&self.remote_host, self.remote_port)
    }
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            remote_host: default_remote_host(),
            remote_port: default_quic_port(),
            transport: default_egress_transport(),
            server_name: default_server_name(),
            tls_insecure_skip_verify: false,
        }
    }
}

/// Optional per-stage deadlines, in seconds.
///
/// Unset stages wait indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default)]
    pub accept_timeout_secs: Option<u64>,
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
    /// Covers both the dial and, for QUIC, opening the stream.
    #[serde(default)]
    pub dial_timeout_secs: Option<u64>,
    #[serde(default)]
    pub write_timeout_secs: Option<u64>,
    /// How long a QUIC egress waits for the peer to drain before closing.
    #[serde(default = "default_quic_drain_timeout")]
    pub quic_drain_timeout_secs: u64,
}

impl TimeoutConfig {
    pub fn accept(&self) -> Option<Duration> {
        self.accept_timeout_secs.map(Duration::from_secs)
    }

    pub fn read(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }

    pub fn dial(&self) -> Option<Duration> {
        self.dial_timeout_secs.map(Duration::from_secs)
    }

    pub fn write(&self) -> Option<Duration> {
        self.write_timeout_secs.map(Duration::from_secs)
    }

    pub fn quic_drain(&self) -> Duration {
        Duration::from_secs(self.quic_drain_timeout_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            accept_timeout_secs: None,
            read_timeout_secs: None,
            dial_timeout_secs: None,
            write_timeout_secs: None,
            quic_drain_timeout_secs: default_quic_drain_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"quinn": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

/// `host:port`, bracketing bare IPv6 hosts.
pub(crate) fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn default_listen_host() -> String {
    DEFAULT_LISTEN_HOST.to_string()
}
fn default_remote_host() -> String {
    DEFAULT_REMOTE_HOST.to_string()
}
fn default_tcp_port() -> u16 {
    DEFAULT_TCP_PORT
}
fn default_quic_port() -> u16 {
    DEFAULT_QUIC_PORT
}
fn default_egress_transport() -> TransportKind {
    TransportKind::Quic
}
fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}
fn default_quic_drain_timeout() -> u64 {
    DEFAULT_QUIC_DRAIN_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_defaults_mirror_each_other() {
        let out = RelayConfig::for_topology(Topology::TcpToQuic);
        assert_eq!(out.ingress.transport, TransportKind::Plain);
        assert_eq!(out.ingress.listen_addr(), "0.0.0.0:8686");
        assert_eq!(out.egress.transport, TransportKind::Quic);
        assert_eq!(out.egress.remote_addr(), "127.0.0.1:8688");

        let back = RelayConfig::for_topology(Topology::QuicToTcp);
        assert_eq!(back.ingress.transport, TransportKind::Quic);
        assert_eq!(back.ingress.listen_addr(), "0.0.0.0:8688");
        assert_eq!(back.egress.transport, TransportKind::Plain);
        assert_eq!(back.egress.remote_addr(), "127.0.0.1:8686");

        assert!(!out.egress.tls_insecure_skip_verify);
        assert_eq!(out.timeouts.accept(), None);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[ingress]
listen_host = "127.0.0.1"
listen_port = 9000
transport = "quic"
server_name = "relay.internal"
key_algorithm = "ecdsa-p384"

[egress]
remote_host = "10.0.0.2"
remote_port = 9001
transport = "plain"

[framing]
mode = "fixed"
length = 32

[timeouts]
accept_timeout_secs = 30
read_timeout_secs = 5

[logging]
level = "debug"
format = "json"
filters = { quinn = "warn" }
"#;
        let config: RelayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ingress.transport, TransportKind::Quic);
        assert_eq!(config.ingress.key_algorithm, KeyAlgorithm::EcdsaP384);
        assert_eq!(config.ingress.server_name, "relay.internal");
        assert_eq!(config.egress.remote_addr(), "10.0.0.2:9001");
        assert_eq!(config.egress.transport, TransportKind::Plain);
        assert_eq!(config.framing, FramingMode::fixed(32));
        assert_eq!(config.timeouts.accept(), Some(Duration::from_secs(30)));
        assert_eq!(config.timeouts.dial(), None);
        assert_eq!(
            config.timeouts.quic_drain_timeout_secs,
            DEFAULT_QUIC_DRAIN_TIMEOUT_SECS
        ); // default
        assert_eq!(config.logging.filters["quinn"], "warn");
    }

    #[test]
    fn empty_config_is_the_default() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn unknown_transport_is_rejected() {
        let toml_str = "[egress]\ntransport = \"websocket\"\n";
        assert!(toml::from_str::<RelayConfig>(toml_str).is_err());
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        assert_eq!(join_host_port("::1", 8686), "[::1]:8686");
        assert_eq!(join_host_port("[::1]", 8686), "[::1]:8686");
        assert_eq!(join_host_port("localhost", 1), "localhost:1");
    }
}
