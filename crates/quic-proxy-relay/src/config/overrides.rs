//! CLI override definitions and application logic.

use clap::{Parser, ValueEnum};
use quic_proxy_core::FramingMode;
use quic_proxy_transport::tls::KeyAlgorithm;

use super::{RelayConfig, TransportKind};

/// Framing mode names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FramingArg {
    Delimited,
    Fixed,
}

/// Key algorithm names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyAlgorithmArg {
    EcdsaP256,
    EcdsaP384,
}

impl From<KeyAlgorithmArg> for KeyAlgorithm {
    fn from(arg: KeyAlgorithmArg) -> Self {
        match arg {
            KeyAlgorithmArg::EcdsaP256 => KeyAlgorithm::EcdsaP256,
            KeyAlgorithmArg::EcdsaP384 => KeyAlgorithm::EcdsaP384,
        }
    }
}

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override ingress listen host, e.g. 0.0.0.0
    #[arg(long)]
    pub listen_host: Option<String>,
    /// Override ingress listen port (0 = ephemeral)
    #[arg(long)]
    pub listen_port: Option<u16>,
    /// Override egress remote host
    #[arg(long)]
    pub remote_host: Option<String>,
    /// Override egress remote port
    #[arg(long)]
    pub remote_port: Option<u16>,
    /// Override framing mode
    #[arg(long, value_enum)]
    pub framing: Option<FramingArg>,
    /// Message length for fixed framing (bytes)
    #[arg(long)]
    pub fixed_length: Option<usize>,
    /// Maximum message size for delimited framing (bytes)
    #[arg(long)]
    pub max_message_bytes: Option<usize>,
    /// Override server name (certificate SAN on QUIC ingress, SNI on QUIC egress)
    #[arg(long)]
    pub server_name: Option<String>,
    /// Key algorithm for the generated QUIC certificate
    #[arg(long, value_enum)]
    pub key_algorithm: Option<KeyAlgorithmArg>,
    /// Accept any certificate from the QUIC egress peer
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub tls_insecure_skip_verify: Option<bool>,
    /// Accept deadline (seconds)
    #[arg(long)]
    pub accept_timeout_secs: Option<u64>,
    /// Read deadline (seconds)
    #[arg(long)]
    pub read_timeout_secs: Option<u64>,
    /// Dial and stream-open deadline (seconds)
    #[arg(long)]
    pub dial_timeout_secs: Option<u64>,
    /// Write deadline (seconds)
    #[arg(long)]
    pub write_timeout_secs: Option<u64>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
    /// Override log format (pretty/compact/json)
    #[arg(long)]
    pub log_format: Option<String>,
}

pub fn apply_overrides(config: &mut RelayConfig, overrides: &CliOverrides) {
    if let Some(v) = &overrides.listen_host {
        config.ingress.listen_host = v.clone();
    }
    if let Some(v) = overrides.listen_port {
        config.ingress.listen_port = v;
    }
    if let Some(v) = &overrides.remote_host {
        config.egress.remote_host = v.clone();
    }
    if let Some(v) = overrides.remote_port {
        config.egress.remote_port = v;
    }
    // Switching mode starts from that mode's defaults; the size flags then
    // apply to whichever mode is in effect.
    match overrides.framing {
        Some(FramingArg::Delimited) if !matches!(config.framing, FramingMode::Delimited { .. }) => {
            config.framing = FramingMode::delimited();
        }
        Some(FramingArg::Fixed) if !matches!(config.framing, FramingMode::Fixed { .. }) => {
            config.framing = FramingMode::Fixed {
                length: quic_proxy_core::DEFAULT_FIXED_LENGTH,
            };
        }
        _ => {}
    }
    match &mut config.framing {
        FramingMode::Fixed { length } => {
            if let Some(v) = overrides.fixed_length {
                *length = v;
            }
        }
        FramingMode::Delimited { max_bytes } => {
            if let Some(v) = overrides.max_message_bytes {
                *max_bytes = v;
            }
        }
    }
    if let Some(v) = &overrides.server_name {
        if config.ingress.transport == TransportKind::Quic {
            config.ingress.server_name = v.clone();
        }
        if config.egress.transport == TransportKind::Quic {
            config.egress.server_name = v.clone();
        }
    }
    if let Some(v) = overrides.key_algorithm {
        config.ingress.key_algorithm = v.into();
    }
    if let Some(v) = overrides.tls_insecure_skip_verify {
        config.egress.tls_insecure_skip_verify = v;
    }
    if let Some(v) = overrides.accept_timeout_secs {
        config.timeouts.accept_timeout_secs = Some(v);
    }
    if let Some(v) = overrides.read_timeout_secs {
        config.timeouts.read_timeout_secs = Some(v);
    }
    if let Some(v) = overrides.dial_timeout_secs {
        config.timeouts.dial_timeout_secs = Some(v);
    }
    if let Some(v) = overrides.write_timeout_secs {
        config.timeouts.write_timeout_secs = Some(v);
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
    if let Some(v) = &overrides.log_format {
        config.logging.format = Some(v.clone());
    }
}
