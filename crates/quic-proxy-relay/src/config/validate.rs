//! Configuration validation logic.

use quic_proxy_core::{DEFAULT_MAX_MESSAGE_BYTES, FramingMode};

use super::{ConfigError, RelayConfig, TransportKind};

pub fn validate_config(config: &RelayConfig) -> Result<(), ConfigError> {
    if config.ingress.listen_host.trim().is_empty() {
        return Err(ConfigError::Validation("ingress.listen_host is empty".into()));
    }
    if config.egress.remote_host.trim().is_empty() {
        return Err(ConfigError::Validation("egress.remote_host is empty".into()));
    }
    if config.egress.remote_port == 0 {
        return Err(ConfigError::Validation(
            "egress.remote_port must be > 0".into(),
        ));
    }

    match config.framing {
        FramingMode::Delimited { max_bytes } => {
            if max_bytes == 0 {
                return Err(ConfigError::Validation(
                    "framing.max_bytes must be > 0".into(),
                ));
            }
        }
        FramingMode::Fixed { length } => {
            if length == 0 || length > DEFAULT_MAX_MESSAGE_BYTES {
                return Err(ConfigError::Validation(format!(
                    "framing.length must be 1..={DEFAULT_MAX_MESSAGE_BYTES}"
                )));
            }
        }
    }

    if config.ingress.transport == TransportKind::Quic {
        validate_server_name("ingress.server_name", &config.ingress.server_name)?;
    }
    if config.egress.transport == TransportKind::Quic {
        validate_server_name("egress.server_name", &config.egress.server_name)?;
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("timeouts.accept_timeout_secs", timeouts.accept_timeout_secs),
        ("timeouts.read_timeout_secs", timeouts.read_timeout_secs),
        ("timeouts.dial_timeout_secs", timeouts.dial_timeout_secs),
        ("timeouts.write_timeout_secs", timeouts.write_timeout_secs),
    ] {
        if value == Some(0) {
            return Err(ConfigError::Validation(format!("{name} must be > 0 when set")));
        }
    }
    if timeouts.quic_drain_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts.quic_drain_timeout_secs must be > 0".into(),
        ));
    }

    if let Some(format) = config.logging.format.as_deref() {
        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&format) {
            return Err(ConfigError::Validation(format!(
                "logging.format must be one of: {valid_formats:?}"
            )));
        }
    }
    if let Some(output) = config.logging.output.as_deref() {
        let valid_outputs = ["stdout", "stderr"];
        if !valid_outputs.contains(&output) {
            return Err(ConfigError::Validation(format!(
                "logging.output must be one of: {valid_outputs:?}"
            )));
        }
    }
    Ok(())
}

fn validate_server_name(field: &str, name: &str) -> Result<(), ConfigError> {
    rustls::pki_types::ServerName::try_from(name)
        .map(|_| ())
        .map_err(|_| ConfigError::Validation(format!("{field} {name:?} is not a valid server name")))
}
