//! Configuration file loading and error types.

use std::{fs, path::Path};

use super::RelayConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format (expected .toml)")]
    UnsupportedFormat,
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_config(path: impl AsRef<Path>) -> Result<RelayConfig, ConfigError> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "toml" => {
            let data = fs::read_to_string(path)?;
            Ok(toml::from_str(&data)?)
        }
        _ => Err(ConfigError::UnsupportedFormat),
    }
}
