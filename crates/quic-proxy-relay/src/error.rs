//! Error types for the relay crate.

use std::time::Duration;

use quic_proxy_core::errors::{
    STAGE_ACCEPT, STAGE_BIND, STAGE_CONFIG, STAGE_CREDENTIAL, STAGE_DIAL, STAGE_FINISH,
    STAGE_READ, STAGE_RELAY, STAGE_SHUTDOWN, STAGE_STREAM_OPEN, STAGE_WRITE,
};
use quic_proxy_core::ReadError;
use quic_proxy_transport::error::TransportError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that end a relay run.
///
/// Every variant is terminal; [`RelayError::stage`] names where it happened.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    CredentialGeneration(TransportError),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: TransportError,
    },

    #[error("{0}")]
    Accept(TransportError),

    #[error("{0}")]
    Read(#[from] ReadError),

    #[error("cannot reach {addr}: {source}")]
    Dial {
        addr: String,
        source: TransportError,
    },

    #[error("{0}")]
    StreamOpen(TransportError),

    #[error("{0}")]
    Write(std::io::Error),

    #[error("{0}")]
    Finish(TransportError),

    #[error("no progress after {after:?}")]
    Timeout {
        stage: &'static str,
        after: Duration,
    },

    #[error("cancelled by shutdown signal during {stage}")]
    Cancelled { stage: &'static str },

    #[error("relay has already run")]
    AlreadyRun,
}

impl RelayError {
    /// Stage the error originated in, used as the diagnostic prefix.
    pub fn stage(&self) -> &'static str {
        match self {
            RelayError::Config(_) => STAGE_CONFIG,
            RelayError::CredentialGeneration(_) => STAGE_CREDENTIAL,
            RelayError::Bind { .. } => STAGE_BIND,
            RelayError::Accept(_) => STAGE_ACCEPT,
            RelayError::Read(_) => STAGE_READ,
            RelayError::Dial { .. } => STAGE_DIAL,
            RelayError::StreamOpen(_) => STAGE_STREAM_OPEN,
            RelayError::Write(_) => STAGE_WRITE,
            RelayError::Finish(_) => STAGE_FINISH,
            RelayError::Timeout { stage, .. } => *stage,
            RelayError::Cancelled { .. } => STAGE_SHUTDOWN,
            RelayError::AlreadyRun => STAGE_RELAY,
        }
    }

    /// `"<stage> failed: <cause>"`, as printed on exit.
    pub fn diagnostic(&self) -> String {
        format!("{} failed: {}", self.stage(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_is_prefixed_with_stage() {
        let err = RelayError::Read(ReadError::StreamClosed);
        assert_eq!(err.stage(), STAGE_READ);
        assert!(err.diagnostic().starts_with("read failed: "));

        let err = RelayError::Dial {
            addr: "127.0.0.1:1".into(),
            source: TransportError::Io(std::io::ErrorKind::ConnectionRefused.into()),
        };
        assert!(err.diagnostic().starts_with("dial failed: cannot reach 127.0.0.1:1"));
    }

    #[test]
    fn timeout_is_attributed_to_its_stage() {
        let err = RelayError::Timeout {
            stage: STAGE_ACCEPT,
            after: Duration::from_secs(3),
        };
        assert_eq!(err.stage(), STAGE_ACCEPT);
        assert_eq!(err.diagnostic(), "accept failed: no progress after 3s");
    }

    #[test]
    fn cancellation_reports_interrupted_stage() {
        let err = RelayError::Cancelled { stage: STAGE_READ };
        assert_eq!(err.stage(), STAGE_SHUTDOWN);
        assert_eq!(
            err.diagnostic(),
            "shutdown failed: cancelled by shutdown signal during read"
        );
    }
}
