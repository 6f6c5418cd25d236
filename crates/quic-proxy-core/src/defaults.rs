//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Endpoint Defaults
// ============================================================================

/// Default bind host for ingress listeners.
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";
/// Default remote host for egress dialers.
pub const DEFAULT_REMOTE_HOST: &str = "127.0.0.1";
/// Default plain TCP port.
pub const DEFAULT_TCP_PORT: u16 = 8686;
/// Default QUIC port.
pub const DEFAULT_QUIC_PORT: u16 = 8688;

// ============================================================================
// Framing Defaults
// ============================================================================

/// Message delimiter for delimited framing.
pub const MESSAGE_DELIMITER: u8 = b'\n';
/// Default message length for fixed-length framing.
pub const DEFAULT_FIXED_LENGTH: usize = 10;
/// Default upper bound on a single relayed message (64 KiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;
/// Read chunk size used by the message reader.
pub const READ_CHUNK_SIZE: usize = 4096;

// ============================================================================
// TLS / QUIC Defaults
// ============================================================================

/// ALPN protocol identifier negotiated on QUIC sessions.
pub const QUIC_ALPN: &[u8] = b"quic-proxy";
/// Default server name presented in the self-signed certificate and used as SNI.
pub const DEFAULT_SERVER_NAME: &str = "localhost";
/// Serial number written into every self-signed certificate.
pub const SELF_SIGNED_SERIAL: &[u8] = &[0x01];
/// Self-signed certificate validity in days.
pub const DEFAULT_CERT_VALIDITY_DAYS: i64 = 1;
/// Application close code sent when a QUIC session finishes normally.
pub const QUIC_CLOSE_OK: u32 = 0;
/// Upper bound for waiting on the peer to drain a finished QUIC stream (seconds).
pub const DEFAULT_QUIC_DRAIN_TIMEOUT_SECS: u64 = 5;
