//! Stage name constants for logging and diagnostics.
//!
//! Every failure is reported with the name of the stage it originated in,
//! so these constants provide a consistent classification across all crates.

/// Configuration validation.
pub const STAGE_CONFIG: &str = "config";
/// Session credential generation.
pub const STAGE_CREDENTIAL: &str = "credential";
/// Binding the ingress listener.
pub const STAGE_BIND: &str = "bind";
/// Accepting the inbound connection (and, for QUIC, its stream).
pub const STAGE_ACCEPT: &str = "accept";
/// Reading the inbound message.
pub const STAGE_READ: &str = "read";
/// Dialing the egress endpoint.
pub const STAGE_DIAL: &str = "dial";
/// Opening the logical stream inside the egress session.
pub const STAGE_STREAM_OPEN: &str = "stream_open";
/// Writing the message to the egress stream.
pub const STAGE_WRITE: &str = "write";
/// Finishing the egress stream and closing its session.
pub const STAGE_FINISH: &str = "finish";
/// Driving the relay itself, outside any single I/O stage.
pub const STAGE_RELAY: &str = "relay";
/// Shutdown requested while a stage was suspended.
pub const STAGE_SHUTDOWN: &str = "shutdown";
