//! The relayed message and the framing policy that delimits it.
//!
//! A [`Message`] is opaque: it is never interpreted, only read once from the
//! ingress stream and written once to the egress stream.
//!
//! # Delimiter policy
//!
//! In [`FramingMode::Delimited`] the payload keeps its trailing `\n`, so the
//! next hop can frame it the same way. The human-readable form used in logs
//! ([`Message::log_form`]) is derived from that same payload by stripping
//! exactly one trailing delimiter, so the wire bytes and the logged text can
//! never disagree about content.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::defaults::{DEFAULT_FIXED_LENGTH, DEFAULT_MAX_MESSAGE_BYTES, MESSAGE_DELIMITER};

/// How message boundaries are found on the ingress stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FramingMode {
    /// Read until a `\n` byte or end-of-stream, bounded by `max_bytes`.
    Delimited {
        #[serde(default = "default_max_message_bytes")]
        max_bytes: usize,
    },
    /// Read exactly `length` bytes.
    Fixed {
        #[serde(default = "default_fixed_length")]
        length: usize,
    },
}

impl FramingMode {
    /// Delimited framing with the default size bound.
    pub fn delimited() -> Self {
        Self::Delimited {
            max_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }

    /// Fixed-length framing of `length` bytes.
    pub fn fixed(length: usize) -> Self {
        Self::Fixed { length }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delimited { .. } => "delimited",
            Self::Fixed { .. } => "fixed",
        }
    }
}

impl Default for FramingMode {
    fn default() -> Self {
        Self::delimited()
    }
}

fn default_max_message_bytes() -> usize {
    DEFAULT_MAX_MESSAGE_BYTES
}

fn default_fixed_length() -> usize {
    DEFAULT_FIXED_LENGTH
}

/// One relayed payload.
///
/// Deliberately not `Clone`: a message has a single owner from the read that
/// produced it to the write that consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
}

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Raw bytes as they will be forwarded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether the payload ends with the message delimiter.
    pub fn is_terminated(&self) -> bool {
        self.payload.last() == Some(&MESSAGE_DELIMITER)
    }

    /// Payload without its single trailing delimiter, if any.
    pub fn trimmed(&self) -> &[u8] {
        match self.payload.split_last() {
            Some((&MESSAGE_DELIMITER, rest)) => rest,
            _ => &self.payload,
        }
    }

    /// Lossy UTF-8 rendering of [`Message::trimmed`] for diagnostics.
    pub fn log_form(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.trimmed())
    }

    pub fn into_bytes(self) -> Bytes {
        self.payload
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.log_form())
    }
}
