//! Message I/O over any async byte stream.
//!
//! This module provides the two halves of a relay hop that touch payload
//! bytes: reading one framed [`Message`](crate::Message) from the ingress
//! stream and writing it, in full, to the egress stream.

mod framing;
mod write;

pub use framing::{ReadError, read_message};
pub use write::write_message;
