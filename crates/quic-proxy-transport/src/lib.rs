//! Pluggable transport abstraction for quic-proxy.
//!
//! Defines traits for accepting exactly one inbound stream and for dialing
//! one outbound stream, so the relay pipeline works with plain TCP or QUIC
//! without changing its core logic.
//!
//! # Transports
//!
//! - [`plain`]: Plain TCP (no encryption).
//! - [`quic`]: QUIC sessions carrying a single bidirectional stream.
//! - [`tls`]: Ephemeral credentials and the TLS configurations QUIC runs on.

pub mod error;
pub mod plain;
pub mod quic;
pub mod tls;

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

use error::TransportError;

/// Boxed future returned by the transport traits.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Marker trait for streams usable by the relay pipeline.
pub trait TransportStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> TransportStream for T {}

/// An inbound stream together with the peer that opened it.
#[derive(Debug)]
pub struct Accepted<S> {
    pub stream: S,
    pub peer: SocketAddr,
}

/// A bound listener that hands out exactly one inbound stream.
///
/// `accept_one` consumes the listener: once a connection has been accepted
/// no further connections are taken.
pub trait TransportListener: Send + 'static {
    /// The stream type produced by this listener.
    type Stream: TransportStream;

    /// Address the listener is bound to.
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;

    /// Wait for one inbound connection and return its stream.
    fn accept_one(self) -> TransportFuture<'static, Accepted<Self::Stream>>;
}

/// Dials an outbound session and opens one stream inside it.
///
/// Dialing and opening the stream are separate fallible steps: for QUIC the
/// session handshake can succeed while stream negotiation fails.
pub trait TransportConnector: Clone + Send + Sync + 'static {
    /// An established transport-level session.
    type Session: Send + 'static;
    /// The stream type produced by this connector.
    type Stream: TransportStream;

    /// Connect to the given `host:port` address.
    fn connect(&self, addr: &str) -> TransportFuture<'_, Self::Session>;

    /// Open the single logical stream inside `session`.
    fn open_stream(&self, session: Self::Session) -> TransportFuture<'_, Self::Stream>;

    /// Finish a fully written stream and release its session gracefully.
    fn finish(&self, stream: Self::Stream) -> TransportFuture<'_, ()>;
}

/// Resolve `host:port` to its first socket address.
pub async fn resolve(addr: &str) -> Result<SocketAddr, TransportError> {
    tokio::net::lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| TransportError::Resolve(addr.to_string()))
}
