//! QUIC transport implementation.
//!
//! - `QuicListener`: QUIC endpoint that accepts one session, then the single
//!   bidirectional stream the peer opens inside it.
//! - `QuicTransportConnector`: dials a QUIC session and opens one
//!   bidirectional stream as a separate step.
//!
//! Both sides hand out a [`QuicStream`], which owns the stream halves along
//! with the connection and endpoint that carry them, so dropping it releases
//! the whole session.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use quic_proxy_core::defaults::{DEFAULT_QUIC_DRAIN_TIMEOUT_SECS, QUIC_CLOSE_OK};
use quinn::crypto::rustls::{QuicClientConfig, QuicServerConfig};
use quinn::{Connection, Endpoint, RecvStream, SendStream, VarInt};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

use crate::error::TransportError;
use crate::{Accepted, TransportConnector, TransportFuture, TransportListener, resolve};

// ── Stream ──

/// One bidirectional QUIC stream plus the session that carries it.
pub struct QuicStream {
    send: SendStream,
    recv: RecvStream,
    connection: Connection,
    endpoint: Endpoint,
}

impl QuicStream {
    fn new(send: SendStream, recv: RecvStream, connection: Connection, endpoint: Endpoint) -> Self {
        Self {
            send,
            recv,
            connection,
            endpoint,
        }
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.connection.remote_address()
    }

    /// Finish the send side, wait for the peer to take the data, then close
    /// the session.
    ///
    /// Each wait is bounded by `drain_timeout`; a peer that vanishes after
    /// the data was written does not turn a completed write into a failure.
    pub async fn finish(mut self, drain_timeout: Duration) -> Result<(), TransportError> {
        self.send.finish()?;

        match tokio::time::timeout(drain_timeout, self.send.stopped()).await {
            Ok(Ok(Some(code))) => debug!(%code, "peer stopped stream after receiving data"),
            Ok(Ok(None)) => debug!("peer acknowledged all stream data"),
            Ok(Err(e)) => debug!(error = %e, "stream ended before acknowledgement"),
            Err(_) => debug!("timed out waiting for stream acknowledgement"),
        }

        self.connection
            .close(VarInt::from_u32(QUIC_CLOSE_OK), b"done");
        if tokio::time::timeout(drain_timeout, self.endpoint.wait_idle())
            .await
            .is_err()
        {
            debug!("timed out waiting for endpoint to drain");
        }
        Ok(())
    }
}

impl AsyncRead for QuicStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        AsyncRead::poll_read(Pin::new(&mut self.get_mut().recv), cx, buf)
    }
}

impl AsyncWrite for QuicStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        AsyncWrite::poll_write(Pin::new(&mut self.get_mut().send), cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncWrite::poll_flush(Pin::new(&mut self.get_mut().send), cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncWrite::poll_shutdown(Pin::new(&mut self.get_mut().send), cx)
    }
}

// ── Listener ──

/// QUIC listener that accepts a single session and a single stream.
pub struct QuicListener {
    endpoint: Endpoint,
}

impl QuicListener {
    /// Bind a QUIC endpoint on `addr` presenting `tls`.
    pub async fn bind(addr: &str, tls: rustls::ServerConfig) -> Result<Self, TransportError> {
        let socket_addr = resolve(addr).await?;
        let crypto = QuicServerConfig::try_from(tls)
            .map_err(|e| TransportError::Config(format!("QUIC server TLS: {e}")))?;
        let server_config = quinn::ServerConfig::with_crypto(Arc::new(crypto));
        let endpoint = Endpoint::server(server_config, socket_addr)?;
        Ok(Self { endpoint })
    }
}

impl TransportListener for QuicListener {
    type Stream = QuicStream;

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.endpoint.local_addr()?)
    }

    fn accept_one(self) -> TransportFuture<'static, Accepted<Self::Stream>> {
        Box::pin(async move {
            let endpoint = self.endpoint;
            let incoming = endpoint
                .accept()
                .await
                .ok_or(TransportError::ListenerClosed)?;
            let connection = incoming.await?;
            let peer = connection.remote_address();

            // Refuse any further sessions on this endpoint.
            endpoint.set_server_config(None);
            debug!(%peer, "quic session accepted");

            let (send, recv) = connection.accept_bi().await?;
            debug!(%peer, stream = %send.id(), "quic stream accepted");

            Ok(Accepted {
                stream: QuicStream::new(send, recv, connection, endpoint),
                peer,
            })
        })
    }
}

// ── Connector ──

/// An established QUIC session awaiting its stream.
pub struct QuicSession {
    connection: Connection,
    endpoint: Endpoint,
}

/// QUIC connector for outbound sessions.
#[derive(Clone)]
pub struct QuicTransportConnector {
    client_config: quinn::ClientConfig,
    /// SNI value sent in the TLS ClientHello.
    server_name: String,
    drain_timeout: Duration,
}

impl QuicTransportConnector {
    /// Build a connector from a rustls client config.
    pub fn new(tls: rustls::ClientConfig, server_name: String) -> Result<Self, TransportError> {
        let crypto = QuicClientConfig::try_from(tls)
            .map_err(|e| TransportError::Config(format!("QUIC client TLS: {e}")))?;
        Ok(Self {
            client_config: quinn::ClientConfig::new(Arc::new(crypto)),
            server_name,
            drain_timeout: Duration::from_secs(DEFAULT_QUIC_DRAIN_TIMEOUT_SECS),
        })
    }

    /// Override how long `finish` waits for the peer to drain the stream.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }
}

impl TransportConnector for QuicTransportConnector {
    type Session = QuicSession;
    type Stream = QuicStream;

    fn connect(&self, addr: &str) -> TransportFuture<'_, Self::Session> {
        let addr = addr.to_string();
        Box::pin(async move {
            let remote = resolve(&addr).await?;
            let local = if remote.is_ipv6() {
                SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
            } else {
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
            };

            let endpoint = Endpoint::client(local)?;
            let connection = endpoint
                .connect_with(self.client_config.clone(), remote, &self.server_name)?
                .await?;
            debug!(%remote, server_name = %self.server_name, "quic session established");

            Ok(QuicSession {
                connection,
                endpoint,
            })
        })
    }

    fn open_stream(&self, session: Self::Session) -> TransportFuture<'_, Self::Stream> {
        Box::pin(async move {
            let (send, recv) = session.connection.open_bi().await?;
            debug!(stream = %send.id(), "quic stream opened");
            Ok(QuicStream::new(
                send,
                recv,
                session.connection,
                session.endpoint,
            ))
        })
    }

    fn finish(&self, stream: Self::Stream) -> TransportFuture<'_, ()> {
        let drain_timeout = self.drain_timeout;
        Box::pin(stream.finish(drain_timeout))
    }
}
