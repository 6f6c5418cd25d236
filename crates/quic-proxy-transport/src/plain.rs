//! Plain TCP transport (no encryption).
//!
//! The session and the stream are the same `TcpStream`; opening a stream is
//! the identity.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use crate::error::TransportError;
use crate::{Accepted, TransportConnector, TransportFuture, TransportListener};

/// Plain TCP listener that accepts a single connection.
#[derive(Debug)]
pub struct PlainListener {
    listener: TcpListener,
}

impl PlainListener {
    /// Bind a TCP listener on `addr` (`host:port`).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }
}

impl TransportListener for PlainListener {
    type Stream = TcpStream;

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    fn accept_one(self) -> TransportFuture<'static, Accepted<Self::Stream>> {
        Box::pin(async move {
            let (tcp, peer) = self.listener.accept().await?;
            tcp.set_nodelay(true)?;
            // `self.listener` is dropped here: later clients are refused.
            Ok(Accepted { stream: tcp, peer })
        })
    }
}

/// Plain TCP connector: connects directly without encryption.
#[derive(Debug, Clone, Default)]
pub struct PlainTransportConnector;

impl PlainTransportConnector {
    pub fn new() -> Self {
        Self
    }
}

impl TransportConnector for PlainTransportConnector {
    type Session = TcpStream;
    type Stream = TcpStream;

    fn connect(&self, addr: &str) -> TransportFuture<'_, Self::Session> {
        let addr = addr.to_string();
        Box::pin(async move {
            let tcp = TcpStream::connect(&addr).await?;
            tcp.set_nodelay(true)?;
            debug!(remote = %addr, "tcp connected");
            Ok(tcp)
        })
    }

    fn open_stream(&self, session: Self::Session) -> TransportFuture<'_, Self::Stream> {
        Box::pin(async move { Ok(session) })
    }

    fn finish(&self, mut stream: Self::Stream) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            stream.shutdown().await?;
            Ok(())
        })
    }
}
