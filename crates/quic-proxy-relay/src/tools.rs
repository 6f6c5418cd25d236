//! Companion endpoints for driving a relay chain by hand.
//!
//! - [`send`]: dial a plain TCP address and write one line.
//! - [`sink`]: accept one plain TCP connection and collect everything the
//!   peer writes until it closes.
//!
//! Both are single-shot and report failures with the same stage taxonomy as
//! the relay.

use std::net::SocketAddr;

use bytes::{BufMut, Bytes, BytesMut};
use quic_proxy_core::{MESSAGE_DELIMITER, Message, ReadError, write_message};
use quic_proxy_transport::plain::{PlainListener, PlainTransportConnector};
use quic_proxy_transport::{Accepted, TransportConnector, TransportListener};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};
use tracing::info;

use crate::error::RelayError;

/// Build a delimited message from free text: surrounding whitespace is
/// trimmed and a single delimiter appended.
pub fn line_message(text: &str) -> Message {
    let text = text.trim();
    let mut buf = BytesMut::with_capacity(text.len() + 1);
    buf.put_slice(text.as_bytes());
    buf.put_u8(MESSAGE_DELIMITER);
    Message::new(buf.freeze())
}

/// Read one line from `input` and turn it into a message.
///
/// Empty input is [`ReadError::StreamClosed`].
pub async fn read_line_message<R>(input: &mut R) -> Result<Message, RelayError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = input
        .read_line(&mut line)
        .await
        .map_err(|e| RelayError::Read(ReadError::Io(e)))?;
    if n == 0 {
        return Err(ReadError::StreamClosed.into());
    }
    Ok(line_message(&line))
}

/// Dial `addr` over plain TCP, write `message` once, and close.
pub async fn send(addr: &str, message: Message) -> Result<usize, RelayError> {
    let connector = PlainTransportConnector::new();
    let session = connector
        .connect(addr)
        .await
        .map_err(|source| RelayError::Dial {
            addr: addr.to_string(),
            source,
        })?;
    let mut stream = connector
        .open_stream(session)
        .await
        .map_err(RelayError::StreamOpen)?;

    let text = message.log_form().into_owned();
    let bytes = write_message(&mut stream, message)
        .await
        .map_err(RelayError::Write)?;
    connector.finish(stream).await.map_err(RelayError::Finish)?;

    info!(remote = %addr, bytes, message = %text, "message sent");
    Ok(bytes)
}

/// Accept one connection on `listener` and read until the peer closes.
///
/// More than `max_bytes` is [`ReadError::MessageTooLarge`].
pub async fn sink(listener: PlainListener, max_bytes: usize) -> Result<(SocketAddr, Bytes), RelayError> {
    let Accepted { mut stream, peer } = listener.accept_one().await.map_err(RelayError::Accept)?;
    info!(%peer, "connection accepted");

    let received = read_to_close(&mut stream, max_bytes).await?;
    info!(
        %peer,
        bytes = received.len(),
        message = %String::from_utf8_lossy(received.trim_ascii()),
        "message received"
    );
    Ok((peer, received))
}

async fn read_to_close<R>(reader: &mut R, max_bytes: usize) -> Result<Bytes, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    // One byte past the limit tells an exact fit apart from an overflow.
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    reader.take(limit).read_to_end(&mut buf).await?;
    if buf.len() > max_bytes {
        return Err(ReadError::MessageTooLarge { limit: max_bytes });
    }
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn line_message_trims_and_terminates() {
        let msg = line_message("  hello world \n");
        assert_eq!(msg.as_bytes(), b"hello world\n");
        assert_eq!(msg.log_form(), "hello world");
    }

    #[tokio::test]
    async fn reads_first_line_only() {
        let mut input = BufReader::new(&b"first\nsecond\n"[..]);
        let msg = read_line_message(&mut input).await.unwrap();
        assert_eq!(msg.as_bytes(), b"first\n");
    }

    #[tokio::test]
    async fn empty_input_is_stream_closed() {
        let mut input = BufReader::new(&b""[..]);
        let err = read_line_message(&mut input).await.unwrap_err();
        assert!(matches!(err, RelayError::Read(ReadError::StreamClosed)));
    }

    #[tokio::test]
    async fn send_writes_line_and_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let sender = tokio::spawn(async move { send(&addr, line_message("ping")).await });
        let (mut server, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();

        assert_eq!(received, b"ping\n");
        assert_eq!(sender.await.unwrap().unwrap(), 5);
    }

    #[tokio::test]
    async fn send_to_closed_port_is_dial_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = send(&addr, line_message("ping")).await.unwrap_err();
        assert_eq!(err.stage(), "dial");
    }

    #[tokio::test]
    async fn sink_collects_until_close() {
        let listener = PlainListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sink = tokio::spawn(sink(listener, 64));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"part one ").await.unwrap();
        client.write_all(b"part two\n").await.unwrap();
        drop(client);

        let (_, received) = sink.await.unwrap().unwrap();
        assert_eq!(&received[..], b"part one part two\n");
    }

    #[tokio::test]
    async fn sink_enforces_limit() {
        let mut reader = &b"0123456789"[..];
        let err = read_to_close(&mut reader, 4).await.unwrap_err();
        assert!(matches!(err, ReadError::MessageTooLarge { limit: 4 }));

        let mut reader = &b"0123"[..];
        assert_eq!(&read_to_close(&mut reader, 4).await.unwrap()[..], b"0123");
    }
}
