//! Framed message reads.

use std::io;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::defaults::{MESSAGE_DELIMITER, READ_CHUNK_SIZE};
use crate::message::{FramingMode, Message};

/// Errors produced while reading the inbound message.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The peer closed the stream before sending a single byte.
    #[error("stream closed before any data was received")]
    StreamClosed,

    /// The peer closed the stream before a fixed-length message was complete.
    #[error("short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    /// No delimiter within the configured size bound.
    #[error("message exceeds {limit} bytes without a delimiter")]
    MessageTooLarge { limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read one message from `reader` according to `framing`.
///
/// In delimited mode the returned payload includes the trailing `\n`; bytes
/// after the delimiter are not part of the message and are discarded with
/// the stream. End-of-stream after at least one byte yields an unterminated
/// message.
pub async fn read_message<R>(reader: &mut R, framing: FramingMode) -> Result<Message, ReadError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    match framing {
        FramingMode::Delimited { max_bytes } => read_delimited(reader, max_bytes).await,
        FramingMode::Fixed { length } => read_fixed(reader, length).await,
    }
}

async fn read_delimited<R>(reader: &mut R, max_bytes: usize) -> Result<Message, ReadError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE.min(max_bytes));
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut scanned = 0;
    // One byte past the bound tells an exact fit apart from an overflow.
    let read_limit = max_bytes.saturating_add(1);

    loop {
        if let Some(pos) = buf[scanned..].iter().position(|&b| b == MESSAGE_DELIMITER) {
            let len = scanned + pos + 1;
            if len > max_bytes {
                return Err(ReadError::MessageTooLarge { limit: max_bytes });
            }
            buf.truncate(len);
            return Ok(Message::new(buf.freeze()));
        }
        scanned = buf.len();

        if buf.len() > max_bytes {
            return Err(ReadError::MessageTooLarge { limit: max_bytes });
        }
        let want = (read_limit - buf.len()).min(READ_CHUNK_SIZE);

        let n = match reader.read(&mut chunk[..want]).await {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReadError::Io(e)),
        };

        if n == 0 {
            if buf.is_empty() {
                return Err(ReadError::StreamClosed);
            }
            return Ok(Message::new(buf.freeze()));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

async fn read_fixed<R>(reader: &mut R, length: usize) -> Result<Message, ReadError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; length];
    let mut filled = 0;

    while filled < length {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => {
                return Err(ReadError::ShortRead {
                    expected: length,
                    received: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReadError::Io(e)),
        }
    }

    Ok(Message::new(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mock::ChunkedReader;
    use tokio::io::{AsyncWriteExt, duplex};

    #[tokio::test]
    async fn delimited_keeps_delimiter_in_payload() {
        let mut reader = ChunkedReader::new(&[b"hello\n"]);
        let msg = read_message(&mut reader, FramingMode::delimited())
            .await
            .unwrap();

        assert_eq!(msg.as_bytes(), b"hello\n");
        assert_eq!(msg.log_form(), "hello");
        // The logged form is the forwarded payload minus its delimiter.
        assert_eq!([msg.log_form().as_bytes(), b"\n"].concat(), msg.as_bytes());
    }

    #[tokio::test]
    async fn delimited_reassembles_split_reads() {
        let mut reader = ChunkedReader::new(&[b"he", b"ll", b"o\nworld"]);
        let msg = read_message(&mut reader, FramingMode::delimited())
            .await
            .unwrap();
        assert_eq!(msg.as_bytes(), b"hello\n");
    }

    #[tokio::test]
    async fn delimited_empty_stream_is_stream_closed() {
        let (client, mut server) = duplex(64);
        drop(client);

        let err = read_message(&mut server, FramingMode::delimited())
            .await
            .unwrap_err();
        assert!(matches!(err, ReadError::StreamClosed), "got {err:?}");
    }

    #[tokio::test]
    async fn delimited_unterminated_message_is_accepted_at_eof() {
        let (mut client, mut server) = duplex(64);
        client.write_all(b"no newline").await.unwrap();
        drop(client);

        let msg = read_message(&mut server, FramingMode::delimited())
            .await
            .unwrap();
        assert_eq!(msg.as_bytes(), b"no newline");
        assert!(!msg.is_terminated());
    }

    #[tokio::test]
    async fn delimited_enforces_size_bound() {
        let mut reader = ChunkedReader::new(&[b"0123456789abcdef\n"]);
        let err = read_message(&mut reader, FramingMode::Delimited { max_bytes: 8 })
            .await
            .unwrap_err();
        assert!(matches!(err, ReadError::MessageTooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn delimited_delimiter_at_bound_is_accepted() {
        let mut reader = ChunkedReader::new(&[b"1234567\n"]);
        let msg = read_message(&mut reader, FramingMode::Delimited { max_bytes: 8 })
            .await
            .unwrap();
        assert_eq!(msg.len(), 8);
    }

    #[tokio::test]
    async fn delimited_unterminated_exact_fit_is_accepted() {
        let mut reader = ChunkedReader::new(&[b"12345678"]);
        let msg = read_message(&mut reader, FramingMode::Delimited { max_bytes: 8 })
            .await
            .unwrap();
        assert_eq!(msg.as_bytes(), b"12345678");
        assert!(!msg.is_terminated());
    }

    #[tokio::test]
    async fn delimited_one_past_bound_is_too_large() {
        for input in [&b"123456789"[..], &b"12345678\n"[..]] {
            let mut reader = ChunkedReader::new(&[input]);
            let err = read_message(&mut reader, FramingMode::Delimited { max_bytes: 8 })
                .await
                .unwrap_err();
            assert!(matches!(err, ReadError::MessageTooLarge { limit: 8 }), "got {err:?}");
        }
    }

    #[tokio::test]
    async fn delimited_io_failure_is_not_stream_closed() {
        let mut reader = ChunkedReader::failing(&[b"par"], io::ErrorKind::ConnectionReset);
        let err = read_message(&mut reader, FramingMode::delimited())
            .await
            .unwrap_err();
        match err {
            ReadError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fixed_reads_exactly_length() {
        let mut reader = ChunkedReader::new(&[b"0123", b"456", b"789extra"]);
        let msg = read_message(&mut reader, FramingMode::fixed(10)).await.unwrap();
        assert_eq!(msg.len(), 10);
        assert_eq!(msg.as_bytes(), b"0123456789");
    }

    #[tokio::test]
    async fn fixed_payload_is_opaque() {
        let payload = [0u8, b'\n', 0xff, b'\n', 1, 2, 3, 4, 5, 6];
        let mut reader = ChunkedReader::new(&[&payload]);
        let msg = read_message(&mut reader, FramingMode::fixed(10)).await.unwrap();
        assert_eq!(msg.as_bytes(), payload);
    }

    #[tokio::test]
    async fn fixed_short_stream_is_short_read() {
        let mut reader = ChunkedReader::new(&[b"0123", b"45"]);
        let err = read_message(&mut reader, FramingMode::fixed(10))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ReadError::ShortRead { expected: 10, received: 6 }),
            "got {err:?}"
        );
    }
}
