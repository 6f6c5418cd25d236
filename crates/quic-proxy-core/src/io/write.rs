//! Full-buffer message writes.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::message::Message;

/// Write `message` to `writer` in full, then flush.
///
/// Partial writes are continued until every byte has been accepted. A write
/// that accepts zero bytes is reported as [`io::ErrorKind::WriteZero`].
/// Returns the number of bytes written, which always equals the message
/// length on success. The message is consumed: it is written exactly once.
pub async fn write_message<W>(writer: &mut W, message: Message) -> io::Result<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let bytes = message.into_bytes();
    let mut written = 0;

    while written < bytes.len() {
        match writer.write(&bytes[written..]).await {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("peer accepted {written} of {} bytes", bytes.len()),
                ));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    writer.flush().await?;
    Ok(written)
}
