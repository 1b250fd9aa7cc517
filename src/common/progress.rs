//! Payload streaming with byte-count progress.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

pub const STREAM_BUFFER_SIZE: usize = 64 * 1024; // 64KB

/// Receives the number of payload bytes moved so far.
pub type ProgressSender = watch::Sender<u64>;

/// Copy `reader` into `writer` until EOF, publishing the running total.
///
/// Returns the number of bytes copied. The writer is flushed, not closed.
pub async fn pump<R, W>(
    reader: &mut R,
    writer: &mut W,
    progress: Option<&ProgressSender>,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }

        writer.write_all(&buffer[..n]).await?;
        total += n as u64;

        if let Some(progress) = progress {
            progress.send_replace(total);
        }
    }

    writer.flush().await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pump_copies_everything_and_reports_total() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let (tx, rx) = watch::channel(0u64);

        let mut reader = data.as_slice();
        let mut out = Vec::new();
        let copied = pump(&mut reader, &mut out, Some(&tx)).await.unwrap();

        assert_eq!(copied, data.len() as u64);
        assert_eq!(out, data);
        assert_eq!(*rx.borrow(), data.len() as u64);
    }

    #[tokio::test]
    async fn pump_of_empty_input_is_zero() {
        let mut reader: &[u8] = &[];
        let mut out = Vec::new();
        assert_eq!(pump(&mut reader, &mut out, None).await.unwrap(), 0);
        assert!(out.is_empty());
    }
}
