//! Sender side of the wire protocol.

use super::file_handle::SendFileHandle;
use crate::common::errors::TransferError;
use crate::common::header::TransferHeader;
use crate::common::progress::{pump, ProgressSender};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Send `file` over `stream` and close the stream.
///
/// Writes the header (name length, name, size), then the file bytes. The
/// close is the receiver's end-of-payload signal. Returns the payload bytes
/// sent.
pub async fn send_file<S>(stream: S, file: &mut SendFileHandle) -> Result<u64, TransferError>
where
    S: AsyncWrite + Unpin,
{
    send_file_with_progress(stream, file, None).await
}

/// [`send_file`] that also publishes bytes sent so far.
#[tracing::instrument(skip_all, fields(name = %file.name()))]
pub async fn send_file_with_progress<S>(
    mut stream: S,
    file: &mut SendFileHandle,
    progress: Option<&ProgressSender>,
) -> Result<u64, TransferError>
where
    S: AsyncWrite + Unpin,
{
    let size = file.size().await?;
    let header = TransferHeader::new(file.name(), size)?;
    header.write_to(&mut stream).await?;

    let sent = pump(file.file_mut(), &mut stream, progress).await?;
    stream.shutdown().await?;

    tracing::info!(bytes = sent, declared = size, "file sent");
    Ok(sent)
}
