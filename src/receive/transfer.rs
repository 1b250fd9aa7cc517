//! Receiver side of the wire protocol.

use super::storage::{check_disk_space, destination_path, SpaceProbe, SystemSpace};
use crate::common::errors::TransferError;
use crate::common::header::TransferHeader;
use crate::common::progress::{pump, ProgressSender};
use crate::utils::security::validate_filename;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncRead;

/// What arrived and where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub name: String,
    pub path: PathBuf,
    /// Size the sender announced in the header.
    pub declared_size: u128,
    /// Bytes actually received before the sender closed.
    pub bytes_written: u64,
}

impl ReceivedFile {
    /// True when the payload length differs from the announced size.
    pub fn size_mismatch(&self) -> bool {
        u128::from(self.bytes_written) != self.declared_size
    }
}

/// Receives one file into a destination directory.
#[derive(Clone)]
pub struct FileReceiver {
    dest_dir: PathBuf,
    probe: Arc<dyn SpaceProbe>,
    progress: Option<ProgressSender>,
}

impl FileReceiver {
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            probe: Arc::new(SystemSpace),
            progress: None,
        }
    }

    /// Receiver writing into the current working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    pub fn with_space_probe(mut self, probe: impl SpaceProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Read the header, check space, then write the payload until the
    /// sender closes. The stream is closed on return.
    ///
    /// Nothing is created on disk unless the header is well formed, the name
    /// is a plain file name, and the declared size fits.
    #[tracing::instrument(skip_all, fields(dir = %self.dest_dir.display()))]
    pub async fn receive<S>(&self, mut stream: S) -> Result<ReceivedFile, TransferError>
    where
        S: AsyncRead + Unpin,
    {
        let header = TransferHeader::read_from(&mut stream).await?;

        validate_filename(&header.name).map_err(|e| TransferError::InvalidFileName {
            name: header.name.clone(),
            reason: e.to_string(),
        })?;

        check_disk_space(self.probe.as_ref(), &self.dest_dir, header.file_size)?;

        let path = destination_path(&self.dest_dir, &header.name);
        let mut out = File::create(&path).await?;
        let bytes_written = pump(&mut stream, &mut out, self.progress.as_ref()).await?;
        out.sync_all().await?;
        drop(stream);

        let received = ReceivedFile {
            name: header.name,
            path,
            declared_size: header.file_size,
            bytes_written,
        };

        if received.size_mismatch() {
            tracing::warn!(
                declared = received.declared_size,
                received = received.bytes_written,
                "payload length differs from declared size"
            );
        }
        tracing::info!(path = %received.path.display(), bytes = bytes_written, "file received");

        Ok(received)
    }
}

impl Default for FileReceiver {
    fn default() -> Self {
        Self::current_dir()
    }
}

/// Receive one file into the current working directory.
pub async fn recv_file<S>(stream: S) -> Result<ReceivedFile, TransferError>
where
    S: AsyncRead + Unpin,
{
    FileReceiver::current_dir().receive(stream).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::header::encode_field;
    use crate::receive::storage::FixedSpace;

    fn wire(name: &str, declared: u128, payload: &[u8]) -> Vec<u8> {
        let mut out = encode_field(name.len() as u128).to_vec();
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&encode_field(declared));
        out.extend_from_slice(payload);
        out
    }

    fn receiver(dir: &Path) -> FileReceiver {
        FileReceiver::new(dir).with_space_probe(FixedSpace(u64::MAX))
    }

    #[tokio::test]
    async fn writes_payload_under_transmitted_name() {
        let dir = tempfile::tempdir().unwrap();
        let data = wire("notes.txt", 5, b"hello");

        let received = receiver(dir.path()).receive(data.as_slice()).await.unwrap();

        assert_eq!(received.name, "notes.txt");
        assert_eq!(received.bytes_written, 5);
        assert!(!received.size_mismatch());
        assert_eq!(std::fs::read(dir.path().join("notes.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"old contents that are longer").unwrap();

        let data = wire("notes.txt", 3, b"new");
        receiver(dir.path()).receive(data.as_slice()).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("notes.txt")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn payload_length_is_decided_by_close() {
        let dir = tempfile::tempdir().unwrap();

        let short = wire("short.bin", 100, b"abc");
        let received = receiver(dir.path()).receive(short.as_slice()).await.unwrap();
        assert_eq!(received.bytes_written, 3);
        assert!(received.size_mismatch());

        let long = wire("long.bin", 1, b"abcdef");
        let received = receiver(dir.path()).receive(long.as_slice()).await.unwrap();
        assert_eq!(received.bytes_written, 6);
        assert_eq!(std::fs::read(&received.path).unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn insufficient_space_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let data = wire("big.iso", 1_000, b"");

        let err = FileReceiver::new(dir.path())
            .with_space_probe(FixedSpace(999))
            .receive(data.as_slice())
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::InsufficientSpace { .. }));
        assert!(!dir.path().join("big.iso").exists());
    }

    #[tokio::test]
    async fn traversal_name_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("inner");
        std::fs::create_dir(&inner).unwrap();

        let data = wire("../escape.txt", 1, b"x");
        let err = receiver(&inner).receive(data.as_slice()).await.unwrap_err();

        assert!(matches!(err, TransferError::InvalidFileName { .. }));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn progress_reports_final_count() {
        let dir = tempfile::tempdir().unwrap();
        let payload = vec![7u8; 150_000];
        let data = wire("p.bin", payload.len() as u128, &payload);
        let (tx, rx) = tokio::sync::watch::channel(0u64);

        receiver(dir.path())
            .with_progress(tx)
            .receive(data.as_slice())
            .await
            .unwrap();

        assert_eq!(*rx.borrow(), 150_000);
    }
}
