//! The file being sent, with the name it travels under.

use crate::common::errors::TransferError;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncSeekExt;

/// Open, seekable file plus the transfer name derived from its path.
#[derive(Debug)]
pub struct SendFileHandle {
    file: File,
    path: PathBuf,
    name: String,
}

impl SendFileHandle {
    /// Open `path` for sending.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, TransferError> {
        let file = File::open(path).await?;
        Self::from_file(file, path)
    }

    /// Wrap an already open file. `path` supplies the transfer name.
    pub fn from_file(file: File, path: &Path) -> Result<Self, TransferError> {
        let name = transfer_name(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            name,
        })
    }

    /// Final path segment, sent verbatim as the file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total size, found by seeking to the end and back to the start.
    ///
    /// Leaves the read position at 0.
    pub async fn size(&mut self) -> Result<u64, TransferError> {
        let size = self.file.seek(SeekFrom::End(0)).await?;
        self.file.seek(SeekFrom::Start(0)).await?;
        Ok(size)
    }

    pub(crate) fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

fn transfer_name(path: &Path) -> Result<String, TransferError> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;

    Ok(name.to_string_lossy().into_owned())
}
