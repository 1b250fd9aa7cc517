//! Error taxonomy for connection establishment and file transfer.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Every failure the core can report.
///
/// Establishment errors (`Bind` excepted) never reach the caller as a returned
/// `Err`: the connection worker hands them to
/// [`TransferCallback::on_connect_failed`](crate::connection::TransferCallback::on_connect_failed).
/// Transfer errors are returned from `send_file` / `recv_file` directly.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("No connection from sender within {}s", .timeout.as_secs())]
    AcceptTimeout { timeout: Duration },

    #[error("Couldn't connect to sender: {source}")]
    Accept {
        #[source]
        source: io::Error,
    },

    #[error("Rejected connection from {actual}: expected sender {expected}")]
    UnexpectedPeer { expected: IpAddr, actual: SocketAddr },

    #[error("Couldn't connect to receiver at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Connection attempt cancelled")]
    Cancelled,

    #[error(
        "Insufficient disk space in {}: {required} bytes required, {available} bytes available",
        .path.display()
    )]
    InsufficientSpace {
        required: u128,
        available: u64,
        path: PathBuf,
    },

    #[error("Cannot determine available disk space for {}", .path.display())]
    SpaceUnknown { path: PathBuf },

    #[error("Malformed transfer header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Invalid file name {name:?}: {reason}")]
    InvalidFileName { name: String, reason: String },

    #[error("File name is {len} bytes, longer than the 65535 byte limit")]
    NameTooLong { len: usize },

    #[error("Failed to determine local IP address: {source}")]
    LocalIp {
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl TransferError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TransferError::MalformedHeader {
            reason: reason.into(),
        }
    }

    /// Underlying OS error code, when the failure came from a system call.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            TransferError::Bind { source, .. }
            | TransferError::Accept { source }
            | TransferError::Connect { source, .. }
            | TransferError::LocalIp { source }
            | TransferError::Io(source) => source.raw_os_error(),
            _ => None,
        }
    }

    /// True for failures of the establishment phase, which are reported
    /// through the callback rather than returned.
    pub fn is_establishment(&self) -> bool {
        matches!(
            self,
            TransferError::AcceptTimeout { .. }
                | TransferError::Accept { .. }
                | TransferError::UnexpectedPeer { .. }
                | TransferError::Connect { .. }
                | TransferError::Cancelled
        )
    }
}
