use crate::common::errors::TransferError;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Which side of the transfer this peer took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Listened and accepted; receives the file.
    Host,
    /// Dialed out; sends the file.
    Dialer,
}

/// Hooks the surrounding application implements to learn how an
/// establishment attempt ended. Exactly one of the two fires per attempt.
pub trait TransferCallback: Send + Sync + 'static {
    /// The caller now owns `stream`.
    fn on_connected(&self, stream: TcpStream, role: Role);

    fn on_connect_failed(&self, error: TransferError);
}

/// Outcome of an attempt, for callers that prefer a channel to callbacks.
#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { stream: TcpStream, role: Role },
    Failed(TransferError),
}

impl TransferCallback for mpsc::UnboundedSender<ConnectionEvent> {
    fn on_connected(&self, stream: TcpStream, role: Role) {
        if self.send(ConnectionEvent::Connected { stream, role }).is_err() {
            tracing::warn!(?role, "connection established but nobody is listening for it");
        }
    }

    fn on_connect_failed(&self, error: TransferError) {
        if let Err(mpsc::error::SendError(event)) = self.send(ConnectionEvent::Failed(error)) {
            tracing::warn!(?event, "connection failure dropped, receiver gone");
        }
    }
}
