//! Connection establishment: host/accept on one side, dial on the other.
//!
//! Accept and dial run on a spawned task so the caller's loop never waits on
//! the network. At most one attempt is in flight per handler.

use super::callback::{Role, TransferCallback};
use super::state::{AttemptGuard, ConnectionState, StateCell};
use crate::common::config::AppConfig;
use crate::common::errors::TransferError;
use crate::transport::local::{bind_listener, get_local_ip_via, ListenSocket, DEFAULT_IP_PROBE};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Timeouts and probe address used by a [`ConnectionHandler`].
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub accept_timeout: Duration,
    pub connect_timeout: Duration,
    pub ip_probe: String,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            accept_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            ip_probe: DEFAULT_IP_PROBE.to_string(),
        }
    }
}

impl From<&AppConfig> for HandlerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            accept_timeout: config.accept_timeout(),
            connect_timeout: config.connect_timeout(),
            ip_probe: config.ip_probe.clone(),
        }
    }
}

/// A running accept or dial.
///
/// Dropping it detaches the task; the attempt still finishes and reports
/// through the callback.
#[derive(Debug)]
pub struct ConnectAttempt {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ConnectAttempt {
    /// Stop waiting. The callback receives [`TransferError::Cancelled`]
    /// unless the attempt already finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the callback to have fired.
    pub async fn join(self) {
        match self.handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => tracing::debug!("connection task aborted"),
            Err(e) => tracing::error!("connection task failed: {}", e),
        }
    }

    /// Kill the task outright. No callback fires; state goes back to
    /// `NotConnected`.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Owns the lifecycle state and starts connection attempts.
#[derive(Debug, Clone, Default)]
pub struct ConnectionHandler {
    state: StateCell,
    settings: HandlerSettings,
}

impl ConnectionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: HandlerSettings) -> Self {
        Self {
            state: StateCell::default(),
            settings,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    /// Bind and listen on `ip:port` with the configured accept timeout.
    pub fn host(&self, ip: IpAddr, port: u16) -> Result<ListenSocket, TransferError> {
        bind_listener(ip, port, self.settings.accept_timeout)
    }

    /// LAN-facing address of this machine.
    pub fn local_ip(&self) -> Result<IpAddr, TransferError> {
        get_local_ip_via(self.settings.ip_probe.as_str())
    }

    /// Wait in the background for `expected_peer` to connect to `listener`.
    ///
    /// Returns `None` without doing anything while another attempt is in
    /// flight. Exactly one accepted connection is consumed: a peer with any
    /// other address is dropped and the attempt fails with
    /// [`TransferError::UnexpectedPeer`].
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn accept_connection_from(
        &self,
        listener: &ListenSocket,
        expected_peer: IpAddr,
        callback: Arc<dyn TransferCallback>,
    ) -> Option<ConnectAttempt> {
        if !self.state.begin_attempt() {
            tracing::debug!("accept ignored: connection attempt already in progress");
            return None;
        }

        let timeout = listener.accept_timeout();
        let listener = listener.try_clone_listener();
        tracing::info!(peer = %expected_peer, ?timeout, "waiting for sender");

        Some(self.spawn_attempt(Role::Host, callback, async move {
            let listener = listener.map_err(|source| TransferError::Accept { source })?;
            accept_from(listener, expected_peer, timeout).await
        }))
    }

    /// Dial `ip:port` in the background.
    ///
    /// Returns `None` without doing anything while another attempt is in
    /// flight.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect_to_host(
        &self,
        ip: IpAddr,
        port: u16,
        callback: Arc<dyn TransferCallback>,
    ) -> Option<ConnectAttempt> {
        if !self.state.begin_attempt() {
            tracing::debug!("connect ignored: connection attempt already in progress");
            return None;
        }

        let addr = SocketAddr::new(ip, port);
        let timeout = self.settings.connect_timeout;
        tracing::info!(%addr, "connecting to receiver");

        Some(self.spawn_attempt(Role::Dialer, callback, async move {
            dial(addr, timeout).await
        }))
    }

    fn spawn_attempt<F>(
        &self,
        role: Role,
        callback: Arc<dyn TransferCallback>,
        establish: F,
    ) -> ConnectAttempt
    where
        F: std::future::Future<Output = Result<TcpStream, TransferError>> + Send + 'static,
    {
        let state = self.state.clone();
        let cancel = CancellationToken::new();
        let cancelled = cancel.clone();
        // Created outside the task so an abort before the first poll still resets.
        let mut guard = AttemptGuard::new(state.clone());

        let handle = tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = cancelled.cancelled() => Err(TransferError::Cancelled),
                result = establish => result,
            };
            guard.disarm();

            match outcome {
                Ok(stream) => {
                    state.mark_connected();
                    tracing::info!(?role, peer = ?stream.peer_addr().ok(), "connected");
                    callback.on_connected(stream, role);
                }
                Err(e) => {
                    state.reset();
                    tracing::warn!(?role, error = %e, "connection attempt failed");
                    callback.on_connect_failed(e);
                }
            }
        });

        ConnectAttempt { handle, cancel }
    }
}

async fn accept_from(
    listener: std::net::TcpListener,
    expected_peer: IpAddr,
    timeout: Duration,
) -> Result<TcpStream, TransferError> {
    let listener =
        TcpListener::from_std(listener).map_err(|source| TransferError::Accept { source })?;

    let (stream, addr) = tokio::time::timeout(timeout, listener.accept())
        .await
        .map_err(|_| TransferError::AcceptTimeout { timeout })?
        .map_err(|source| TransferError::Accept { source })?;

    if addr.ip().to_canonical() != expected_peer.to_canonical() {
        tracing::warn!(peer = %addr, expected = %expected_peer, "dropping unexpected peer");
        return Err(TransferError::UnexpectedPeer {
            expected: expected_peer,
            actual: addr,
        });
    }

    Ok(stream)
}

async fn dial(addr: SocketAddr, timeout: Duration) -> Result<TcpStream, TransferError> {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(TransferError::Connect { addr, source }),
        Err(_) => Err(TransferError::Connect {
            addr,
            source: io::Error::new(io::ErrorKind::TimedOut, "connection timed out"),
        }),
    }
}
