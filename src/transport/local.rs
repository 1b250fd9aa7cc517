//! Raw TCP listener setup and local address discovery.

use crate::common::errors::TransferError;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// Address the UDP probe "connects" to. No packet is sent.
pub const DEFAULT_IP_PROBE: &str = "8.8.8.8:80";

/// A bound, listening socket waiting for the sender.
///
/// Holds a non-blocking std listener so it can be created outside the async
/// runtime; each accept attempt works on its own clone.
#[derive(Debug)]
pub struct ListenSocket {
    listener: TcpListener,
    accept_timeout: Duration,
}

impl ListenSocket {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn accept_timeout(&self) -> Duration {
        self.accept_timeout
    }

    /// Second handle to the same OS socket, handed to one accept attempt.
    pub(crate) fn try_clone_listener(&self) -> io::Result<TcpListener> {
        self.listener.try_clone()
    }
}

/// Bind and listen on `ip:port`. Does not accept.
pub fn bind_listener(
    ip: IpAddr,
    port: u16,
    accept_timeout: Duration,
) -> Result<ListenSocket, TransferError> {
    let addr = SocketAddr::new(ip, port);
    let listener =
        TcpListener::bind(addr).map_err(|source| TransferError::Bind { addr, source })?;

    listener
        .set_nonblocking(true)
        .map_err(|source| TransferError::Bind { addr, source })?;

    tracing::info!(addr = %listener.local_addr().unwrap_or(addr), "listening for sender");

    Ok(ListenSocket {
        listener,
        accept_timeout,
    })
}

/// LAN-facing local IP, found by routing a connectionless socket towards a
/// public address and reading back the chosen local endpoint.
pub fn get_local_ip() -> Result<IpAddr, TransferError> {
    get_local_ip_via(DEFAULT_IP_PROBE)
}

/// [`get_local_ip`] with a caller-chosen probe address.
///
/// Falls back to loopback when the OS picks the unspecified address.
pub fn get_local_ip_via(probe: impl ToSocketAddrs) -> Result<IpAddr, TransferError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|source| TransferError::LocalIp { source })?;

    socket
        .connect(probe)
        .map_err(|source| TransferError::LocalIp { source })?;

    let local_addr = socket
        .local_addr()
        .map_err(|source| TransferError::LocalIp { source })?;

    let ip = local_addr.ip();
    if ip.is_unspecified() {
        return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
    Ok(ip)
}
