#![allow(dead_code)]

pub mod config_test_utils;

use peerdrop::connection::{ConnectionEvent, Role, TransferCallback};
use peerdrop::TransferError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

pub const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

pub fn create_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

pub fn write_source_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write source file");
    path
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind((LOOPBACK, 0)).expect("bind probe listener");
    let port = listener.local_addr().expect("probe addr").port();
    drop(listener);
    port
}

/// Channel-backed callback, as the CLI uses it.
pub fn event_channel() -> (
    Arc<mpsc::UnboundedSender<ConnectionEvent>>,
    mpsc::UnboundedReceiver<ConnectionEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

/// Drain every event already delivered.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ConnectionEvent>) -> Vec<ConnectionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Counts callback invocations and keeps what they carried.
#[derive(Default)]
pub struct CountingCallback {
    pub connected: AtomicUsize,
    pub failed: AtomicUsize,
    pub streams: Mutex<Vec<(TcpStream, Role)>>,
    pub messages: Mutex<Vec<String>>,
}

impl CountingCallback {
    pub fn connected_count(&self) -> usize {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn take_stream(&self) -> Option<(TcpStream, Role)> {
        self.streams.lock().expect("streams lock").pop()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().expect("messages lock").last().cloned()
    }
}

impl TransferCallback for CountingCallback {
    fn on_connected(&self, stream: TcpStream, role: Role) {
        self.connected.fetch_add(1, Ordering::SeqCst);
        self.streams.lock().expect("streams lock").push((stream, role));
    }

    fn on_connect_failed(&self, error: TransferError) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.messages
            .lock()
            .expect("messages lock")
            .push(error.to_string());
    }
}

pub fn addr(port: u16) -> SocketAddr {
    SocketAddr::new(LOOPBACK, port)
}
