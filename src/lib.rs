//! One file, two peers, one direct TCP connection.
//!
//! The receiver hosts and accepts, the sender dials; once either side is
//! connected the file travels as a small header (name length, name, size)
//! followed by raw bytes until the sender closes.
//!
//! ```rust,ignore
//! use peerdrop::connection::{ConnectionEvent, ConnectionHandler};
//! use peerdrop::receive::recv_file;
//!
//! let handler = ConnectionHandler::new();
//! let listener = handler.host(handler.local_ip()?, 9999)?;
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! handler.accept_connection_from(&listener, sender_ip, std::sync::Arc::new(tx));
//! if let Some(ConnectionEvent::Connected { stream, .. }) = rx.recv().await {
//!     recv_file(stream).await?;
//! }
//! ```

pub mod common;
pub mod connection;
pub mod output;
pub mod receive;
pub mod send;
pub mod transport;
pub mod utils;

pub use common::errors::TransferError;
pub use connection::{ConnectionHandler, ConnectionState, Role, TransferCallback};
