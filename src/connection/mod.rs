mod callback;
mod handler;
mod state;

pub use callback::{ConnectionEvent, Role, TransferCallback};
pub use handler::{ConnectAttempt, ConnectionHandler, HandlerSettings};
pub use state::ConnectionState;
