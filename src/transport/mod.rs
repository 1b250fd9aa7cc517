pub mod local;

pub use local::{bind_listener, get_local_ip, get_local_ip_via, ListenSocket};
