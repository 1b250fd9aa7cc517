pub mod config;
pub mod config_commands;
pub mod errors;
pub mod header;
pub mod progress;

pub use config::{AppConfig, ConfigOverrides};
pub use errors::TransferError;
pub use header::TransferHeader;
