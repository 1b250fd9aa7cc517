mod file_handle;
mod transfer;

pub use file_handle::SendFileHandle;
pub use transfer::{send_file, send_file_with_progress};
