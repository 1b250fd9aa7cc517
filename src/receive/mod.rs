mod storage;
mod transfer;

pub use storage::{check_disk_space, FixedSpace, SpaceProbe, SystemSpace};
pub use transfer::{recv_file, FileReceiver, ReceivedFile};
