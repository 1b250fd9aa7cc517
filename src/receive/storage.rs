//! Destination checks made before anything is written.

use crate::common::errors::TransferError;
use std::path::{Path, PathBuf};

/// Reports free bytes on the volume holding a directory.
pub trait SpaceProbe: Send + Sync {
    fn available_space(&self, dir: &Path) -> Result<u64, TransferError>;
}

/// Free space as reported by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpace;

impl SpaceProbe for SystemSpace {
    /// Queries the filesystem holding `dir` directly, so tmpfs and bind
    /// mounts report their own figure rather than their parent's.
    fn available_space(&self, dir: &Path) -> Result<u64, TransferError> {
        fs2::available_space(dir).map_err(|source| {
            tracing::warn!(dir = %dir.display(), error = %source, "free space query failed");
            TransferError::SpaceUnknown {
                path: dir.to_path_buf(),
            }
        })
    }
}

/// Fixed answer, for tests and for callers that already know the figure.
#[derive(Debug, Clone, Copy)]
pub struct FixedSpace(pub u64);

impl SpaceProbe for FixedSpace {
    fn available_space(&self, _dir: &Path) -> Result<u64, TransferError> {
        Ok(self.0)
    }
}

/// Fail with [`TransferError::InsufficientSpace`] if `required` bytes do not
/// fit in `dir`.
pub fn check_disk_space(
    probe: &dyn SpaceProbe,
    dir: &Path,
    required: u128,
) -> Result<(), TransferError> {
    let available = probe.available_space(dir)?;

    if required > u128::from(available) {
        return Err(TransferError::InsufficientSpace {
            required,
            available,
            path: dir.to_path_buf(),
        });
    }

    Ok(())
}

/// Final location for a received file. Existing files are overwritten.
pub fn destination_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_when_required_equals_available() {
        assert!(check_disk_space(&FixedSpace(100), Path::new("."), 100).is_ok());
        assert!(check_disk_space(&FixedSpace(0), Path::new("."), 0).is_ok());
    }

    #[test]
    fn reports_both_figures_when_short() {
        let err = check_disk_space(&FixedSpace(10), Path::new("/data"), 11).unwrap_err();
        match err {
            TransferError::InsufficientSpace {
                required,
                available,
                path,
            } => {
                assert_eq!(required, 11);
                assert_eq!(available, 10);
                assert_eq!(path, PathBuf::from("/data"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn declared_size_beyond_u64_never_fits() {
        let huge = u128::from(u64::MAX) + 1;
        assert!(check_disk_space(&FixedSpace(u64::MAX), Path::new("."), huge).is_err());
    }

    #[test]
    fn system_space_answers_for_a_tempdir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let available = SystemSpace
            .available_space(dir.path())
            .expect("free space of an existing directory");
        assert!(available > 0);
    }

    #[test]
    fn system_space_measures_tmpfs_itself() {
        let shm = Path::new("/dev/shm");
        if !shm.is_dir() {
            return;
        }
        let dir = tempfile::tempdir_in(shm).expect("tempdir in /dev/shm");

        let inside = SystemSpace.available_space(dir.path()).unwrap();
        let volume = fs2::available_space(shm).unwrap();
        // other processes may allocate in between
        assert!(inside.abs_diff(volume) < 64 * 1024 * 1024, "{inside} vs {volume}");
    }

    #[test]
    fn missing_dir_is_space_unknown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SystemSpace
            .available_space(&dir.path().join("absent"))
            .unwrap_err();
        assert!(matches!(err, TransferError::SpaceUnknown { .. }));
    }

    #[test]
    fn destination_is_inside_dir() {
        assert_eq!(
            destination_path(Path::new("/incoming"), "report.pdf"),
            PathBuf::from("/incoming/report.pdf")
        );
    }
}
