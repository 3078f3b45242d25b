//! Storage permission gate.
//!
//! The scan only starts once the provider reports that the library can be
//! read. On the desktop the "permission" is whether the OS lets us list the
//! library root.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::PermissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    /// Read access to audio files in shared storage.
    ReadAudio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    /// Not granted yet; asking may change that.
    Denied,
    /// Refused in a way only the user can undo (OS settings).
    Blocked,
    /// The permission does not exist on this system.
    Unavailable,
}

#[cfg_attr(test, mockall::automock)]
pub trait PermissionProvider {
    fn check_status(&self, kind: PermissionKind) -> PermissionStatus;
    fn request_access(&self, kind: PermissionKind) -> PermissionStatus;
}

/// Maps the readability of the library root onto permission states.
pub struct FsPermissionProvider {
    root: PathBuf,
}

impl FsPermissionProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PermissionProvider for FsPermissionProvider {
    fn check_status(&self, _kind: PermissionKind) -> PermissionStatus {
        match fs::read_dir(&self.root) {
            Ok(_) => PermissionStatus::Granted,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => PermissionStatus::Blocked,
            Err(e) if e.kind() == ErrorKind::NotFound => PermissionStatus::Denied,
            Err(e) => {
                debug!(root = %self.root.display(), error = %e, "library root not listable");
                PermissionStatus::Unavailable
            }
        }
    }

    // There is no prompt to show on a terminal; the best we can do is look again.
    fn request_access(&self, kind: PermissionKind) -> PermissionStatus {
        self.check_status(kind)
    }
}

/// Ask `provider` for read access, requesting it once if it was merely denied.
pub fn request_storage_permission(
    provider: &dyn PermissionProvider,
) -> Result<(), PermissionError> {
    let kind = PermissionKind::ReadAudio;
    let status = provider.check_status(kind);
    debug!(?status, "storage permission checked");

    match status {
        PermissionStatus::Granted => Ok(()),
        PermissionStatus::Denied => {
            let requested = provider.request_access(kind);
            debug!(status = ?requested, "storage permission requested");
            if requested == PermissionStatus::Granted {
                Ok(())
            } else {
                warn!("storage permission denied");
                Err(PermissionError::Denied)
            }
        }
        PermissionStatus::Blocked => {
            warn!("storage permission blocked");
            Err(PermissionError::Blocked)
        }
        PermissionStatus::Unavailable => Err(PermissionError::Denied),
    }
}
