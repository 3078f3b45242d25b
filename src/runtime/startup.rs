use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::App;
use crate::config::LibrarySettings;
use crate::library::LibraryLoader;
use crate::permission::{PermissionProvider, request_storage_permission};

/// Pick the library root: command-line argument, then `library.root`, then
/// the working directory.
pub fn library_root(arg: Option<String>, library: &LibrarySettings) -> PathBuf {
    arg.map(PathBuf::from)
        .or_else(|| library.root.clone())
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Check storage access and, when granted, start a background scan of `root`.
///
/// Used both at startup and for a user-requested rescan. On refusal the
/// current catalog is left alone and a notice explains what to do.
pub fn load_library(
    app: &mut App,
    loader: &LibraryLoader,
    provider: &dyn PermissionProvider,
    root: &Path,
) {
    match request_storage_permission(provider) {
        Ok(()) => {
            app.begin_loading();
            let generation = loader.start(root.to_path_buf());
            info!(generation, "library load requested");
        }
        Err(e) => {
            warn!(root = %root.display(), error = %e, "library not scanned");
            app.show_notice(e.title(), e.to_string());
        }
    }
}
