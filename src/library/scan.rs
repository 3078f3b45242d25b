use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

fn target_extensions(settings: &LibrarySettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn has_target_extension(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Walk `dir` depth-first and return the absolute paths of every file with a
/// target extension.
///
/// Unreadable directories are skipped along with everything below them; an
/// unreadable root yields an empty list.
#[cfg(test)]
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    scan_cancellable(dir, settings, || false)
}

/// Walk `dir` like `scan`, but stop early (returning what was found so far) once
/// `is_stale` reports that the result is no longer wanted.
pub fn scan_cancellable(
    dir: &Path,
    settings: &LibrarySettings,
    is_stale: impl Fn() -> bool,
) -> Vec<PathBuf> {
    let root = match std::path::absolute(dir) {
        Ok(p) => p,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot resolve scan root");
            return Vec::new();
        }
    };
    let exts = target_extensions(settings);

    // walkdir reports a followed link that points back at an ancestor as a
    // loop error instead of descending into it.
    let mut walker = WalkDir::new(&root).follow_links(settings.follow_links);
    if let Some(d) = settings.max_depth {
        walker = walker.max_depth(d);
    }
    if settings.sort_entries {
        walker = walker.sort_by_file_name();
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        if is_stale() {
            debug!(root = %root.display(), found = paths.len(), "scan superseded, stopping");
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                match err.loop_ancestor() {
                    Some(ancestor) => debug!(
                        path = ?err.path(),
                        ancestor = %ancestor.display(),
                        "skipping symlink loop"
                    ),
                    None => debug!(path = ?err.path(), error = %err, "skipping unreadable entry"),
                }
                continue;
            }
        };

        // The root itself is listed, never matched.
        if entry.depth() > 0 && entry.file_type().is_file() && has_target_extension(entry.path(), &exts)
        {
            trace!(path = %entry.path().display(), "track found");
            paths.push(entry.into_path());
        }
    }

    debug!(root = %root.display(), found = paths.len(), "scan finished");
    paths
}
