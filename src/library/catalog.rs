use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::config::LibrarySettings;

use super::metadata::{LoftyTagReader, TagReader, resolve_with};
use super::model::Track;

/// The tracks produced by one scan, in scan order.
///
/// The track list is frozen behind an `Arc`, so handing a snapshot to the
/// player and replacing the catalog afterwards never exposes a half-built list.
#[derive(Clone, Debug)]
pub struct Catalog {
    generation: u64,
    tracks: Arc<[Track]>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(0, Vec::new())
    }
}

impl Catalog {
    pub fn new(generation: u64, tracks: Vec<Track>) -> Self {
        Self {
            generation,
            tracks: tracks.into(),
        }
    }

    /// Scan generation that produced this catalog (0 for the empty startup catalog).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn snapshot(&self) -> Arc<[Track]> {
        Arc::clone(&self.tracks)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Resolve every path with the default tag reader. `out[i].path == paths[i]`.
pub fn build_catalog(paths: &[PathBuf], settings: &LibrarySettings) -> Vec<Track> {
    build_catalog_with(
        paths,
        &LoftyTagReader,
        settings.metadata_workers,
        settings.max_cover_bytes,
    )
}

/// Resolve `paths` on up to `workers` threads, each taking a contiguous chunk.
///
/// Chunks are joined back in spawn order, so the output lines up with the
/// input whatever order the workers finish in.
pub fn build_catalog_with<R: TagReader + ?Sized>(
    paths: &[PathBuf],
    reader: &R,
    workers: usize,
    max_cover_bytes: usize,
) -> Vec<Track> {
    if paths.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, paths.len());
    if workers == 1 {
        return paths
            .iter()
            .map(|p| resolve_with(reader, p, max_cover_bytes))
            .collect();
    }

    let chunk_len = paths.len().div_ceil(workers);
    debug!(tracks = paths.len(), workers, "resolving metadata");

    thread::scope(|s| {
        let handles: Vec<_> = paths
            .chunks(chunk_len)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|p| resolve_with(reader, p, max_cover_bytes))
                        .collect::<Vec<Track>>()
                })
            })
            .collect();

        let mut tracks = Vec::with_capacity(paths.len());
        for (chunk, handle) in paths.chunks(chunk_len).zip(handles) {
            match handle.join() {
                Ok(resolved) => tracks.extend(resolved),
                // Keep the slot filled so indices stay aligned with `paths`.
                Err(_) => tracks.extend(chunk.iter().map(|p| Track::fallback(p))),
            }
        }
        tracks
    })
}
