use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, info, warn};

use crate::config::LibrarySettings;

use super::catalog::{Catalog, build_catalog};
use super::scan::scan_cancellable;

/// Result of a background scan, tagged with the generation that asked for it.
#[derive(Debug)]
struct Loaded {
    generation: u64,
    catalog: Catalog,
}

/// Runs scans on background threads.
///
/// Every `start` bumps a generation counter. Older scans notice they are
/// stale, stop walking, and whatever they still manage to send is dropped by
/// `try_recv`.
pub struct LibraryLoader {
    settings: LibrarySettings,
    latest: Arc<AtomicU64>,
    tx: Sender<Loaded>,
    rx: Receiver<Loaded>,
}

impl LibraryLoader {
    pub fn new(settings: LibrarySettings) -> Self {
        let (tx, rx) = mpsc::channel::<Loaded>();
        Self {
            settings,
            latest: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
        }
    }

    /// Start scanning `root`, superseding any scan still in flight.
    pub fn start(&self, root: PathBuf) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.latest);
        let settings = self.settings.clone();
        let tx = self.tx.clone();

        info!(root = %root.display(), generation, "scan started");
        let spawned = thread::Builder::new()
            .name(format!("library-scan-{generation}"))
            .spawn(move || {
                let is_stale = || latest.load(Ordering::SeqCst) != generation;

                let paths = scan_cancellable(&root, &settings, &is_stale);
                if is_stale() {
                    debug!(generation, "scan superseded before metadata");
                    return;
                }
                let tracks = build_catalog(&paths, &settings);
                if is_stale() {
                    debug!(generation, "scan superseded after metadata");
                    return;
                }

                info!(generation, tracks = tracks.len(), "scan finished");
                let _ = tx.send(Loaded {
                    generation,
                    catalog: Catalog::new(generation, tracks),
                });
            });
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn scan thread");
        }

        generation
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Take the catalog of the most recent scan if it has arrived.
    pub fn try_recv(&self) -> Option<Catalog> {
        let mut current = None;
        while let Ok(loaded) = self.rx.try_recv() {
            self.accept(loaded, &mut current);
        }
        current
    }

    #[cfg(test)]
    pub(crate) fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Catalog> {
        let deadline = std::time::Instant::now() + timeout;
        let mut current = None;
        while current.is_none() {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(loaded) => self.accept(loaded, &mut current),
                Err(_) => break,
            }
        }
        current
    }

    fn accept(&self, loaded: Loaded, current: &mut Option<Catalog>) {
        if loaded.generation == self.latest_generation() {
            *current = Some(loaded.catalog);
        } else {
            debug!(
                generation = loaded.generation,
                latest = self.latest_generation(),
                "discarding stale scan result"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn settings() -> LibrarySettings {
        LibrarySettings {
            sort_entries: true,
            metadata_workers: 2,
            ..LibrarySettings::default()
        }
    }

    #[test]
    fn loads_catalog_in_the_background() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.mp3"), b"x").unwrap();
        fs::write(dir.path().join("two.mp3"), b"x").unwrap();

        let loader = LibraryLoader::new(settings());
        let generation = loader.start(dir.path().to_path_buf());

        let catalog = loader.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(catalog.generation(), generation);
        let titles: Vec<&str> = catalog.tracks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two"]);
    }

    #[test]
    fn newer_scan_supersedes_older_one() {
        let old = tempdir().unwrap();
        fs::write(old.path().join("old.mp3"), b"x").unwrap();
        let new = tempdir().unwrap();
        fs::write(new.path().join("new.mp3"), b"x").unwrap();

        let loader = LibraryLoader::new(settings());
        let first = loader.start(old.path().to_path_buf());
        let second = loader.start(new.path().to_path_buf());
        assert!(second > first);

        let catalog = loader.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(catalog.generation(), second);
        assert_eq!(catalog.tracks()[0].title, "new");

        // Nothing from the first scan may surface later either.
        std::thread::sleep(Duration::from_millis(100));
        assert!(loader.try_recv().is_none());
    }

    #[test]
    fn stale_results_are_dropped() {
        let loader = LibraryLoader::new(settings());
        loader.latest.store(3, Ordering::SeqCst);
        loader
            .tx
            .send(Loaded {
                generation: 2,
                catalog: Catalog::new(2, Vec::new()),
            })
            .unwrap();
        assert!(loader.try_recv().is_none());
    }
}
