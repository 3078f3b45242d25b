use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{EngineError, PlaybackError};
use crate::library::Track;

use super::engine::MediaEngine;
use super::types::{PlaybackSelection, QueueItem};

/// Drives a [`MediaEngine`] from catalog indices and keeps a local mirror of
/// what it is doing.
///
/// The bridge owns the engine: nothing else issues commands to it. The
/// snapshot it loaded is kept so `next`/`previous` bounds always refer to
/// the queue the engine actually holds.
pub struct PlaybackBridge<E: MediaEngine> {
    engine: E,
    queue: Option<Arc<[Track]>>,
    selection: PlaybackSelection,
    elapsed: Duration,
}

impl<E: MediaEngine> PlaybackBridge<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            queue: None,
            selection: PlaybackSelection::default(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn selection(&self) -> PlaybackSelection {
        self.selection
    }

    /// The selected track, from the snapshot loaded into the engine.
    pub fn current_track(&self) -> Option<&Track> {
        let i = self.selection.current_index?;
        self.queue.as_ref()?.get(i)
    }

    /// Elapsed time in the current track as of the last `sync`.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn queue_len(&self) -> usize {
        self.queue.as_ref().map_or(0, |q| q.len())
    }

    /// Load the whole `snapshot` into the engine and start playing `index`.
    ///
    /// If the engine refuses the reset, the previous selection is kept as it
    /// was. Any later failure leaves the engine empty and clears the selection.
    pub fn select_and_play(
        &mut self,
        snapshot: Arc<[Track]>,
        index: usize,
    ) -> Result<(), PlaybackError> {
        if index >= snapshot.len() {
            return Err(PlaybackError::InvalidIndex {
                index,
                len: snapshot.len(),
            });
        }

        let items: Vec<QueueItem> = snapshot
            .iter()
            .enumerate()
            .map(|(i, t)| QueueItem::from_track(i, t))
            .collect();

        self.engine.reset()?;
        // The engine queue is gone from here on, so a failure drops the mirror too.
        if let Err(e) = self.load_and_play(items, index) {
            warn!(index, error = %e, "engine emptied by a failed selection");
            self.clear();
            return Err(e.into());
        }

        info!(index, path = %snapshot[index].path.display(), "playback started");
        self.queue = Some(snapshot);
        self.selection = PlaybackSelection {
            current_index: Some(index),
            is_playing: true,
        };
        self.elapsed = Duration::ZERO;
        Ok(())
    }

    fn load_and_play(&self, items: Vec<QueueItem>, index: usize) -> Result<(), EngineError> {
        self.engine.enqueue(items)?;
        self.engine.skip_to(index)?;
        self.engine.play()
    }

    fn clear(&mut self) {
        self.queue = None;
        self.selection = PlaybackSelection::default();
        self.elapsed = Duration::ZERO;
    }

    /// Pause when the engine says it is playing, play otherwise.
    pub fn toggle_playback(&mut self) -> Result<(), PlaybackError> {
        if self.selection.current_index.is_none() {
            return Ok(());
        }

        let state = self.engine.state()?;
        if state.is_playing() {
            self.engine.pause()?;
            self.selection.is_playing = false;
        } else {
            self.engine.play()?;
            self.selection.is_playing = true;
        }
        debug!(playing = self.selection.is_playing, "toggled");
        Ok(())
    }

    /// Skip forward one track; does nothing without a selection or at the last track.
    pub fn next(&mut self) -> Result<(), PlaybackError> {
        let Some(current) = self.selection.current_index else {
            return Ok(());
        };
        if current + 1 >= self.queue_len() {
            return Ok(());
        }
        self.jump(current + 1)
    }

    /// Skip back one track; does nothing without a selection or at the first track.
    pub fn previous(&mut self) -> Result<(), PlaybackError> {
        let Some(current) = self.selection.current_index else {
            return Ok(());
        };
        if current == 0 {
            return Ok(());
        }
        self.jump(current - 1)
    }

    fn jump(&mut self, index: usize) -> Result<(), PlaybackError> {
        self.engine.skip_to(index)?;
        self.engine.play()?;
        self.selection = PlaybackSelection {
            current_index: Some(index),
            is_playing: true,
        };
        self.elapsed = Duration::ZERO;
        debug!(index, "skipped");
        Ok(())
    }

    /// Refresh the mirror from the engine, which may have moved on by itself.
    pub fn sync(&mut self) -> Result<(), PlaybackError> {
        if self.selection.current_index.is_none() {
            return Ok(());
        }

        let state = self.engine.state()?;
        if let Some(i) = state.index.filter(|&i| i < self.queue_len()) {
            self.selection.current_index = Some(i);
        }
        self.selection.is_playing = state.is_playing();
        self.elapsed = state.elapsed;
        Ok(())
    }

    /// Revalidate the selection after a rescan.
    ///
    /// If the new catalog lists the same files in the same order the
    /// selection carries over. Otherwise the engine is reset and the
    /// selection cleared, since the loaded queue no longer matches what the
    /// user sees.
    pub fn on_catalog_replaced(&mut self, snapshot: &Arc<[Track]>) -> Result<(), PlaybackError> {
        let Some(queue) = self.queue.as_ref() else {
            return Ok(());
        };

        let same_files = queue.len() == snapshot.len()
            && queue.iter().zip(snapshot.iter()).all(|(a, b)| a.path == b.path);
        if same_files {
            self.queue = Some(Arc::clone(snapshot));
            return Ok(());
        }

        info!("library changed under the selection, stopping playback");
        self.clear();
        self.engine.reset()?;
        Ok(())
    }
}
