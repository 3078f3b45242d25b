//! Playback-related small types.
//!
//! This module defines the queue entries handed to the engine, the state the
//! engine reports back, the selection mirrored by the bridge and the command
//! messages understood by the engine thread.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::error::EngineError;
use crate::library::Track;

/// One entry of the engine queue, with the metadata shown while it plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub id: String,
    pub url: String,
    /// The file itself; `url` is for display and may have lost bytes of a
    /// non UTF-8 name.
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Cover art reference (`data:` URI) passed through untouched.
    pub artwork: Option<String>,
}

impl QueueItem {
    pub fn from_track(position: usize, track: &Track) -> Self {
        Self {
            id: position.to_string(),
            url: track.url(),
            path: track.path.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            artwork: track.cover.clone(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EngineStatus {
    /// Nothing loaded.
    #[default]
    Idle,
    Playing,
    Paused,
    /// Ran past the last queue entry.
    Ended,
}

/// What the engine reports when asked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineState {
    pub status: EngineStatus,
    /// Queue position of the loaded entry, if any.
    pub index: Option<usize>,
    /// Elapsed time in the loaded entry.
    pub elapsed: Duration,
}

impl EngineState {
    pub fn is_playing(&self) -> bool {
        self.status == EngineStatus::Playing
    }
}

/// The bridge's mirror of the engine: which catalog entry is selected and
/// whether it was last known to be playing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PlaybackSelection {
    pub current_index: Option<usize>,
    pub is_playing: bool,
}

pub(super) type Reply<T> = Sender<Result<T, EngineError>>;

/// Messages understood by the engine thread. Every command except `Quit`
/// answers on its reply channel once it has been applied.
#[derive(Debug)]
pub(super) enum EngineCmd {
    Reset(Reply<()>),
    Enqueue(Vec<QueueItem>, Reply<()>),
    SkipTo(usize, Reply<()>),
    Play(Reply<()>),
    Pause(Reply<()>),
    State(Reply<EngineState>),
    Quit,
}
