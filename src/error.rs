//! Error types shared across the player.
//!
//! Filesystem and tag failures never show up here: the scanner and the
//! metadata resolver absorb them. What remains is what the user has to see.

use std::path::PathBuf;

use thiserror::Error;

/// Storage access was not granted, so the library cannot be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// Access was refused; the user can grant it and rescan.
    #[error("Permission denied. Enable it manually.")]
    Denied,
    /// Access is blocked at the OS level and has to be changed in settings.
    #[error("Please enable the permission in settings.")]
    Blocked,
}

impl PermissionError {
    /// Title used for the notice box.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Denied => "Error",
            Self::Blocked => "Permission blocked",
        }
    }
}

/// Failures reported by the media engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no audio output device available")]
    NoOutputDevice,
    #[error("cannot open {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("queue position {index} out of range (queue has {len} items)")]
    OutOfRange { index: usize, len: usize },
    #[error("the queue is empty")]
    EmptyQueue,
    #[error("the audio engine has stopped")]
    Disconnected,
}

/// A transport command could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("track {index} is not in the library ({len} tracks)")]
    InvalidIndex { index: usize, len: usize },
    #[error("Unable to play the file: {0}")]
    Engine(#[from] EngineError),
}

/// Logging could not be set up.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no log directory could be determined")]
    NoDirectory,
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },
    #[error("failed to install log subscriber: {0}")]
    Init(String),
}
