use std::path::{Path, PathBuf};
use std::time::Duration;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// A resolved library entry. `path` is absolute and unique within a catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Cover art as a `data:` URI, ready to hand to anything that displays images.
    pub cover: Option<String>,
    pub duration: Option<Duration>,
}

impl Track {
    /// The record used when no tags could be read.
    pub fn fallback(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            title: file_title(path),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            cover: None,
            duration: None,
        }
    }

    /// `artist<sep>album`, as shown under the title.
    pub fn subtitle(&self, sep: &str) -> String {
        format!("{}{}{}", self.artist, sep, self.album)
    }

    /// Playable location handed to the media engine.
    pub fn url(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

/// File name without directory or extension.
pub(crate) fn file_title(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Unknown Title".to_string())
}
