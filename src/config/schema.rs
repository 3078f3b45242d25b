use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/pochette/config.toml` or `~/.config/pochette/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `POCHETTE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory to scan when none is given on the command line.
    pub root: Option<PathBuf>,
    /// File extensions to treat as tracks (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning. Links back to an
    /// ancestor directory are skipped either way.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Visit directory entries in file-name order instead of the order the
    /// filesystem returns them.
    pub sort_entries: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// Number of threads reading tags while the catalog is built.
    pub metadata_workers: usize,
    /// Embedded pictures larger than this are not turned into cover art.
    pub max_cover_bytes: usize,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: vec!["mp3".into()],
            follow_links: true,
            include_hidden: true,
            sort_entries: false,
            max_depth: None,
            metadata_workers: 4,
            max_cover_bytes: crate::library::DEFAULT_MAX_COVER_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// How often the local play/pause mirror is refreshed from the engine (milliseconds).
    pub sync_interval_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            sync_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Separator between artist and album under each title.
    pub subtitle_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " Audio files ".to_string(),
            subtitle_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Where log files go. Defaults to `$XDG_STATE_HOME/pochette`.
    pub directory: Option<PathBuf>,
    /// Log file name prefix; files rotate daily.
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "pochette.log".to_string(),
        }
    }
}
