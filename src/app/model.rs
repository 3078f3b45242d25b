//! Application model types: `App` and `Notice`.
//!
//! The `App` struct holds the current catalog, the list cursor, the loading
//! flag and any message waiting for the user. Playback state lives in the
//! playback bridge, not here.

use crate::library::Catalog;

/// A message box the user has to dismiss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// The main application model.
pub struct App {
    pub catalog: Catalog,
    pub selected: usize,
    pub loading: bool,
    pub notice: Option<Notice>,
    pub current_dir: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an empty `App`; the catalog arrives once the first scan finishes.
    pub fn new() -> Self {
        Self {
            catalog: Catalog::default(),
            selected: 0,
            loading: false,
            notice: None,
            current_dir: None,
        }
    }

    /// Record the current directory in the app state.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn has_tracks(&self) -> bool {
        !self.catalog.is_empty()
    }

    /// Mark a scan as in flight.
    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Swap in a freshly scanned catalog in one step and keep the cursor in range.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.loading = false;
        if self.selected >= self.catalog.len() {
            self.selected = self.catalog.len().saturating_sub(1);
        }
    }

    pub fn show_notice(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notice = Some(Notice {
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Move the cursor to `idx` if it is a valid track.
    pub fn set_selected(&mut self, idx: usize) {
        if idx < self.catalog.len() {
            self.selected = idx;
        }
    }

    /// Move the cursor down one row, stopping at the last track.
    pub fn next(&mut self) {
        if self.selected + 1 < self.catalog.len() {
            self.selected += 1;
        }
    }

    /// Move the cursor up one row, stopping at the first track.
    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.catalog.len().saturating_sub(1);
    }
}
