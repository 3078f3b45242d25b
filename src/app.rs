//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the current catalog,
//! the list cursor and pending notices.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
