//! Library module: finds track files and turns them into a catalog.
//!
//! `scan` walks a directory tree, `metadata` reads tags with fallbacks,
//! `catalog` assembles the ordered track list and `loader` runs the whole
//! pipeline on a background thread.

mod catalog;
mod loader;
mod metadata;
mod model;
mod scan;

pub use catalog::Catalog;
pub use loader::LibraryLoader;
pub use metadata::DEFAULT_MAX_COVER_BYTES;
pub use model::Track;
