use crate::error::EngineError;

use super::types::{EngineState, QueueItem};

/// A queue-based media player.
///
/// Calls return once the engine has applied them; callers issue them one at
/// a time because the queue and position are plain mutable state.
#[cfg_attr(test, mockall::automock)]
pub trait MediaEngine {
    /// Stop playback and empty the queue.
    fn reset(&self) -> Result<(), EngineError>;
    /// Append `items` to the queue.
    fn enqueue(&self, items: Vec<QueueItem>) -> Result<(), EngineError>;
    /// Load queue position `index`, keeping the current play/pause state.
    fn skip_to(&self, index: usize) -> Result<(), EngineError>;
    fn play(&self) -> Result<(), EngineError>;
    fn pause(&self) -> Result<(), EngineError>;
    fn state(&self) -> Result<EngineState, EngineError>;
}
