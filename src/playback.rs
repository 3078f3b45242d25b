//! Playback module: the engine abstraction, the `rodio` engine and the
//! bridge that turns catalog selections into engine commands.

mod bridge;
mod engine;
mod player;
mod queue;
mod sink;
mod thread;
mod types;

pub use bridge::PlaybackBridge;
pub use engine::MediaEngine;
#[cfg(test)]
pub use engine::MockMediaEngine;
pub use player::RodioEngine;
pub use types::PlaybackSelection;
