//! Playback engine, its shared state, and its playlist source

pub mod engine;
pub mod source;
pub mod state;

pub use engine::{EngineConfig, PlaybackEngine};
pub use source::{PlaylistSource, SqlitePlaylistSource};
pub use state::{EngineControl, PlaybackSnapshot, PlaybackState};
