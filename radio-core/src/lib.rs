//! # Radio Core
//!
//! Real-time audio delivery for the shared radio: a playback engine that
//! decodes the DJ's playlist into paced PCM chunks (ducked while the DJ is
//! live) and a broadcast hub that fans those chunks out to every connected
//! listener without letting a slow one hold the others back.
//!
//! The HTTP layer in [`api`] exposes the stream, now-playing events and the
//! playback and playlist controls.

pub mod api;
pub mod audio;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
