//! # Radio Common Library
//!
//! Shared code for the radio services:
//! - Playlist model (`PlaylistEntry`)
//! - Event types (`NowPlayingEvent`)
//! - Configuration file and root folder resolution
//! - SQLite playlist store

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod playlist;

pub use error::{Error, Result};
pub use events::NowPlayingEvent;
pub use playlist::PlaylistEntry;
