//! Error types for radio-core
//!
//! Track errors (missing file, undecodable audio) are recoverable by
//! skipping the track; playlist errors by keeping the previous playlist.
//! None of them stop the engine.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for radio-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from radio-common (store, config)
    #[error(transparent)]
    Common(#[from] radio_common::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Track file does not exist
    #[error("Audio file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Container or codec not recognised
    #[error("Unsupported audio format in {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// Audio decoding errors
    #[error("Audio decode error in {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// Playlist could not be loaded from the store
    #[error("Playlist error: {0}")]
    Playlist(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error concerns a single track and playback can move on
    pub fn is_track_error(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_) | Error::UnsupportedFormat { .. } | Error::Decode { .. }
        )
    }
}

/// Convenience Result type using radio-core Error
pub type Result<T> = std::result::Result<T, Error>;
