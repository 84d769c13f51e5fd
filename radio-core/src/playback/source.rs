//! Where the engine gets its playlist from
//!
//! The engine calls `load_playlist` synchronously from its own thread, at
//! startup and on every reload. No scheduler runs inside the engine.

use radio_common::PlaylistEntry;
use sqlx::SqlitePool;
use tokio::runtime::Handle;

use crate::error::{Error, Result};

/// Persistence collaborator: yields the full, ordered playlist
pub trait PlaylistSource: Send + Sync {
    fn load_playlist(&self) -> Result<Vec<PlaylistEntry>>;
}

/// Playlist source backed by the SQLite store.
///
/// Bridges to the async pool by blocking on the service runtime's handle.
/// Must be called from a thread that is not driving that runtime, which
/// holds for the engine's dedicated thread.
pub struct SqlitePlaylistSource {
    pool: SqlitePool,
    runtime: Handle,
}

impl SqlitePlaylistSource {
    /// Capture the current runtime handle; call from inside the runtime
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            runtime: Handle::current(),
        }
    }
}

impl PlaylistSource for SqlitePlaylistSource {
    fn load_playlist(&self) -> Result<Vec<PlaylistEntry>> {
        self.runtime
            .block_on(radio_common::db::playlist::load_playlist(&self.pool))
            .map_err(|e| Error::Playlist(e.to_string()))
    }
}
