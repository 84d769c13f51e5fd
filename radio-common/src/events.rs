//! Event types published by the playback engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::playlist::PlaylistEntry;

/// "Now playing" status.
///
/// Emitted once per track change, and once per idle interval while nothing
/// is playing. A `None` title means silence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingEvent {
    pub title: Option<String>,
    pub source_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NowPlayingEvent {
    /// Event announcing that `entry` started streaming
    pub fn track(entry: &PlaylistEntry) -> Self {
        Self {
            title: Some(entry.title.clone()),
            source_id: Some(entry.source_id.clone()),
            timestamp: Utc::now(),
        }
    }

    /// Idle heartbeat
    pub fn silence() -> Self {
        Self {
            title: None,
            source_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_silence(&self) -> bool {
        self.title.is_none()
    }
}
