//! Playlist model shared between the store and the playback engine

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One entry of the DJ's playlist.
///
/// Entries are immutable once handed to the playback engine; a reload
/// replaces the whole sequence. `order` defines play sequence. Uniqueness of
/// `source_id` is the store's concern, not the engine's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub title: String,
    /// Identifier of the upstream source (e.g. a video id)
    pub source_id: String,
    /// Path of the downloaded audio file
    pub file_path: String,
    #[serde(default)]
    pub order: i64,
}

impl PlaylistEntry {
    pub fn new(
        title: impl Into<String>,
        source_id: impl Into<String>,
        file_path: impl Into<String>,
        order: i64,
    ) -> Self {
        Self {
            title: title.into(),
            source_id: source_id.into(),
            file_path: file_path.into(),
            order,
        }
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.file_path)
    }
}

/// Renumber `order` to `0..n` following list position.
///
/// Used when a client submits a whole playlist: position in the submitted
/// list wins over any `order` it carried.
pub fn renumber(entries: &mut [PlaylistEntry]) {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.order = i as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renumber_uses_position() {
        let mut entries = vec![
            PlaylistEntry::new("B", "b", "/music/b.mp3", 7),
            PlaylistEntry::new("A", "a", "/music/a.mp3", 3),
        ];
        renumber(&mut entries);
        assert_eq!(entries[0].title, "B");
        assert_eq!(entries[0].order, 0);
        assert_eq!(entries[1].order, 1);
    }

    #[test]
    fn test_order_defaults_when_missing() {
        let entry: PlaylistEntry = serde_json::from_str(
            r#"{"title":"A","source_id":"abc","file_path":"/music/a.mp3"}"#,
        )
        .unwrap();
        assert_eq!(entry.order, 0);
        assert_eq!(entry.path(), Path::new("/music/a.mp3"));
    }
}
