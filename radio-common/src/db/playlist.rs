//! Playlist queries
//!
//! The stored playlist is always read and written as a whole sequence
//! ordered by `play_order`.

use crate::playlist::{renumber, PlaylistEntry};
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Load the full playlist ordered by `play_order`
pub async fn load_playlist(pool: &SqlitePool) -> Result<Vec<PlaylistEntry>> {
    let rows = sqlx::query_as::<_, (String, String, String, i64)>(
        r#"
        SELECT title, source_id, file_path, play_order
        FROM playlist
        ORDER BY play_order ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let entries: Vec<PlaylistEntry> = rows
        .into_iter()
        .map(|(title, source_id, file_path, order)| PlaylistEntry {
            title,
            source_id,
            file_path,
            order,
        })
        .collect();

    debug!("Loaded {} playlist entries", entries.len());
    Ok(entries)
}

/// Replace the stored playlist wholesale.
///
/// Entries are renumbered by position. Runs in one transaction so a
/// concurrent `load_playlist` sees either the old or the new sequence.
/// Duplicate `source_id`s are rejected before anything is written.
pub async fn replace_playlist(pool: &SqlitePool, entries: &[PlaylistEntry]) -> Result<Vec<PlaylistEntry>> {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if !seen.insert(entry.source_id.as_str()) {
            return Err(Error::InvalidInput(format!(
                "Duplicate source id in playlist: {}",
                entry.source_id
            )));
        }
    }

    let mut entries = entries.to_vec();
    renumber(&mut entries);

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM playlist").execute(&mut *tx).await?;

    for entry in &entries {
        sqlx::query(
            "INSERT INTO playlist (title, source_id, file_path, play_order) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.title)
        .bind(&entry.source_id)
        .bind(&entry.file_path)
        .bind(entry.order)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!("Playlist replaced: {} entries", entries.len());
    Ok(entries)
}

/// Append one entry at the end of the playlist.
///
/// Returns the stored entry with its assigned `order`. Fails with
/// `InvalidInput` if the source is already in the playlist.
///
/// The position is computed inside the INSERT itself, so concurrent appends
/// never share an `order` and a racing duplicate hits the UNIQUE constraint.
pub async fn append_entry(
    pool: &SqlitePool,
    title: &str,
    source_id: &str,
    file_path: &str,
) -> Result<PlaylistEntry> {
    let inserted = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO playlist (title, source_id, file_path, play_order)
        SELECT ?, ?, ?, COUNT(*) FROM playlist
        RETURNING play_order
        "#,
    )
    .bind(title)
    .bind(source_id)
    .bind(file_path)
    .fetch_one(pool)
    .await;

    let order = match inserted {
        Ok(order) => order,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(Error::InvalidInput(format!(
                "'{}' is already in the playlist",
                title
            )));
        }
        Err(e) => return Err(e.into()),
    };

    info!("Appended '{}' to playlist at position {}", title, order);
    Ok(PlaylistEntry::new(title, source_id, file_path, order))
}
