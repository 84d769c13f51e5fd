//! HTTP request handlers
//!
//! Control endpoints only flip engine state; the engine picks the change up
//! at its next chunk boundary. Playlist writes go to the store first and
//! then request a reload.

use axum::{extract::State, http::StatusCode, Json};
use radio_common::{db, PlaylistEntry};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::server::AppContext;
use crate::broadcast::HubStats;
use crate::playback::PlaybackSnapshot;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct PlaybackStateResponse {
    #[serde(flatten)]
    pub playback: PlaybackSnapshot,
    pub hub: HubStats,
}

#[derive(Debug, Deserialize)]
pub struct DjLiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct DjLiveResponse {
    pub is_dj_live: bool,
}

#[derive(Debug, Deserialize)]
pub struct AppendEntryRequest {
    pub title: String,
    pub source_id: String,
    pub file_path: String,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn status(message: impl Into<String>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: message.into(),
    })
}

fn store_error(e: radio_common::Error) -> ApiError {
    let code = match &e {
        radio_common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if code.is_server_error() {
        error!("Playlist store error: {}", e);
    } else {
        warn!("Rejected playlist request: {}", e);
    }
    (code, status(format!("error: {}", e)))
}

fn validate_entry(title: &str, source_id: &str, file_path: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() || source_id.trim().is_empty() || file_path.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            status("error: title, source_id and file_path are required"),
        ));
    }
    Ok(())
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "radio-core".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("RADIO_GIT_HASH").to_string(),
        build_timestamp: env!("RADIO_BUILD_TIMESTAMP").to_string(),
        build_profile: env!("RADIO_BUILD_PROFILE").to_string(),
    })
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback/state - engine snapshot plus hub counters
pub async fn get_playback_state(State(ctx): State<AppContext>) -> Json<PlaybackStateResponse> {
    Json(PlaybackStateResponse {
        playback: ctx.control.snapshot(),
        hub: ctx.hub.stats(),
    })
}

/// POST /playback/reload - refetch the playlist at the next chunk boundary
pub async fn reload(State(ctx): State<AppContext>) -> (StatusCode, Json<StatusResponse>) {
    ctx.control.request_reload();
    (StatusCode::ACCEPTED, status("reload requested"))
}

/// POST /playback/play
pub async fn play(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.control.set_playing(true);
    status("playing")
}

/// POST /playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.control.set_playing(false);
    status("paused")
}

/// POST /playback/next
pub async fn skip_next(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    info!("Skip to next entry requested");
    ctx.control.skip_next();
    status("skipped")
}

/// POST /playback/previous
pub async fn skip_previous(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    info!("Skip to previous entry requested");
    ctx.control.skip_previous();
    status("skipped")
}

/// POST /dj/live - toggle ducking
pub async fn set_dj_live(
    State(ctx): State<AppContext>,
    Json(req): Json<DjLiveRequest>,
) -> Json<DjLiveResponse> {
    ctx.control.set_live(req.active);
    Json(DjLiveResponse {
        is_dj_live: req.active,
    })
}

// ============================================================================
// Playlist Endpoints
// ============================================================================

/// GET /playlist - the stored playlist in play order
pub async fn get_playlist(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<PlaylistEntry>>, ApiError> {
    let entries = db::playlist::load_playlist(&ctx.db_pool)
        .await
        .map_err(store_error)?;
    Ok(Json(entries))
}

/// PUT /playlist - replace the stored playlist wholesale.
///
/// Entries are renumbered by their position in the request body.
pub async fn replace_playlist(
    State(ctx): State<AppContext>,
    Json(entries): Json<Vec<PlaylistEntry>>,
) -> Result<Json<Vec<PlaylistEntry>>, ApiError> {
    for entry in &entries {
        validate_entry(&entry.title, &entry.source_id, &entry.file_path)?;
    }

    let stored = db::playlist::replace_playlist(&ctx.db_pool, &entries)
        .await
        .map_err(store_error)?;

    ctx.control.request_reload();
    Ok(Json(stored))
}

/// POST /playlist/entries - append one entry at the end of the playlist
pub async fn append_entry(
    State(ctx): State<AppContext>,
    Json(req): Json<AppendEntryRequest>,
) -> Result<(StatusCode, Json<PlaylistEntry>), ApiError> {
    validate_entry(&req.title, &req.source_id, &req.file_path)?;

    let entry = db::playlist::append_entry(&ctx.db_pool, &req.title, &req.source_id, &req.file_path)
        .await
        .map_err(store_error)?;

    ctx.control.request_reload();
    Ok((StatusCode::CREATED, Json(entry)))
}
