//! HTTP server setup and routing

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use radio_common::NowPlayingEvent;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::broadcast::BroadcastHub;
use crate::error::{Error, Result};
use crate::playback::EngineControl;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub control: EngineControl,
    pub hub: BroadcastHub,
    /// Sender side of the now-playing channel; SSE clients subscribe to it
    pub now_playing: broadcast::Sender<NowPlayingEvent>,
    pub db_pool: SqlitePool,
    /// Cancelled at shutdown; ends open stream and SSE responses
    pub shutdown: CancellationToken,
}

/// Build the router with every route attached
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        // Live audio and events
        .route("/stream", get(super::stream::stream_audio))
        .route("/events", get(super::sse::event_stream))
        // Playback control
        .route("/playback/state", get(super::handlers::get_playback_state))
        .route("/playback/reload", post(super::handlers::reload))
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/pause", post(super::handlers::pause))
        .route("/playback/next", post(super::handlers::skip_next))
        .route("/playback/previous", post(super::handlers::skip_previous))
        .route("/dj/live", post(super::handlers::set_dj_live))
        // Playlist store
        .route(
            "/playlist",
            get(super::handlers::get_playlist).put(super::handlers::replace_playlist),
        )
        .route("/playlist/entries", post(super::handlers::append_entry))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API on `port` until `shutdown` resolves
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
