//! radio-core - Main entry point
//!
//! Starts the playback engine on its own thread and serves the live stream
//! and control API until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radio_core::api::{self, AppContext};
use radio_core::audio::SymphoniaDecoder;
use radio_core::broadcast::BroadcastHub;
use radio_core::config::{Args, Config};
use radio_core::playback::{EngineControl, PlaybackEngine, SqlitePlaylistSource};

/// Now-playing events buffered per SSE client
const NOW_PLAYING_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radio_core=debug,radio_common=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load(&args).context("Failed to load configuration")?;

    info!(
        "Starting radio-core v{} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("RADIO_GIT_HASH"),
        env!("RADIO_BUILD_TIMESTAMP")
    );
    info!("Root folder: {}", config.root_folder.display());
    info!("Database: {}", config.database.display());

    let db_pool = radio_common::db::init_database(&config.database)
        .await
        .context("Failed to initialize database")?;

    let control = EngineControl::new();
    let hub = BroadcastHub::new(config.listener_capacity);
    let (now_playing_tx, _) = broadcast::channel(NOW_PLAYING_CAPACITY);

    let engine = PlaybackEngine::new(
        control.clone(),
        hub.clone(),
        Arc::new(SqlitePlaylistSource::new(db_pool.clone())),
        Arc::new(SymphoniaDecoder),
        now_playing_tx.clone(),
        config.engine.clone(),
    );
    let engine_thread = engine.spawn().context("Failed to start playback engine")?;
    info!("Playback engine started");

    let shutdown = CancellationToken::new();
    let ctx = AppContext {
        control: control.clone(),
        hub,
        now_playing: now_playing_tx,
        db_pool: db_pool.clone(),
        shutdown: shutdown.clone(),
    };

    let stop = {
        let control = control.clone();
        async move {
            shutdown_signal().await;
            // Stop the engine and end open streams so graceful shutdown can finish
            control.shutdown();
            shutdown.cancel();
        }
    };

    let served = api::run(config.port, ctx, stop).await;

    control.shutdown();
    let joined = tokio::task::spawn_blocking(move || engine_thread.join()).await;
    if !matches!(joined, Ok(Ok(()))) {
        error!("Playback engine thread did not exit cleanly");
    }
    db_pool.close().await;

    served.context("Server error")?;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
