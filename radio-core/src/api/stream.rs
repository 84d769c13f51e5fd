//! GET /stream - the live audio stream
//!
//! Each request registers a listener with the hub and forwards its chunks
//! as the response body. When the client goes away the body stream is
//! dropped, which drops the `ListenerChannel` and unregisters it. The body
//! also ends at server shutdown.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::IntoResponse,
};
use futures::StreamExt;
use tracing::{debug, info};

use crate::api::server::AppContext;
use crate::broadcast::ListenerChannel;

/// Raw PCM as produced by the engine (signed little-endian)
pub const STREAM_CONTENT_TYPE: &str = "application/octet-stream";

pub async fn stream_audio(State(ctx): State<AppContext>) -> impl IntoResponse {
    let listener = ctx.hub.register();
    info!("Stream client connected as listener {}", listener.id());

    let chunks = futures::stream::unfold(listener, |mut listener: ListenerChannel| async move {
        match listener.recv().await {
            Some(chunk) => Some((Ok::<_, Infallible>(chunk.data), listener)),
            None => {
                debug!("Listener {} channel closed, ending stream", listener.id());
                None
            }
        }
    })
    .take_until(ctx.shutdown.clone().cancelled_owned());

    (
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(chunks),
    )
}
