//! GET /events - Server-Sent Events for now-playing changes
//!
//! Every `NowPlayingEvent` the engine publishes is forwarded as a
//! `now_playing` event with a JSON payload. Silence heartbeats are
//! forwarded too; clients treat a null title as "nothing playing".

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::api::server::AppContext;

pub const NOW_PLAYING_EVENT: &str = "now_playing";

pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    let rx = ctx.now_playing.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match Event::default().event(NOW_PLAYING_EVENT).json_data(&event) {
                Ok(sse_event) => Some(Ok(sse_event)),
                Err(e) => {
                    warn!("Failed to serialize now-playing event: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagged: this client missed some events, keep going
                warn!("SSE client fell behind: {}", e);
                None
            }
        }
    })
    .take_until(ctx.shutdown.clone().cancelled_owned());

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
