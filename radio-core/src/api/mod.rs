//! HTTP interface: live stream, now-playing events, playback and playlist control

pub mod handlers;
pub mod server;
pub mod sse;
pub mod stream;

pub use server::{create_router, run, AppContext};
