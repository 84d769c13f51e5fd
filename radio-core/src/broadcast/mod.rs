//! Fan-out of the live audio stream to connected listeners

pub mod hub;

pub use hub::{BroadcastHub, HubStats, ListenerChannel, ListenerId, DEFAULT_LISTENER_CAPACITY};
