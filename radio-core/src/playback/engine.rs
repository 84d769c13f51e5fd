//! Playback engine
//!
//! A single sequential loop on a dedicated thread drives the live stream:
//! decode the current entry, cut it into fixed-size chunks, duck them while
//! the DJ is live, hand them to the broadcast hub and sleep for each chunk's
//! real-time duration. Pacing is open loop; slow drift is accepted.
//!
//! Before every chunk the loop checks for a pending reload, a skip, a pause
//! or a shutdown. Any of those abandons the track without advancing, so a
//! reload resumes at the (repaired) current index and the interrupted entry
//! restarts from its beginning.
//!
//! Track failures (missing or undecodable file) advance like a completed
//! track but emit nothing. A failed reload keeps the previous playlist.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use radio_common::{NowPlayingEvent, PlaylistEntry};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::audio::decoder::TrackDecoder;
use crate::audio::ducking::{Ducker, DEFAULT_DUCK_DB};
use crate::audio::types::{split_chunks, AudioChunk, DEFAULT_CHUNK_SIZE};
use crate::broadcast::BroadcastHub;
use crate::error::Result;
use crate::playback::source::PlaylistSource;
use crate::playback::state::EngineControl;

/// Longest single sleep while idle, so shutdown and reload stay responsive
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Engine tunables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bytes of PCM per emitted chunk
    pub chunk_size_bytes: usize,
    /// Heartbeat period while nothing is playing
    pub idle_interval: Duration,
    /// Attenuation applied while the DJ is live
    pub duck_db: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
            idle_interval: Duration::from_secs(1),
            duck_db: DEFAULT_DUCK_DB,
        }
    }
}

/// How a track left the playback loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackOutcome {
    /// Every chunk was emitted
    Completed,
    /// Could not be loaded; nothing was emitted
    Failed,
    /// Abandoned for a reload, skip or pause
    Interrupted,
    /// Engine is shutting down
    Shutdown,
}

pub struct PlaybackEngine {
    control: EngineControl,
    hub: BroadcastHub,
    source: Arc<dyn PlaylistSource>,
    decoder: Arc<dyn TrackDecoder>,
    now_playing: broadcast::Sender<NowPlayingEvent>,
    ducker: Ducker,
    config: EngineConfig,
}

impl PlaybackEngine {
    pub fn new(
        control: EngineControl,
        hub: BroadcastHub,
        source: Arc<dyn PlaylistSource>,
        decoder: Arc<dyn TrackDecoder>,
        now_playing: broadcast::Sender<NowPlayingEvent>,
        config: EngineConfig,
    ) -> Self {
        Self {
            control,
            hub,
            source,
            decoder,
            now_playing,
            ducker: Ducker::new(config.duck_db),
            config,
        }
    }

    /// Run the engine on its own named thread
    pub fn spawn(self) -> Result<thread::JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("playback-engine".to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }

    /// Engine loop. Blocks until `EngineControl::shutdown` is called.
    pub fn run(&self) {
        info!(
            "Playback engine started (chunk {} bytes, idle interval {:?}, duck {} dB)",
            self.config.chunk_size_bytes, self.config.idle_interval, self.config.duck_db
        );

        self.reload();
        let mut consecutive_failures = 0usize;

        while !self.control.is_shutdown() {
            if self.control.take_reload_request() {
                self.reload();
            }

            let Some((index, entry, playlist_len)) = self.select_track() else {
                consecutive_failures = 0;
                self.idle_tick();
                continue;
            };

            match self.play_track(&entry) {
                TrackOutcome::Completed => {
                    consecutive_failures = 0;
                    self.finish_track(index);
                }
                TrackOutcome::Failed => {
                    consecutive_failures += 1;
                    self.finish_track(index);
                    if consecutive_failures >= playlist_len {
                        // Nothing in the playlist is playable; don't spin
                        warn!("No playable entries in playlist ({} failed)", consecutive_failures);
                        consecutive_failures = 0;
                        self.idle_tick();
                    }
                }
                TrackOutcome::Interrupted => {}
                TrackOutcome::Shutdown => break,
            }
        }

        self.control.set_now_playing(None);
        info!("Playback engine stopped");
    }

    /// Pick the entry to play, or `None` when idle.
    ///
    /// Clears any pending skip under the same lock: a skip that landed
    /// before this point already moved the index we are reading.
    fn select_track(&self) -> Option<(usize, PlaylistEntry, usize)> {
        let state = self.control.lock();
        self.control.take_interrupt();

        if !state.is_playing {
            return None;
        }
        let index = state.current_index?;
        let entry = state.playlist.get(index)?.clone();
        Some((index, entry, state.playlist.len()))
    }

    /// Advance past `index` once its track has ended.
    ///
    /// Skipped if a skip moved the index while the last chunk was playing.
    fn finish_track(&self, index: usize) {
        let mut state = self.control.lock();
        if self.control.take_interrupt() || state.current_index != Some(index) {
            return;
        }
        state.advance();
        if let Some(next) = state.current_entry() {
            debug!("Next up: {}", next.title);
        }
    }

    fn play_track(&self, entry: &PlaylistEntry) -> TrackOutcome {
        let track = match self.decoder.decode(entry.path()) {
            Ok(track) => track,
            Err(e) if e.is_track_error() => {
                warn!("Could not load '{}' ({}): {}. Skipping.", entry.title, entry.file_path, e);
                return TrackOutcome::Failed;
            }
            Err(e) => {
                error!("Unexpected error loading '{}': {}. Skipping.", entry.title, e);
                return TrackOutcome::Failed;
            }
        };

        info!(
            "Now playing: {} ({:.1}s, {}Hz, {} channel(s))",
            entry.title,
            track.duration().as_secs_f64(),
            track.format.frame_rate,
            track.format.channels
        );
        self.control.set_now_playing(Some(entry.title.clone()));
        self.publish(NowPlayingEvent::track(entry));

        let chunk_size = track.format.align_chunk_size(self.config.chunk_size_bytes);
        for data in split_chunks(&track.pcm, chunk_size) {
            if self.control.is_shutdown() {
                return TrackOutcome::Shutdown;
            }
            if self.control.reload_pending() {
                debug!("Reload pending, abandoning '{}'", entry.title);
                return TrackOutcome::Interrupted;
            }
            if self.control.take_interrupt() {
                debug!("Skip requested, abandoning '{}'", entry.title);
                return TrackOutcome::Interrupted;
            }

            let is_dj_live = {
                let state = self.control.lock();
                if !state.is_playing {
                    debug!("Paused, abandoning '{}'", entry.title);
                    return TrackOutcome::Interrupted;
                }
                state.is_dj_live
            };

            let mut chunk = AudioChunk::new(data, track.format);
            if is_dj_live {
                chunk = self.ducker.apply(&chunk);
            }

            self.hub.push(&chunk);
            thread::sleep(chunk.duration());
        }

        TrackOutcome::Completed
    }

    /// Fetch a fresh playlist and install it atomically.
    ///
    /// On failure the previous playlist stays in force.
    fn reload(&self) {
        match self.source.load_playlist() {
            Ok(mut playlist) => {
                playlist.sort_by_key(|entry| entry.order);
                let mut state = self.control.lock();
                state.install_playlist(playlist);
                info!(
                    "Playlist loaded: {} entries, current index {:?}",
                    state.playlist.len(),
                    state.current_index
                );
            }
            Err(e) => {
                error!("Failed to reload playlist, keeping previous one: {}", e);
            }
        }
    }

    /// One idle heartbeat: announce silence, then wait out the interval
    fn idle_tick(&self) {
        self.control.set_now_playing(None);
        self.publish(NowPlayingEvent::silence());

        let deadline = Instant::now() + self.config.idle_interval;
        loop {
            let now = Instant::now();
            if now >= deadline || self.control.is_shutdown() || self.control.reload_pending() {
                break;
            }
            thread::sleep((deadline - now).min(IDLE_POLL));
        }
    }

    fn publish(&self, event: NowPlayingEvent) {
        // No subscribers is fine
        let _ = self.now_playing.send(event);
    }
}
