//! In-memory collaborators for driving the playback engine in tests
//!
//! Tracks use a very high frame rate so a 1024-byte chunk paces out in about
//! a millisecond.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use radio_common::{NowPlayingEvent, PlaylistEntry};
use radio_core::audio::{AudioChunk, DecodedTrack, PcmFormat, TrackDecoder};
use radio_core::broadcast::{BroadcastHub, ListenerChannel};
use radio_core::playback::{EngineConfig, EngineControl, PlaybackEngine, PlaylistSource};
use radio_core::{Error, Result};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Mono s16 at 512 kHz: 1024 bytes last 1 ms
pub fn fast_format() -> PcmFormat {
    PcmFormat::s16(512_000, 1)
}

/// A track of `chunks` chunks whose every byte is `tag`
pub fn tagged_track(tag: u8, chunks: usize) -> DecodedTrack {
    DecodedTrack {
        pcm: Bytes::from(vec![tag; chunks * 1024]),
        format: fast_format(),
    }
}

pub fn entry(title: &str, order: i64) -> PlaylistEntry {
    PlaylistEntry::new(
        title,
        format!("src-{}", title),
        format!("/music/{}.mp3", title),
        order,
    )
}

/// Playlist source whose contents and failure mode tests can change
#[derive(Default)]
pub struct FakeSource {
    playlist: Mutex<Vec<PlaylistEntry>>,
    failing: AtomicBool,
    loads: AtomicUsize,
}

impl FakeSource {
    pub fn new(playlist: Vec<PlaylistEntry>) -> Arc<Self> {
        Arc::new(Self {
            playlist: Mutex::new(playlist),
            ..Default::default()
        })
    }

    pub fn set(&self, playlist: Vec<PlaylistEntry>) {
        *self.playlist.lock().unwrap() = playlist;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl PlaylistSource for FakeSource {
    fn load_playlist(&self) -> Result<Vec<PlaylistEntry>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Playlist("store unavailable".to_string()));
        }
        Ok(self.playlist.lock().unwrap().clone())
    }
}

/// Decoder serving prepared tracks by file path; unknown paths are missing files
#[derive(Default)]
pub struct FakeDecoder {
    tracks: HashMap<String, DecodedTrack>,
    unreadable: HashSet<String>,
    attempts: Arc<AtomicUsize>,
}

impl FakeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(mut self, entry: &PlaylistEntry, track: DecodedTrack) -> Self {
        self.tracks.insert(entry.file_path.clone(), track);
        self
    }

    /// Fail reads of `entry` with an I/O error instead of a missing file
    pub fn with_unreadable(mut self, entry: &PlaylistEntry) -> Self {
        self.unreadable.insert(entry.file_path.clone());
        self
    }

    /// Shared counter of decode calls, readable after the decoder moves into the engine
    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl TrackDecoder for FakeDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedTrack> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let key = path.to_string_lossy();
        if self.unreadable.contains(key.as_ref()) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        self.tracks
            .get(path.to_string_lossy().as_ref())
            .cloned()
            .ok_or_else(|| Error::FileNotFound(path.to_path_buf()))
    }
}

/// A running engine with one registered listener and one event subscriber
pub struct EngineHarness {
    pub control: EngineControl,
    pub hub: BroadcastHub,
    pub listener: ListenerChannel,
    pub events: broadcast::Receiver<NowPlayingEvent>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHarness {
    /// Start an engine; `setup` runs against the control before the thread starts
    pub fn start(
        source: Arc<FakeSource>,
        decoder: FakeDecoder,
        config: EngineConfig,
        setup: impl FnOnce(&EngineControl),
    ) -> Self {
        let control = EngineControl::new();
        setup(&control);

        let hub = BroadcastHub::new(512);
        let listener = hub.register();
        let (tx, events) = broadcast::channel(512);

        let engine = PlaybackEngine::new(
            control.clone(),
            hub.clone(),
            source,
            Arc::new(decoder),
            tx,
            config,
        );
        let thread = engine.spawn().expect("engine thread should start");

        Self {
            control,
            hub,
            listener,
            events,
            thread: Some(thread),
        }
    }

    /// Next event within `timeout`
    pub fn next_event(&mut self, timeout: Duration) -> Option<NowPlayingEvent> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            match self.events.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Lagged(_)) => {
                    thread::sleep(Duration::from_millis(1))
                }
                Err(TryRecvError::Closed) => return None,
            }
        }
        None
    }

    /// Next event naming a track, skipping silence heartbeats
    pub fn next_track_title(&mut self, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        while let Some(event) = self.next_event(deadline.saturating_duration_since(Instant::now())) {
            if let Some(title) = event.title {
                return Some(title);
            }
        }
        None
    }

    /// Every event received so far
    pub fn drain_events(&mut self) -> Vec<NowPlayingEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }

    /// Every chunk queued for the listener so far
    pub fn drain_chunks(&mut self) -> Vec<AudioChunk> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.listener.try_recv() {
            chunks.push(chunk);
        }
        chunks
    }

    /// Poll `condition` until it holds or `timeout` passes
    pub fn wait_until(&self, timeout: Duration, condition: impl Fn(&EngineControl) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition(&self.control) {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        condition(&self.control)
    }

    /// Shut the engine down and wait for its thread
    pub fn stop(&mut self) {
        self.control.shutdown();
        if let Some(thread) = self.thread.take() {
            thread.join().expect("engine thread panicked");
        }
    }
}

impl Drop for EngineHarness {
    fn drop(&mut self) {
        self.control.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
