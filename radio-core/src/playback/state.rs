//! Shared playback state and the engine's control surface
//!
//! `PlaybackState` lives behind one mutex shared by the engine loop and the
//! web layer. The lock is only held while reading or writing fields, never
//! across a decode or a sleep. Reload-pending, track-interrupt and shutdown
//! are separate atomics so the per-chunk checks do not take the lock for
//! them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use radio_common::PlaylistEntry;
use serde::Serialize;
use tracing::info;

/// Playlist and position, owned by the playback engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub playlist: Vec<PlaylistEntry>,
    /// `None` only when the playlist is empty
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub is_dj_live: bool,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            playlist: Vec::new(),
            current_index: None,
            is_playing: true,
            is_dj_live: false,
        }
    }

    /// Replace the playlist, keeping `current_index` valid.
    ///
    /// The index is kept if it still points into the new playlist, reset to
    /// 0 if the playlist shrank past it (or was empty before), and cleared
    /// if the new playlist is empty.
    pub fn install_playlist(&mut self, playlist: Vec<PlaylistEntry>) {
        self.current_index = match (self.current_index, playlist.len()) {
            (_, 0) => None,
            (Some(i), len) if i < len => Some(i),
            _ => Some(0),
        };
        self.playlist = playlist;
    }

    /// Entry at `current_index`
    pub fn current_entry(&self) -> Option<&PlaylistEntry> {
        self.current_index.and_then(|i| self.playlist.get(i))
    }

    /// Step `current_index` forward, wrapping around
    pub fn advance(&mut self) {
        self.step(1);
    }

    /// Step `current_index` backward, wrapping around
    pub fn retreat(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, delta: isize) {
        let len = self.playlist.len();
        if len == 0 {
            self.current_index = None;
            return;
        }
        let current = self.current_index.unwrap_or(0) as isize;
        self.current_index = Some((current + delta).rem_euclid(len as isize) as usize);
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the engine for the web layer
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub playlist: Vec<PlaylistEntry>,
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub is_dj_live: bool,
    /// Title of the entry currently streaming, if any
    pub now_playing: Option<String>,
    pub reload_pending: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<PlaybackState>,
    now_playing: Mutex<Option<String>>,
    reload_requested: AtomicBool,
    interrupt_requested: AtomicBool,
    shutdown_requested: AtomicBool,
}

/// Cloneable handle to the engine's state.
///
/// Every method is non-blocking apart from the brief state lock.
#[derive(Debug, Clone)]
pub struct EngineControl {
    shared: Arc<Shared>,
}

impl EngineControl {
    pub fn new() -> Self {
        Self::with_state(PlaybackState::new())
    }

    pub fn with_state(state: PlaybackState) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                now_playing: Mutex::new(None),
                reload_requested: AtomicBool::new(false),
                interrupt_requested: AtomicBool::new(false),
                shutdown_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Lock the playback state.
    ///
    /// Keep the guard short-lived: the engine takes this lock on every chunk.
    pub fn lock(&self) -> MutexGuard<'_, PlaybackState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask the engine to refetch the playlist before continuing.
    ///
    /// Requests made before the engine notices coalesce into one reload.
    pub fn request_reload(&self) {
        if !self.shared.reload_requested.swap(true, Ordering::AcqRel) {
            info!("Playlist reload requested");
        }
    }

    pub fn reload_pending(&self) -> bool {
        self.shared.reload_requested.load(Ordering::Acquire)
    }

    /// Consume a pending reload request
    pub(crate) fn take_reload_request(&self) -> bool {
        self.shared.reload_requested.swap(false, Ordering::AcqRel)
    }

    /// Toggle ducking; applies from the next chunk
    pub fn set_live(&self, active: bool) {
        let mut state = self.lock();
        if state.is_dj_live != active {
            info!("DJ live status changed to: {}", active);
        }
        state.is_dj_live = active;
    }

    /// Resume or pause playback.
    ///
    /// Pausing abandons the current track; resuming restarts it from the
    /// beginning.
    pub fn set_playing(&self, playing: bool) {
        let mut state = self.lock();
        if state.is_playing != playing {
            info!("Playback state changed to: {}", if playing { "playing" } else { "paused" });
        }
        state.is_playing = playing;
    }

    /// Skip to the next entry, abandoning the current track
    pub fn skip_next(&self) {
        let mut state = self.lock();
        state.advance();
        self.interrupt_track();
    }

    /// Go back to the previous entry, abandoning the current track
    pub fn skip_previous(&self) {
        let mut state = self.lock();
        state.retreat();
        self.interrupt_track();
    }

    // Set while the state lock is held so the engine sees index and flag together
    fn interrupt_track(&self) {
        self.shared.interrupt_requested.store(true, Ordering::Release);
    }

    /// Consume a pending track interrupt
    pub(crate) fn take_interrupt(&self) -> bool {
        self.shared.interrupt_requested.swap(false, Ordering::AcqRel)
    }

    /// Make `run()` return at the next chunk boundary or idle tick
    pub fn shutdown(&self) {
        info!("Playback engine shutdown requested");
        self.shared.shutdown_requested.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown_requested.load(Ordering::Acquire)
    }

    pub(crate) fn set_now_playing(&self, title: Option<String>) {
        *self
            .shared
            .now_playing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = title;
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let now_playing = self
            .shared
            .now_playing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let state = self.lock();
        PlaybackSnapshot {
            playlist: state.playlist.clone(),
            current_index: state.current_index,
            is_playing: state.is_playing,
            is_dj_live: state.is_dj_live,
            now_playing,
            reload_pending: self.reload_pending(),
        }
    }
}

impl Default for EngineControl {
    fn default() -> Self {
        Self::new()
    }
}
