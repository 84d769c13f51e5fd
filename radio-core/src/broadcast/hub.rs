//! Broadcast hub
//!
//! One producer (the playback engine), any number of listeners. Each
//! listener gets its own bounded queue; `push` does a non-blocking
//! `try_send` into every queue and a full queue simply misses the chunk.
//! A slow listener therefore never stalls the engine or other listeners.
//!
//! The registry lock is held only to add/remove a sender or to snapshot the
//! senders for delivery. Unregistering closes the listener's receiver before
//! removing it, so a push working from an older snapshot gets `Closed` back
//! and delivers nothing to the removed listener.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::audio::types::AudioChunk;

/// Chunks buffered per listener before drops start
pub const DEFAULT_LISTENER_CAPACITY: usize = 20;

/// Drops per listener between summary log lines
const DROP_LOG_INTERVAL: u64 = 1000;

/// Identifies one registered listener
pub type ListenerId = Uuid;

struct ListenerSlot {
    tx: mpsc::Sender<AudioChunk>,
    dropped: Arc<AtomicU64>,
}

struct Registry {
    listeners: Mutex<HashMap<ListenerId, ListenerSlot>>,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<ListenerId, ListenerSlot>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: &ListenerId) -> bool {
        let mut listeners = self.lock();
        let removed = listeners.remove(id).is_some();
        if removed {
            info!("Listener {} unregistered. Total listeners: {}", id, listeners.len());
        }
        removed
    }
}

/// Cumulative delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub listeners: usize,
    pub delivered: u64,
    pub dropped: u64,
}

/// Registry of listener channels; cheap to clone
#[derive(Clone)]
pub struct BroadcastHub {
    registry: Arc<Registry>,
    capacity: usize,
}

impl BroadcastHub {
    /// Create a hub whose listener channels hold `capacity` chunks
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!("Broadcast hub initialized with listener capacity {}", capacity);
        Self {
            registry: Arc::new(Registry {
                listeners: Mutex::new(HashMap::new()),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
            capacity,
        }
    }

    /// Register a new listener.
    ///
    /// The returned channel unregisters itself when dropped.
    pub fn register(&self) -> ListenerChannel {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();
        let dropped = Arc::new(AtomicU64::new(0));

        let mut listeners = self.registry.lock();
        listeners.insert(
            id,
            ListenerSlot {
                tx,
                dropped: Arc::clone(&dropped),
            },
        );
        info!("Listener {} registered. Total listeners: {}", id, listeners.len());

        ListenerChannel {
            id,
            rx,
            dropped,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Stop delivering to `channel`.
    ///
    /// Idempotent. Chunks already queued can still be drained.
    pub fn unregister(&self, channel: &mut ListenerChannel) {
        channel.rx.close();
        self.registry.remove(&channel.id);
    }

    /// Offer `chunk` to every registered listener without blocking.
    ///
    /// Full listeners miss the chunk; closed ones are pruned. Returns the
    /// number of listeners that accepted it.
    pub fn push(&self, chunk: &AudioChunk) -> usize {
        let snapshot: Vec<(ListenerId, mpsc::Sender<AudioChunk>, Arc<AtomicU64>)> = {
            let listeners = self.registry.lock();
            listeners
                .iter()
                .map(|(id, slot)| (*id, slot.tx.clone(), Arc::clone(&slot.dropped)))
                .collect()
        };

        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, tx, dropped) in snapshot {
            match tx.try_send(chunk.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    // Lagging listener misses this chunk
                    let n = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    self.registry.dropped.fetch_add(1, Ordering::Relaxed);
                    if n == 1 {
                        debug!("Listener {} is lagging, dropping chunks", id);
                    } else if n % DROP_LOG_INTERVAL == 0 {
                        debug!("Listener {} has missed {} chunks", id, n);
                    }
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        for id in &closed {
            trace!("Pruning closed listener {}", id);
            self.registry.remove(id);
        }

        self.registry
            .delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            listeners: self.listener_count(),
            delivered: self.registry.delivered.load(Ordering::Relaxed),
            dropped: self.registry.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_LISTENER_CAPACITY)
    }
}

/// A listener's end of the hub: a bounded FIFO of chunks.
///
/// Owned by the stream handler. Dropping it unregisters the listener.
pub struct ListenerChannel {
    id: ListenerId,
    rx: mpsc::Receiver<AudioChunk>,
    dropped: Arc<AtomicU64>,
    registry: Weak<Registry>,
}

impl ListenerChannel {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next chunk; `None` once unregistered and drained
    pub async fn recv(&mut self) -> Option<AudioChunk> {
        self.rx.recv().await
    }

    /// Next chunk if one is queued
    pub fn try_recv(&mut self) -> Option<AudioChunk> {
        self.rx.try_recv().ok()
    }

    /// Blocking receive for non-async consumers
    pub fn blocking_recv(&mut self) -> Option<AudioChunk> {
        self.rx.blocking_recv()
    }

    /// Chunks this listener missed because its queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for ListenerChannel {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for ListenerChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerChannel")
            .field("id", &self.id)
            .field("dropped", &self.dropped())
            .finish()
    }
}
