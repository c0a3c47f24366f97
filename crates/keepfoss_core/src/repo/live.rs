//! Live note-set subscriptions.
//!
//! # Responsibility
//! - Fan out full, ordered note snapshots to any number of subscribers.
//! - Prune subscribers whose receiving side was dropped.
//!
//! # Invariants
//! - A new subscription holds the current snapshot before any later one.
//! - Each subscriber buffers at most one snapshot: a publish replaces an
//!   unread one, so slow readers skip straight to the newest set.
//! - Snapshots are whole values; a subscriber never sees a partial set.

use crate::model::note::Note;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Immutable, shareable view of the full note set.
pub type NoteSnapshot = Arc<Vec<Note>>;

#[derive(Debug, Default)]
struct SlotState {
    pending: Option<NoteSnapshot>,
    closed: bool,
}

/// Single-snapshot mailbox shared by the hub and one subscription.
#[derive(Debug, Default)]
struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn offer(&self, snapshot: NoteSnapshot) {
        self.lock().pending = Some(snapshot);
        self.ready.notify_all();
    }

    fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }
}

/// Publish/subscribe hub for note snapshots.
#[derive(Debug, Default)]
pub struct LiveQuery {
    subscribers: Mutex<Vec<Arc<Slot>>>,
}

impl LiveQuery {
    /// Creates a hub without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and seeds it with `current`.
    ///
    /// Callers must hold whatever lock serializes writes so no publish can
    /// slip between reading `current` and registering.
    pub fn subscribe(&self, current: Vec<Note>) -> NoteSubscription {
        let slot = Arc::new(Slot::default());
        slot.offer(Arc::new(current));
        self.lock().push(Arc::clone(&slot));
        NoteSubscription { slot }
    }

    /// Delivers `snapshot` to every live subscriber.
    pub fn publish(&self, snapshot: Vec<Note>) {
        let snapshot = Arc::new(snapshot);
        let mut subscribers = self.lock();
        // The hub's own handle is the last one once a subscription is dropped.
        subscribers.retain(|slot| Arc::strong_count(slot) > 1);
        for slot in subscribers.iter() {
            slot.offer(Arc::clone(&snapshot));
        }
    }

    /// Returns how many subscribers are still registered.
    ///
    /// Dropped subscribers are only pruned on the next publish.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Slot>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        for slot in self.lock().iter() {
            slot.close();
        }
    }
}

/// Receiving side of a live note query.
///
/// All read methods return `None` once the store has been dropped and the
/// buffered snapshot was consumed.
#[derive(Debug)]
pub struct NoteSubscription {
    slot: Arc<Slot>,
}

impl NoteSubscription {
    /// Blocks until a snapshot is available.
    pub fn recv(&self) -> Option<NoteSnapshot> {
        let mut state = self.slot.lock();
        loop {
            if let Some(snapshot) = state.pending.take() {
                return Some(snapshot);
            }
            if state.closed {
                return None;
            }
            state = self
                .slot
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks for at most `timeout` waiting for a snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<NoteSnapshot> {
        let deadline = Instant::now() + timeout;
        let mut state = self.slot.lock();
        loop {
            if let Some(snapshot) = state.pending.take() {
                return Some(snapshot);
            }
            let now = Instant::now();
            if state.closed || now >= deadline {
                return None;
            }
            state = self
                .slot
                .ready
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Returns the buffered snapshot without blocking.
    pub fn try_recv(&self) -> Option<NoteSnapshot> {
        self.slot.lock().pending.take()
    }

    /// Returns the newest unread snapshot, if any.
    pub fn latest(&self) -> Option<NoteSnapshot> {
        self.try_recv()
    }
}
