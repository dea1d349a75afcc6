use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-event critical sections for score mutation plus rank rewrite.
///
/// Events never contend with each other. The registry is shared between clones of
/// the database handle so every caller in the process sees the same locks.
#[derive(Clone, Default)]
pub struct EventLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds the lock of `event_id`.
    pub async fn acquire(&self, event_id: Uuid) -> EventGuard {
        let lock = self
            .locks
            .entry(event_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        EventGuard { event_id, _guard: guard }
    }

    /// Drops the lock of a deleted event once nobody is waiting on it.
    pub fn forget(&self, event_id: Uuid) {
        self.locks
            .remove_if(&event_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Proof that the caller holds the lock of one event.
pub struct EventGuard {
    event_id: Uuid,
    _guard: OwnedMutexGuard<()>,
}

impl EventGuard {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }
}
