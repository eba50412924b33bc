//! Per-key exclusive leases.
//!
//! Multi-step updates (read metadata, merge, write back) are not atomic on
//! their own. [`KeyLocks`] hands out an exclusive [`Lease`] per key so a
//! caller can hold a critical section across such a sequence; see
//! [`StorageExt::exclusively`](crate::StorageExt::exclusively).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::Key;

type Slots = Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>;

/// A registry of per-key exclusive leases.
///
/// Each key maps to one async mutex; the map entry is created on first
/// acquisition and removed again when the last interested holder drops its
/// lease, so the registry never accumulates an entry per ever-seen key.
///
/// Waiters for the same key queue in arrival order (tokio mutexes are
/// fair). Distinct keys are fully independent.
#[derive(Debug, Default)]
pub struct KeyLocks {
    slots: Arc<Slots>,
}

impl KeyLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive lease for `key`, waiting behind any current
    /// holder and earlier waiters.
    pub async fn acquire(&self, key: Key) -> Lease {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        // The slot Arc is cloned under the registry lock above, so a
        // releasing holder can never observe this waiter as removable.
        let guard = slot.lock_owned().await;
        Lease {
            key,
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }
}

/// An ephemeral, key-scoped ownership token.
///
/// Held for the duration of a critical section and released on drop, which
/// covers success, failure, and cancellation of the holding future alike.
#[derive(Debug)]
pub struct Lease {
    key: Key,
    slots: Arc<Slots>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        // Release while the registry is locked: anyone racing to acquire
        // must either already hold a slot clone (strong count > 1) or wait
        // for the registry lock and find the entry gone.
        drop(self.guard.take());
        if let Some(slot) = slots.get(&self.key) {
            if Arc::strong_count(slot) == 1 {
                slots.remove(&self.key);
            }
        }
    }
}
