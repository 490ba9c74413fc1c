//! Per-staff serialization of calendar writes
//!
//! The check-then-write sequence of a booking must not interleave with
//! another write on the same staff member's calendar. Each
//! `(tenant_id, staff_id)` gets an async mutex held across the whole
//! ledger transaction. Multi-staff operations lock in ascending id order.
//! An entry lives only while someone holds or waits on it.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type StaffKey = (i64, i64);
type LockMap = DashMap<StaffKey, Arc<Mutex<()>>>;

#[derive(Debug, Default)]
pub struct StaffLocks {
    locks: Arc<LockMap>,
}

/// Holds one or more staff locks until dropped
#[derive(Debug)]
pub struct StaffLockGuard {
    guards: Vec<OwnedMutexGuard<()>>,
    keys: Vec<StaffKey>,
    locks: Arc<LockMap>,
}

impl Drop for StaffLockGuard {
    fn drop(&mut self) {
        // release the mutexes first so their Arc clones are gone
        self.guards.clear();
        for key in &self.keys {
            // the map's own reference is the only one left when nobody waits
            self.locks
                .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}

impl StaffLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the calendars of `staff_ids` (deduplicated, ascending)
    pub async fn acquire(&self, tenant_id: i64, staff_ids: &[i64]) -> StaffLockGuard {
        let mut ids = staff_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        let mut keys = Vec::with_capacity(ids.len());
        for staff_id in ids {
            let key = (tenant_id, staff_id);
            // Clone the Arc out so the map shard is not held across the await
            let mutex = self
                .locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(mutex.lock_owned().await);
            keys.push(key);
        }

        StaffLockGuard {
            guards,
            keys,
            locks: self.locks.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
