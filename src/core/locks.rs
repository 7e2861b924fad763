//! Per-owner write serialization.
//!
//! Two concurrent allocation runs for the same owner must not interleave
//! their bucket-balance reads and writes: the second run has to observe the
//! first run's commit. [`OwnerLocks`] hands out one async mutex per owner id;
//! every write operation (deposit, redistribution, withdrawal, transfer,
//! reorder) holds the owner's guard for its full duration. Guards release on
//! drop, so every exit path - success, validation error, transaction abort -
//! releases the owner.
//!
//! Different owners never contend. Read paths take no lock.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-owner mutexes. Cheap to clone; clones share the registry.
///
/// The map grows by one small entry per distinct owner seen and is never
/// pruned; entries are a single mutex each.
#[derive(Debug, Clone, Default)]
pub struct OwnerLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl OwnerLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the write lock for one owner, waiting if another operation
    /// for the same owner is in flight.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(user_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
