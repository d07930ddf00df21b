//! # Advisory Locks
//!
//! In-process advisory locks keyed by string, covering the two races the
//! database cannot see inside a single transaction:
//!
//! - `property:<id>`: held across check-in room assignment, so two
//!   concurrent check-ins cannot both claim the last available room.
//! - `item:<id>`: held across stock-movement appends, so concurrent
//!   movements on one item serialize and the non-negativity check is
//!   race-free.
//!
//! Multi-item operations (order confirmation, stock-take finalize) take
//! their item locks in sorted key order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// A registry of named async mutexes. Lock entries are created on first
/// use and kept for the lifetime of the registry; the key space (property
/// and item ids) is small and bounded.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquires the named lock, waiting if another task holds it.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        self.entry(key).lock_owned().await
    }

    /// Acquires the per-property lock.
    pub async fn property(&self, property_id: &str) -> OwnedMutexGuard<()> {
        self.acquire(&format!("property:{property_id}")).await
    }

    /// Acquires the per-item lock.
    pub async fn item(&self, item_id: &str) -> OwnedMutexGuard<()> {
        self.acquire(&format!("item:{item_id}")).await
    }

    /// Acquires several item locks in sorted order (deadlock-free for
    /// concurrent multi-item operations).
    pub async fn items_sorted(&self, item_ids: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut ids: Vec<&String> = item_ids.iter().collect();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.item(id).await);
        }
        guards
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[tokio::test]
    async fn test_same_key_serializes() {
        let registry = Arc::new(LockRegistry::new());
        let counter = Arc::new(AtomicI64::new(0));
        let peak = Arc::new(AtomicI64::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let counter = counter.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = registry.item("item-1").await;
                let inside = counter.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(inside, Ordering::SeqCst);
                tokio::task::yield_now().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let registry = LockRegistry::new();
        let _a = registry.property("p-1").await;
        // a different key must be immediately acquirable
        let _b = registry.property("p-2").await;
    }

    #[tokio::test]
    async fn test_items_sorted_dedups() {
        let registry = LockRegistry::new();
        let guards = registry
            .items_sorted(&[
                "b".to_string(),
                "a".to_string(),
                "b".to_string(),
            ])
            .await;
        assert_eq!(guards.len(), 2);
    }
}
