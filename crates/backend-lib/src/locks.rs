// ============================
// confmock-backend-lib/src/locks.rs
// ============================
//! Per-entity write locks.
//!
//! The store gives no transactional isolation, so every
//! load-modify-save sequence must hold the entity's lock for the full
//! sequence; otherwise two near-simultaneous updates to the same
//! document can silently drop one of them.
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::{EntityKind, SingletonKey};

#[derive(Default)]
pub struct LockMap {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: String) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock guarding one entity document.
    pub fn entity(&self, kind: EntityKind, id: &str) -> Arc<Mutex<()>> {
        self.get(format!("{}:{id}", kind.dir()))
    }

    /// Lock guarding one singleton document.
    pub fn singleton(&self, key: SingletonKey) -> Arc<Mutex<()>> {
        self.get(key.file_name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_id_shares_a_lock() {
        let locks = LockMap::new();
        let a = locks.entity(EntityKind::User, "u1");
        let b = locks.entity(EntityKind::User, "u1");
        assert!(Arc::ptr_eq(&a, &b));

        let other = locks.entity(EntityKind::User, "u2");
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn test_concurrent_increments_do_not_lose_writes() {
        let locks = Arc::new(LockMap::new());
        let counter = Arc::new(Mutex::new(0u32));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let lock = locks.entity(EntityKind::User, "u1");
                let _guard = lock.lock().await;
                // read-modify-write under the entity lock
                let current = *counter.lock().await;
                tokio::task::yield_now().await;
                *counter.lock().await = current + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*counter.lock().await, 16);
    }
}
