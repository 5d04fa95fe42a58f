// ============================
// confmock-backend-lib/src/cache.rs
// ============================
//! Process-wide read-through cache for derived response payloads.
//!
//! Entries expire after the configured TTL and are dropped eagerly by
//! every update/delete on the entity they derive from, before the
//! write returns. Keys are per logical resource, never per route:
//! `meeting:{id}` is shared by every endpoint that renders meeting
//! detail.
use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::ApiError;

/// Cache key builders, one per cached logical resource.
pub mod keys {
    pub fn meeting(id: &str) -> String {
        format!("meeting:{id}")
    }

    pub fn meeting_summary(id: &str) -> String {
        format!("meeting_summary:{id}")
    }

    pub fn webinar(id: &str) -> String {
        format!("webinar:{id}")
    }

    pub fn chat_user_messages(user_id: &str) -> String {
        format!("chat_user_messages:{user_id}")
    }
}

struct CacheEntry {
    inserted_at: Instant,
    value: Value,
}

pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fetch a live entry; expired entries are dropped on access.
    pub fn get(&self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            },
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                inserted_at: Instant::now(),
                value,
            },
        );
    }

    /// Cache hit, or run `compute` and remember its result.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<Value, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        if let Some(value) = self.get(key) {
            tracing::debug!(key, "cache hit");
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_second_read_hits_cache() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let mut calls = 0;

        for _ in 0..2 {
            let value = cache
                .get_or_compute("meeting:m1", || {
                    calls += 1;
                    async { Ok(json!({"topic": "T"})) }
                })
                .await
                .unwrap();
            assert_eq!(value["topic"], "T");
        }
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.insert("k", json!(1));
        assert!(cache.get("k").is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_invalidate_and_prefix() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(keys::meeting("m1"), json!(1));
        cache.insert(keys::meeting_summary("m1"), json!(2));
        cache.insert(keys::webinar("w1"), json!(3));

        cache.invalidate(&keys::meeting("m1"));
        assert!(cache.get(&keys::meeting("m1")).is_none());
        assert!(cache.get(&keys::meeting_summary("m1")).is_some());

        cache.invalidate_prefix("meeting_summary:");
        assert!(cache.get(&keys::meeting_summary("m1")).is_none());
        assert!(cache.get(&keys::webinar("w1")).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_compute_error_is_not_cached() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_compute("k", || async { Err(ApiError::not_found("Meeting", "m1")) })
            .await;
        assert!(result.is_err());
        assert!(cache.get("k").is_none());
    }
}
