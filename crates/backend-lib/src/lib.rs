// ============================
// confmock-backend-lib/src/lib.rs
// ============================
//! Mock conferencing-vendor REST backend.
//!
//! Serves a Zoom-shaped API surface from flat-file JSON fixtures:
//! per-entity documents for users, meetings and webinars, singleton
//! documents for rooms, chat and tracking fields, and synthesized
//! mock data everywhere a fixture is absent and the store policy
//! allows it.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod mock;
pub mod pagination;
pub mod router;
pub mod storage;
pub mod views;

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::config::{MissingPolicy, Settings};
use crate::error::ApiError;
use crate::locks::LockMap;
use crate::storage::{EntityKind, FlatFileStore, Store};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cache: ResponseCache,
    pub locks: LockMap,
    pub settings: Arc<Settings>,
    /// QoS feedback submissions, keyed by feedback ID. Volatile.
    pub feedback: DashMap<String, Value>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: Settings) -> SharedState {
        let cache = ResponseCache::new(Duration::from_secs(settings.cache_ttl_secs));
        Arc::new(Self {
            store,
            cache,
            locks: LockMap::new(),
            settings: Arc::new(settings),
            feedback: DashMap::new(),
        })
    }

    /// State backed by a [`FlatFileStore`] rooted at `settings.data_dir`.
    pub fn from_settings(settings: Settings) -> anyhow::Result<SharedState> {
        let store = FlatFileStore::new(&settings.data_dir)?;
        Ok(Self::new(Arc::new(store), settings))
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Load a user, synthesizing one under the `synthesize` policy.
    /// Synthesized users live only in the memory overlay.
    pub async fn load_user(&self, id: &str) -> Result<Option<Value>, ApiError> {
        if let Some(doc) = self.store.load(EntityKind::User, id).await? {
            return Ok(Some(doc));
        }
        Ok(self.synthesize(EntityKind::User, id))
    }

    pub async fn load_meeting(&self, id: &str) -> Result<Option<Value>, ApiError> {
        if let Some(doc) = self.store.load(EntityKind::Meeting, id).await? {
            return Ok(Some(doc));
        }
        Ok(self.synthesize(EntityKind::Meeting, id))
    }

    pub async fn load_webinar(&self, id: &str) -> Result<Option<Value>, ApiError> {
        if let Some(doc) = self.store.load(EntityKind::Webinar, id).await? {
            return Ok(Some(doc));
        }
        Ok(self.synthesize(EntityKind::Webinar, id))
    }

    fn synthesize(&self, kind: EntityKind, id: &str) -> Option<Value> {
        if self.settings.on_missing != MissingPolicy::Synthesize {
            return None;
        }
        tracing::debug!(kind = kind.label(), id, "synthesizing mock entity");
        let doc = match kind {
            EntityKind::User => mock::mock_user(id, self.base_url()),
            EntityKind::Meeting => mock::mock_meeting(id, None, self.base_url()),
            EntityKind::Webinar => mock::mock_webinar(id, None, self.base_url()),
        };
        self.store.stash(kind, id, doc.clone());
        Some(doc)
    }

    pub async fn require_user(&self, id: &str) -> Result<Value, ApiError> {
        self.load_user(id)
            .await?
            .ok_or_else(|| ApiError::not_found(EntityKind::User.label(), id))
    }

    pub async fn require_meeting(&self, id: &str) -> Result<Value, ApiError> {
        self.load_meeting(id)
            .await?
            .ok_or_else(|| ApiError::not_found(EntityKind::Meeting.label(), id))
    }

    pub async fn require_webinar(&self, id: &str) -> Result<Value, ApiError> {
        self.load_webinar(id)
            .await?
            .ok_or_else(|| ApiError::not_found(EntityKind::Webinar.label(), id))
    }

    pub async fn require_entity(&self, kind: EntityKind, id: &str) -> Result<Value, ApiError> {
        match kind {
            EntityKind::User => self.require_user(id).await,
            EntityKind::Meeting => self.require_meeting(id).await,
            EntityKind::Webinar => self.require_webinar(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn state_with_policy(policy: MissingPolicy) -> (tempfile::TempDir, SharedState) {
        let dir = tempdir().unwrap();
        let settings = Settings {
            data_dir: dir.path().to_path_buf(),
            on_missing: policy,
            ..Settings::default()
        };
        let state = AppState::from_settings(settings).unwrap();
        (dir, state)
    }

    #[tokio::test]
    async fn test_error_policy_reports_missing() {
        let (_dir, state) = state_with_policy(MissingPolicy::Error);
        assert!(state.load_user("ghost").await.unwrap().is_none());
        assert!(matches!(
            state.require_meeting("ghost").await,
            Err(ApiError::NotFound("Meeting", _))
        ));
    }

    #[tokio::test]
    async fn test_synthesize_policy_stashes_in_memory_only() {
        let (dir, state) = state_with_policy(MissingPolicy::Synthesize);

        let user = state.require_user("u9").await.unwrap();
        assert_eq!(user["id"], "u9");
        assert!(!dir.path().join("users/u9.json").exists());

        // the stash makes repeat reads stable
        let again = state.require_user("u9").await.unwrap();
        assert_eq!(again["email"], user["email"]);
    }
}
