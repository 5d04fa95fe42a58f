// ============================
// confmock-backend-lib/src/storage.rs
// ============================
//! Storage abstraction with flat-file implementation.
//!
//! One JSON document per entity under `<data_dir>/<kind>/<id>.json`,
//! plus a handful of singleton documents (`rooms.json`, ...). A
//! process-wide memory overlay sits in front of the files so that
//! writes (and stashed mock entities) are immediately visible to
//! subsequent reads. Deletes are hard: the document is removed from
//! both the overlay and the file store.
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::fs as tokio_fs;

use crate::error::ApiError;

/// Entity types stored one-file-per-ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Meeting,
    Webinar,
}

impl EntityKind {
    pub fn dir(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Meeting => "meetings",
            EntityKind::Webinar => "webinars",
        }
    }

    /// Human label used in error envelopes.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Meeting => "Meeting",
            EntityKind::Webinar => "Webinar",
        }
    }
}

/// Single-document stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingletonKey {
    Accounts,
    Rooms,
    TrackingFields,
    ChatChannels,
    ChatMessages,
}

impl SingletonKey {
    pub fn file_name(self) -> &'static str {
        match self {
            SingletonKey::Accounts => "accounts.json",
            SingletonKey::Rooms => "rooms.json",
            SingletonKey::TrackingFields => "tracking_fields.json",
            SingletonKey::ChatChannels => "chat_channels.json",
            SingletonKey::ChatMessages => "chat_messages.json",
        }
    }

    /// Value used when the backing file is absent or unparseable.
    pub fn empty_value(self) -> Value {
        match self {
            SingletonKey::Accounts | SingletonKey::Rooms | SingletonKey::TrackingFields => {
                Value::Array(Vec::new())
            },
            SingletonKey::ChatChannels | SingletonKey::ChatMessages => {
                Value::Object(serde_json::Map::new())
            },
        }
    }
}

/// Trait for storage backends
#[async_trait]
pub trait Store: Send + Sync {
    /// Enumerate all known IDs for an entity type, sorted ascending.
    async fn list_ids(&self, kind: EntityKind) -> Result<Vec<String>, ApiError>;

    /// Read a document. `None` when absent or unparseable.
    async fn load(&self, kind: EntityKind, id: &str) -> Result<Option<Value>, ApiError>;

    /// Overwrite a document, creating parent storage if needed. The
    /// `id` (and for meetings/webinars, `uuid`) fields are normalized
    /// to match the key before persisting.
    async fn save(&self, kind: EntityKind, id: &str, doc: Value) -> Result<(), ApiError>;

    /// Keep a document only in the memory overlay. Used for
    /// synthesized mock entities, which must not land on disk.
    fn stash(&self, kind: EntityKind, id: &str, doc: Value);

    /// Hard-delete a document from overlay and file store. Idempotent.
    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ApiError>;

    /// Read a singleton document, falling back to its empty value.
    async fn load_singleton(&self, key: SingletonKey) -> Result<Value, ApiError>;

    /// Overwrite a singleton document.
    async fn save_singleton(&self, key: SingletonKey, doc: Value) -> Result<(), ApiError>;
}

fn normalize_ids(kind: EntityKind, id: &str, doc: &mut Value) {
    if let Value::Object(map) = doc {
        map.insert("id".to_string(), Value::String(id.to_string()));
        if matches!(kind, EntityKind::Meeting | EntityKind::Webinar) {
            let uuid_missing = map
                .get("uuid")
                .and_then(Value::as_str)
                .map_or(true, str::is_empty);
            if uuid_missing {
                map.insert("uuid".to_string(), Value::String(id.to_string()));
            }
        }
    }
}

/// Flat-file implementation of the [`Store`] trait.
pub struct FlatFileStore {
    root: PathBuf,
    overlay: DashMap<(EntityKind, String), Value>,
    singletons: DashMap<SingletonKey, Value>,
}

impl FlatFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        for kind in [EntityKind::User, EntityKind::Meeting, EntityKind::Webinar] {
            fs::create_dir_all(root.join(kind.dir()))?;
        }
        Ok(Self {
            root,
            overlay: DashMap::new(),
            singletons: DashMap::new(),
        })
    }

    fn entity_path(&self, kind: EntityKind, id: &str) -> PathBuf {
        self.root.join(kind.dir()).join(format!("{id}.json"))
    }

    fn singleton_path(&self, key: SingletonKey) -> PathBuf {
        self.root.join(key.file_name())
    }
}

#[async_trait]
impl Store for FlatFileStore {
    async fn list_ids(&self, kind: EntityKind) -> Result<Vec<String>, ApiError> {
        let mut ids: Vec<String> = Vec::new();
        let dir = self.root.join(kind.dir());
        if dir.is_dir() {
            let mut entries = tokio_fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if let Some(stem) = name.strip_suffix(".json") {
                    ids.push(stem.to_string());
                }
            }
        }
        for entry in self.overlay.iter() {
            if entry.key().0 == kind {
                ids.push(entry.key().1.clone());
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn load(&self, kind: EntityKind, id: &str) -> Result<Option<Value>, ApiError> {
        if let Some(doc) = self.overlay.get(&(kind, id.to_string())) {
            return Ok(Some(doc.clone()));
        }
        let path = self.entity_path(kind, id);
        if !path.is_file() {
            return Ok(None);
        }
        let content = tokio_fs::read_to_string(&path).await?;
        // malformed documents read as absent, never as a fatal error
        Ok(serde_json::from_str(&content).ok())
    }

    async fn save(&self, kind: EntityKind, id: &str, mut doc: Value) -> Result<(), ApiError> {
        normalize_ids(kind, id, &mut doc);
        let path = self.entity_path(kind, id);
        if let Some(parent) = path.parent() {
            tokio_fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&doc)?;
        tokio_fs::write(&path, json).await?;
        self.overlay.insert((kind, id.to_string()), doc);
        Ok(())
    }

    fn stash(&self, kind: EntityKind, id: &str, mut doc: Value) {
        normalize_ids(kind, id, &mut doc);
        self.overlay.insert((kind, id.to_string()), doc);
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ApiError> {
        self.overlay.remove(&(kind, id.to_string()));
        let path = self.entity_path(kind, id);
        match tokio_fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn load_singleton(&self, key: SingletonKey) -> Result<Value, ApiError> {
        if let Some(doc) = self.singletons.get(&key) {
            return Ok(doc.clone());
        }
        let path = self.singleton_path(key);
        let doc = if path.is_file() {
            let content = tokio_fs::read_to_string(&path).await?;
            serde_json::from_str(&content).unwrap_or_else(|_| key.empty_value())
        } else {
            key.empty_value()
        };
        self.singletons.insert(key, doc.clone());
        Ok(doc)
    }

    async fn save_singleton(&self, key: SingletonKey, doc: Value) -> Result<(), ApiError> {
        let path = self.singleton_path(key);
        if let Some(parent) = path.parent() {
            tokio_fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&doc)?;
        tokio_fs::write(&path, json).await?;
        self.singletons.insert(key, doc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_round_trip_normalizes_id() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::new(dir.path()).unwrap();

        let doc = json!({"id": "wrong", "first_name": "A", "last_name": "B"});
        store.save(EntityKind::User, "u1", doc).await.unwrap();

        let loaded = store.load(EntityKind::User, "u1").await.unwrap().unwrap();
        assert_eq!(loaded["id"], "u1");
        assert_eq!(loaded["first_name"], "A");
    }

    #[tokio::test]
    async fn test_meeting_save_fills_uuid() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::new(dir.path()).unwrap();

        store
            .save(EntityKind::Meeting, "m1", json!({"topic": "T"}))
            .await
            .unwrap();
        let loaded = store.load(EntityKind::Meeting, "m1").await.unwrap().unwrap();
        assert_eq!(loaded["uuid"], "m1");

        // an explicit uuid is preserved
        store
            .save(EntityKind::Meeting, "m2", json!({"uuid": "custom-uuid"}))
            .await
            .unwrap();
        let loaded = store.load(EntityKind::Meeting, "m2").await.unwrap().unwrap();
        assert_eq!(loaded["uuid"], "custom-uuid");
    }

    #[tokio::test]
    async fn test_missing_and_malformed_read_as_absent() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::new(dir.path()).unwrap();

        assert!(store.load(EntityKind::User, "nope").await.unwrap().is_none());

        std::fs::write(dir.path().join("users/broken.json"), "{not json").unwrap();
        assert!(store.load(EntityKind::User, "broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_ids_merges_files_and_overlay() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::new(dir.path()).unwrap();

        store.save(EntityKind::User, "b", json!({})).await.unwrap();
        store.stash(EntityKind::User, "a", json!({}));
        store.stash(EntityKind::User, "b", json!({}));

        assert_eq!(store.list_ids(EntityKind::User).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_stash_does_not_touch_disk() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::new(dir.path()).unwrap();

        store.stash(EntityKind::Meeting, "m1", json!({"topic": "T"}));
        assert!(!dir.path().join("meetings/m1.json").exists());
        assert!(store.load(EntityKind::Meeting, "m1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hard_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::new(dir.path()).unwrap();

        store.save(EntityKind::Meeting, "m1", json!({})).await.unwrap();
        store.delete(EntityKind::Meeting, "m1").await.unwrap();
        assert!(store.load(EntityKind::Meeting, "m1").await.unwrap().is_none());
        assert!(!dir.path().join("meetings/m1.json").exists());

        // deleting again is not an error
        store.delete(EntityKind::Meeting, "m1").await.unwrap();
    }

    #[tokio::test]
    async fn test_singleton_defaults_and_round_trip() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::new(dir.path()).unwrap();

        let rooms = store.load_singleton(SingletonKey::Rooms).await.unwrap();
        assert_eq!(rooms, json!([]));
        let channels = store.load_singleton(SingletonKey::ChatChannels).await.unwrap();
        assert_eq!(channels, json!({}));

        store
            .save_singleton(SingletonKey::Rooms, json!([{"id": "r1"}]))
            .await
            .unwrap();
        let rooms = store.load_singleton(SingletonKey::Rooms).await.unwrap();
        assert_eq!(rooms[0]["id"], "r1");
    }
}
