//! Key/value storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::error::StoreError;

const CHANGE_CAPACITY: usize = 64;

/// A write or removal, published to subscribers after it lands.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<Value>,
}

/// JSON values by string key, with change notifications.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Changes made through this store from now on.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Read `key` as `T`; absent keys are `None`.
pub(crate) async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub(crate) async fn save<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_value(value)?).await
}

fn publish(tx: &broadcast::Sender<StoreChange>, key: &str, new_value: Option<Value>) {
    // No receivers is fine.
    let _ = tx.send(StoreChange {
        key: key.to_string(),
        new_value,
    });
}

/// In-memory store, for tests and dry runs.
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            values: RwLock::new(HashMap::new()),
            changes,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_string(), value.clone());
        publish(&self.changes, key, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.values.write().await.remove(key).is_some() {
            publish(&self.changes, key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

/// One JSON file per key under a data directory.
///
/// ```text
/// {dir}/
/// ├── chatcast-settings.json
/// ├── chatcast-history.json
/// └── ...
/// ```
///
/// Writes go to a temporary sibling first and are renamed into place.
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
    changes: broadcast::Sender<StoreChange>,
}

impl JsonFileStore {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!("JsonFileStore initialized at {:?}", dir);
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Ok(Self {
            dir,
            write_lock: tokio::sync::Mutex::new(()),
            changes,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::sanitize_key(key)))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.key_path(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable store file {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.key_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&value)?).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Stored {} at {:?}", key, path);
        publish(&self.changes, key, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.key_path(key)).await {
            Ok(()) => {
                publish(&self.changes, key, None);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
