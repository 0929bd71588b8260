//! User settings persistence.

use std::sync::Arc;

use chatcast_protocols::UserSettings;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::StoreError;
use crate::kv::{load, save, KeyValueStore};

pub const SETTINGS_KEY: &str = "chatcast-settings";

/// Settings on top of a [`KeyValueStore`]; missing fields take their defaults.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    update_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            update_lock: Mutex::new(()),
        }
    }

    pub async fn get(&self) -> Result<UserSettings, StoreError> {
        Ok(load(self.store.as_ref(), SETTINGS_KEY).await?.unwrap_or_default())
    }

    /// Overlay `partial` (top-level camelCase keys) and persist the result.
    pub async fn update(&self, partial: &Map<String, Value>) -> Result<UserSettings, StoreError> {
        let _guard = self.update_lock.lock().await;
        let merged = self.get().await?.merge_partial(partial)?;
        save(self.store.as_ref(), SETTINGS_KEY, &merged).await?;
        info!(keys = ?partial.keys().collect::<Vec<_>>(), "settings updated");
        Ok(merged)
    }

    pub async fn replace(&self, settings: &UserSettings) -> Result<(), StoreError> {
        settings.check()?;
        let _guard = self.update_lock.lock().await;
        save(self.store.as_ref(), SETTINGS_KEY, settings).await
    }
}
