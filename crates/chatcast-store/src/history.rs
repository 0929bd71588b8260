//! Query history and export history.
//!
//! Both lists are kept newest first. Every read-modify-write goes through a
//! per-store lock so concurrent broadcasts cannot drop each other's entries.

use std::sync::Arc;

use chatcast_protocols::{ExportHistoryEntry, HistoryEntry, SiteResult};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::kv::{load, save, KeyValueStore};

pub const HISTORY_KEY: &str = "chatcast-history";
pub const EXPORT_HISTORY_KEY: &str = "chatcast-export-history";

pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(load(self.store.as_ref(), HISTORY_KEY).await?.unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<Option<HistoryEntry>, StoreError> {
        Ok(self.list().await?.into_iter().find(|e| e.id == id))
    }

    /// Case-insensitive substring match on the query text.
    pub async fn search(&self, query: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let needle = query.to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|e| e.query.to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn add(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.list().await?;
        debug!(id = %entry.id, "adding history entry");
        entries.insert(0, entry);
        save(self.store.as_ref(), HISTORY_KEY, &entries).await
    }

    /// Replace the entry with the same id.
    pub async fn update(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.list().await?;
        let slot = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| StoreError::NotFound(entry.id.clone()))?;
        *slot = entry;
        save(self.store.as_ref(), HISTORY_KEY, &entries).await
    }

    /// Merge captured conversation URLs into entry `id`.
    ///
    /// Returns whether the stored entry changed. A deleted entry is not an error.
    pub async fn record_urls(&self, id: &str, captured: &[SiteResult]) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.list().await?;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            debug!(id, "history entry gone before urls were captured");
            return Ok(false);
        };
        if !entry.apply_captured(captured) {
            return Ok(false);
        }
        save(self.store.as_ref(), HISTORY_KEY, &entries).await?;
        Ok(true)
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.list().await?;
        entries.retain(|e| e.id != id);
        save(self.store.as_ref(), HISTORY_KEY, &entries).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        save(self.store.as_ref(), HISTORY_KEY, &Vec::<HistoryEntry>::new()).await
    }
}

pub struct ExportHistoryStore {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl ExportHistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Result<Vec<ExportHistoryEntry>, StoreError> {
        Ok(load(self.store.as_ref(), EXPORT_HISTORY_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<Option<ExportHistoryEntry>, StoreError> {
        Ok(self.list().await?.into_iter().find(|e| e.id == id))
    }

    pub async fn add(&self, entry: ExportHistoryEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.list().await?;
        entries.insert(0, entry);
        save(self.store.as_ref(), EXPORT_HISTORY_KEY, &entries).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.list().await?;
        entries.retain(|e| e.id != id);
        save(self.store.as_ref(), EXPORT_HISTORY_KEY, &entries).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        save(
            self.store.as_ref(),
            EXPORT_HISTORY_KEY,
            &Vec::<ExportHistoryEntry>::new(),
        )
        .await
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
