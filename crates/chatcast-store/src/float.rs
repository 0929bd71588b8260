//! Detached batch window state.

use std::sync::Arc;

use chatcast_protocols::FloatState;
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::StoreError;
use crate::kv::{load, save, KeyValueStore, StoreChange};

pub const FLOAT_STATE_KEY: &str = "chatcast-float-state";

pub struct FloatStateStore {
    store: Arc<dyn KeyValueStore>,
}

impl FloatStateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self) -> Result<Option<FloatState>, StoreError> {
        load(self.store.as_ref(), FLOAT_STATE_KEY).await
    }

    pub async fn set(&self, state: &FloatState) -> Result<(), StoreError> {
        save(self.store.as_ref(), FLOAT_STATE_KEY, state).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(FLOAT_STATE_KEY).await
    }

    pub fn watch(&self) -> FloatWatcher {
        FloatWatcher {
            rx: self.store.subscribe(),
        }
    }
}

/// Float state changes only; other keys are skipped.
pub struct FloatWatcher {
    rx: broadcast::Receiver<StoreChange>,
}

impl FloatWatcher {
    /// Next float state change: `Some(None)` when cleared, `None` once the
    /// store is gone.
    pub async fn changed(&mut self) -> Option<Option<FloatState>> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.key == FLOAT_STATE_KEY => {
                    let state = change
                        .new_value
                        .and_then(|v| serde_json::from_value(v).ok());
                    return Some(state);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "float state watcher lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
