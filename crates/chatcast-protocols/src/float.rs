//! Detached ("floating") batch window state.

use serde::{Deserialize, Serialize};

/// Persisted record of a detached batch window.
///
/// Created when the batch page is detached into its own window, cleared when that
/// window goes away or can no longer be focused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatState {
    pub active: bool,
    /// CDP target id of the batch tab inside the floating window.
    pub tab_id: String,
    pub window_id: i64,
    pub original_window_id: i64,
}

impl FloatState {
    pub fn new(tab_id: impl Into<String>, window_id: i64, original_window_id: i64) -> Self {
        Self {
            active: true,
            tab_id: tab_id.into(),
            window_id,
            original_window_id,
        }
    }
}
