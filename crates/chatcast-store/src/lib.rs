//! # chatcast store
//!
//! Key/value persistence for everything chatcast remembers between runs.
//!
//! ## Keys
//!
//! - `chatcast-settings` - [`UserSettings`](chatcast_protocols::UserSettings)
//! - `chatcast-history` - query history, newest first
//! - `chatcast-export-history` - saved Markdown exports, newest first
//! - `chatcast-float-state` - the detached batch window, when there is one

pub mod error;
pub mod float;
pub mod history;
pub mod kv;
pub mod settings;

pub use error::StoreError;
pub use float::{FloatStateStore, FLOAT_STATE_KEY};
pub use history::{ExportHistoryStore, HistoryStore, EXPORT_HISTORY_KEY, HISTORY_KEY};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore, StoreChange};
pub use settings::{SettingsStore, SETTINGS_KEY};
