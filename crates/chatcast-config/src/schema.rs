//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::loader::ConfigLoader;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub sites: SitesConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// `storage.data_dir` with `~` expanded.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(ConfigLoader::expand_path(&self.storage.data_dir))
    }

    pub fn batch_page_path(&self) -> PathBuf {
        match &self.batch.page_path {
            Some(path) => PathBuf::from(ConfigLoader::expand_path(path)),
            None => self.data_dir().join("batch-search.html"),
        }
    }

    pub fn profile_dir(&self) -> PathBuf {
        match &self.browser.profile_dir {
            Some(path) => PathBuf::from(ConfigLoader::expand_path(path)),
            None => self.data_dir().join("browser-profile"),
        }
    }

    pub fn browser_executable(&self) -> Option<PathBuf> {
        self.browser
            .executable
            .as_deref()
            .map(|path| PathBuf::from(ConfigLoader::expand_path(path)))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }
}

/// Browser connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Explicit DevTools HTTP endpoint; overrides `debug_port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub headless: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<String>,

    /// Start a browser when none answers on the debug port.
    #[serde(default = "default_true")]
    pub launch: bool,

    /// Browser binary to start; well-known install locations are searched when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            endpoint: None,
            headless: false,
            profile_dir: None,
            launch: true,
            executable: None,
        }
    }
}

impl BrowserConfig {
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.debug_port))
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_true() -> bool {
    true
}

/// Batch page and broadcast pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_path: Option<String>,

    /// Delay between consecutive site injections.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// Wait before sending a query passed in the batch page URL.
    #[serde(default = "default_auto_send_delay_ms")]
    pub auto_send_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            page_path: None,
            stagger_ms: default_stagger_ms(),
            auto_send_delay_ms: default_auto_send_delay_ms(),
        }
    }
}

impl BatchConfig {
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn auto_send_delay(&self) -> Duration {
        Duration::from_millis(self.auto_send_delay_ms)
    }
}

fn default_stagger_ms() -> u64 {
    200
}

fn default_auto_send_delay_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Window-plane request/reply timeout.
    #[serde(default = "default_reply_ms")]
    pub reply_ms: u64,

    /// Window-plane wait for a site's step list to finish.
    #[serde(default = "default_inject_ms")]
    pub inject_ms: u64,

    /// Quill main-world bridge timeout.
    #[serde(default = "default_bridge_ms")]
    pub bridge_ms: u64,

    /// Pause between focusing the drop target and pasting files.
    #[serde(default = "default_file_focus_ms")]
    pub file_focus_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            reply_ms: default_reply_ms(),
            inject_ms: default_inject_ms(),
            bridge_ms: default_bridge_ms(),
            file_focus_ms: default_file_focus_ms(),
        }
    }
}

impl TimeoutsConfig {
    pub fn reply(&self) -> Duration {
        Duration::from_millis(self.reply_ms)
    }

    pub fn inject(&self) -> Duration {
        Duration::from_millis(self.inject_ms)
    }

    pub fn bridge(&self) -> Duration {
        Duration::from_millis(self.bridge_ms)
    }

    pub fn file_focus(&self) -> Duration {
        Duration::from_millis(self.file_focus_ms)
    }
}

fn default_reply_ms() -> u64 {
    5000
}

fn default_inject_ms() -> u64 {
    30000
}

fn default_bridge_ms() -> u64 {
    5000
}

fn default_file_focus_ms() -> u64 {
    200
}

/// Conversation URL capture after a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_capture_delays")]
    pub delays_ms: Vec<u64>,

    #[serde(default = "default_collect_ms")]
    pub collect_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            delays_ms: default_capture_delays(),
            collect_ms: default_collect_ms(),
        }
    }
}

impl CaptureConfig {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays_ms.iter().copied().map(Duration::from_millis).collect()
    }

    pub fn collect(&self) -> Duration {
        Duration::from_millis(self.collect_ms)
    }
}

fn default_capture_delays() -> Vec<u64> {
    vec![5000, 12000]
}

fn default_collect_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitesConfig {
    /// Site catalog JSON; the built-in catalog is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "~/.chatcast".to_string()
}
