//! BrowserManager core: attach to a browser, or start one.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{BrowserError, BrowserManagerConfig};
use crate::cdp::{discover, CdpClient};

const LAUNCH_POLL: Duration = Duration::from_millis(200);
const LAUNCH_ATTEMPTS: u32 = 30;

#[cfg(target_os = "macos")]
const CHROME_CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(target_os = "linux")]
const CHROME_CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

#[cfg(target_os = "windows")]
const CHROME_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const CHROME_CANDIDATES: &[&str] = &[];

/// Owns the browser connection, and the browser process when it started it.
///
/// A started browser is left running when the manager goes away, so the
/// batch page outlives the command that opened it.
pub struct BrowserManager {
    pub(super) config: BrowserManagerConfig,
    pub(super) client: RwLock<Option<Arc<CdpClient>>>,
    pub(super) chrome_process: RwLock<Option<Child>>,
}

impl BrowserManager {
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            chrome_process: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &BrowserManagerConfig {
        &self.config
    }

    /// The configured executable if it exists, else the first installed candidate.
    pub fn find_chrome(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config.executable {
            if path.exists() {
                return Some(path.clone());
            }
            warn!("Configured browser {} does not exist", path.display());
        }
        CHROME_CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists())
    }

    async fn answers(&self) -> bool {
        discover(&self.config.endpoint()).await.is_ok()
    }

    async fn launch_chrome(&self) -> Result<Child, BrowserError> {
        let chrome_path = self.find_chrome().ok_or(BrowserError::ChromeNotFound)?;
        let profile_dir = self.config.get_profile_dir();
        if let Err(e) = std::fs::create_dir_all(&profile_dir) {
            warn!("Failed to create profile directory: {}", e);
        }

        info!(browser = %chrome_path.display(), profile = %profile_dir.display(), "launching browser");
        let child = Command::new(&chrome_path)
            .args(launch_args(&self.config, &profile_dir))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
        debug!(pid = ?child.id(), "browser process started");
        Ok(child)
    }

    async fn wait_until_answering(&self) -> bool {
        for _ in 0..LAUNCH_ATTEMPTS {
            tokio::time::sleep(LAUNCH_POLL).await;
            if self.answers().await {
                return true;
            }
        }
        false
    }

    /// Attach to the browser, starting one when allowed.
    ///
    /// Nothing is started for an explicit endpoint: it may be another machine.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_some() {
            return Ok(());
        }
        let endpoint = self.config.endpoint();

        if self.answers().await {
            info!("Browser already running at {}", endpoint);
        } else {
            if !self.config.launch || self.config.endpoint.is_some() {
                return Err(BrowserError::NotRunning(endpoint));
            }
            let child = self.launch_chrome().await?;
            *self.chrome_process.write().await = Some(child);
            if !self.wait_until_answering().await {
                return Err(BrowserError::LaunchFailed(format!(
                    "no DevTools endpoint at {} after {:?}",
                    endpoint,
                    LAUNCH_POLL * LAUNCH_ATTEMPTS
                )));
            }
        }

        let client = CdpClient::connect(&endpoint).await?;
        *self.client.write().await = Some(Arc::new(client));
        info!("Connected to browser at {}", endpoint);
        Ok(())
    }

    pub async fn ensure_connected(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_none() {
            self.connect().await?;
        }
        Ok(())
    }

    pub async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// Drop the connection. A started browser keeps running.
    pub async fn close(&self) -> Result<(), BrowserError> {
        if self.client.write().await.take().is_some() {
            debug!("browser connection closed");
        }
        Ok(())
    }

    /// Stop the browser if this manager started it.
    pub async fn shutdown_chrome(&self) -> Result<(), BrowserError> {
        self.close().await?;
        if let Some(mut child) = self.chrome_process.write().await.take() {
            info!("stopping browser");
            if let Err(e) = child.kill().await {
                warn!("Failed to stop browser: {}", e);
            }
        }
        Ok(())
    }
}

/// Command line for a browser that hosts the batch page.
pub(super) fn launch_args(config: &BrowserManagerConfig, profile_dir: &Path) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", config.debug_port),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-sync".to_string(),
        "--disable-translate".to_string(),
        // The batch page is a local file embedding remote sites.
        "--allow-file-access-from-files".to_string(),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args
}
