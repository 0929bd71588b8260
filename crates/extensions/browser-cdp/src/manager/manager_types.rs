//! Browser manager type definitions and configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::cdp::CdpError;

/// Browser manager errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Chrome not found. Please install Google Chrome.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("No browser answers at {0} and launching is disabled")]
    NotRunning(String),

    #[error("Batch page did not load: {0}")]
    BatchNotReady(String),

    #[error(transparent)]
    Cdp(#[from] CdpError),
}

/// Browser configuration.
#[derive(Debug, Clone)]
pub struct BrowserManagerConfig {
    /// Chrome debugging port.
    pub debug_port: u16,
    /// Explicit DevTools HTTP endpoint; overrides `debug_port`.
    pub endpoint: Option<String>,
    /// Profile directory for persistent login state.
    pub profile_dir: Option<PathBuf>,
    pub headless: bool,
    /// Start a browser when none answers.
    pub launch: bool,
    /// Browser binary to launch; searched for when unset.
    pub executable: Option<PathBuf>,
}

impl Default for BrowserManagerConfig {
    fn default() -> Self {
        Self {
            debug_port: 9222,
            endpoint: None,
            profile_dir: None,
            headless: false,
            launch: true,
            executable: None,
        }
    }
}

impl BrowserManagerConfig {
    pub fn get_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".chatcast")
                .join("browser-profile")
        })
    }

    /// The DevTools HTTP endpoint.
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.debug_port),
        }
    }
}
