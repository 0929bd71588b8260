//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid site configuration: {0}")]
    InvalidSiteConfig(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
