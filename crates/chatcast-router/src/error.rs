//! Routing errors.

use chatcast_automation::DriverError;
use chatcast_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("No batch-search tab found")]
    NoBatchTab,

    #[error("No site frames found")]
    NoFrames,

    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("Query is empty")]
    EmptyQuery,

    /// A site frame or flow reported failure; the message is user-facing.
    #[error("{0}")]
    Failed(String),

    /// The browser side of a transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
