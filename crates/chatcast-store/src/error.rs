//! Store errors.

use chatcast_protocols::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value was rejected before it was written.
    #[error(transparent)]
    Invalid(#[from] ProtocolError),
}
