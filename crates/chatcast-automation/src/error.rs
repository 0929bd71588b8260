//! Frame driver errors.

use chatcast_dom::SelectorError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// An element handle no longer resolves in the frame.
    #[error("Element is gone: {0}")]
    ElementGone(String),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// The page threw while running an injected function.
    #[error("Script error: {0}")]
    Script(String),

    /// The connection to the frame failed.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_error_is_transparent() {
        let err: DriverError = SelectorError::Empty.into();
        assert_eq!(err.to_string(), "Empty selector");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DriverError::ElementGone("textarea".into()).to_string(),
            "Element is gone: textarea"
        );
        assert!(DriverError::Timeout("bridge".into()).to_string().starts_with("Timeout"));
    }
}
