//! Selector errors.

use thiserror::Error;

/// Errors raised while parsing a CSS selector.
///
/// Not-found is never an error; only malformed or unsupported selectors are.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Invalid selector '{selector}': {reason}")]
    Invalid { selector: String, reason: String },

    #[error("Unsupported selector feature '{feature}' in '{selector}'")]
    Unsupported { selector: String, feature: String },
}

impl SelectorError {
    pub(crate) fn invalid(selector: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(selector: &str, feature: impl Into<String>) -> Self {
        Self::Unsupported {
            selector: selector.to_string(),
            feature: feature.into(),
        }
    }
}
