//! CDP error types.

use chatcast_automation::DriverError;
use chatcast_router::RouteError;
use thiserror::Error;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to the browser.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Nothing answers DevTools discovery at the endpoint.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Error object returned for a command.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error during endpoint discovery.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// The page threw while evaluating an injected function.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CdpError {
    /// The execution context a command referred to is gone (navigation).
    pub fn is_stale_context(&self) -> bool {
        match self {
            CdpError::Protocol { message, .. } => {
                message.contains("Cannot find context") || message.contains("Cannot find default")
            }
            _ => false,
        }
    }

    /// A backend node id no longer resolves in the frame.
    pub fn is_missing_node(&self) -> bool {
        matches!(self, CdpError::Protocol { message, .. } if message.contains("No node"))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for DriverError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::JavaScript(msg) => DriverError::Script(msg),
            CdpError::Timeout(msg) => DriverError::Timeout(msg),
            other if other.is_missing_node() => DriverError::ElementGone(other.to_string()),
            other => DriverError::Transport(other.to_string()),
        }
    }
}

impl From<CdpError> for RouteError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::Timeout(msg) => RouteError::Timeout(msg),
            other => RouteError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_context() {
        let err = CdpError::Protocol {
            code: -32000,
            message: "Cannot find context with specified id".into(),
        };
        assert!(err.is_stale_context());
        assert!(!CdpError::SessionClosed.is_stale_context());
    }

    #[test]
    fn test_driver_error_mapping() {
        let gone = CdpError::Protocol {
            code: -32000,
            message: "No node with given id found".into(),
        };
        assert!(matches!(DriverError::from(gone), DriverError::ElementGone(_)));
        assert!(matches!(
            DriverError::from(CdpError::JavaScript("boom".into())),
            DriverError::Script(msg) if msg == "boom"
        ));
        assert!(matches!(
            DriverError::from(CdpError::SessionClosed),
            DriverError::Transport(_)
        ));
    }

    #[test]
    fn test_route_error_mapping() {
        assert!(matches!(
            RouteError::from(CdpError::Timeout("x".into())),
            RouteError::Timeout(_)
        ));
        assert!(matches!(
            RouteError::from(CdpError::TargetNotFound("t".into())),
            RouteError::Transport(_)
        ));
    }
}
