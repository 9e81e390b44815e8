//! Unified error types for Chaser-Lens

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Chaser-Lens
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// HTTP errors talking to the DevTools discovery endpoints
    #[error("HTTP error: {0}")]
    Http(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser process could not be launched or located
    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Session could not be started or failed its verification navigation
    #[error("Session start failed: {0}")]
    SessionStart(String),

    /// No live session
    #[error("Browser session is not active")]
    SessionNotActive,

    /// Index absent from the current element address table
    #[error("element id {index} is unknown or stale; run a fresh page extraction before interacting with it")]
    StaleElement { index: usize },

    /// Timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// The session was stopped while the operation was in flight
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Navigation failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new HTTP error
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Error::Http(msg.into())
    }

    /// Create a new browser launch error
    pub fn browser_launch<S: Into<String>>(msg: S) -> Self {
        Error::BrowserLaunch(msg.into())
    }

    /// Create a new session start error
    pub fn session_start<S: Into<String>>(msg: S) -> Self {
        Error::SessionStart(msg.into())
    }

    /// Create a new stale element error
    pub fn stale_element(index: usize) -> Self {
        Error::StaleElement { index }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new cancellation error
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        Error::Cancelled(msg.into())
    }

    /// Create a new navigation failed error
    pub fn navigation_failed<S: Into<String>>(msg: S) -> Self {
        Error::NavigationFailed(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether the operation ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Whether the caller must re-extract before retrying
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleElement { .. })
    }

    /// Whether repeating the same call unchanged may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::WebSocket(_) | Error::Http(_) | Error::SessionStart(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_element_message_names_index() {
        let err = Error::stale_element(7);
        let msg = err.to_string();
        assert!(msg.contains("7"));
        assert!(msg.contains("fresh page extraction"));
        assert!(err.is_stale());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_is_distinguishable() {
        let err = Error::timeout("extract");
        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(!err.is_stale());
        assert!(!Error::script_execution_failed("boom").is_timeout());
    }
}
