//! Unified error types for Chaser-Harness

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Chaser-Harness
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport errors talking to a driver endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// Driver reported a failure that has no finer classification
    #[error("Driver error: {0}")]
    Driver(String),

    /// No node matched the locator (yet)
    #[error("Element not found: {0}")]
    NotFound(String),

    /// A live reference points at a node that was destroyed or replaced
    #[error("Stale element reference: {0}")]
    Stale(String),

    /// Handle has neither a locator nor a usable live reference
    #[error("Element unresolvable: {0}")]
    Unresolvable(String),

    /// Locator is malformed or not valid for the surface
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// Capability not offered by this surface
    #[error("Unsupported on this surface: {0}")]
    Unsupported(String),

    /// A single bounded call ran out of time
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// The guarded action itself failed after a successful wait
    #[error("Action failed: {0}")]
    ActionFault(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Error::Transport(msg.into())
    }

    /// Create a new driver error
    pub fn driver<S: Into<String>>(msg: S) -> Self {
        Error::Driver(msg.into())
    }

    /// Create a new element not found error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Error::NotFound(what.into())
    }

    /// Create a new stale reference error
    pub fn stale<S: Into<String>>(what: S) -> Self {
        Error::Stale(what.into())
    }

    /// Create a new unresolvable handle error
    pub fn unresolvable<S: Into<String>>(what: S) -> Self {
        Error::Unresolvable(what.into())
    }

    /// Create a new invalid locator error
    pub fn invalid_locator<S: Into<String>>(msg: S) -> Self {
        Error::InvalidLocator(msg.into())
    }

    /// Create a new unsupported capability error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new action fault
    pub fn action_fault<S: Into<String>>(msg: S) -> Self {
        Error::ActionFault(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether a poll tick that hit this error may simply try again.
    ///
    /// Only "not rendered yet", "reference went stale" and an individual
    /// call running past its own bound qualify. Everything else aborts.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Stale(_) | Error::Timeout(_)
        )
    }

    /// Whether this error reports a detached reference
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::Stale(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::not_found("#login").is_recoverable());
        assert!(Error::stale("node-1").is_recoverable());
        assert!(Error::timeout("getText").is_recoverable());

        assert!(!Error::unresolvable("no locator").is_recoverable());
        assert!(!Error::script_execution_failed("SyntaxError").is_recoverable());
        assert!(!Error::invalid_locator("empty").is_recoverable());
        assert!(!Error::action_fault("click").is_recoverable());
        assert!(!Error::driver("session deleted").is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::stale("element 42");
        assert_eq!(err.to_string(), "Stale element reference: element 42");
        assert!(err.is_stale());
    }
}
