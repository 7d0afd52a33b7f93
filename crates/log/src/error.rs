//! Logging errors

use thiserror::Error;

/// Errors raised while installing the logger
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The level filter string could not be parsed
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed
    #[error("logger already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for logger setup
pub type LogResult<T> = Result<T, LogError>;
