//! Error types for platform operations

use thiserror::Error;

/// Errors raised by the platform layer
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    /// The OS refused to reserve address space
    #[error("failed to reserve {size} bytes of address space: {reason}")]
    ReserveFailed { size: usize, reason: String },

    /// The OS refused to back a reserved range with memory
    #[error("failed to commit {len} bytes at offset {offset}: {reason}")]
    CommitFailed {
        offset: usize,
        len: usize,
        reason: String,
    },

    /// Pages could not be returned to the OS
    #[error("failed to decommit {len} bytes at offset {offset}: {reason}")]
    DecommitFailed {
        offset: usize,
        len: usize,
        reason: String,
    },

    /// The reservation itself could not be released
    #[error("failed to release {size}-byte reservation: {reason}")]
    ReleaseFailed { size: usize, reason: String },

    /// A range does not fit inside its region
    #[error("range {offset}+{len} is outside the {size}-byte region")]
    OutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },

    /// A size argument was rejected before reaching the OS
    #[error("invalid size: {reason}")]
    InvalidSize { reason: String },

    /// The current platform has no implementation
    #[error("not supported on this platform: {feature}")]
    NotSupported { feature: &'static str },
}

impl SystemError {
    /// Short category code, stable across releases
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReserveFailed { .. } => "SYS:VM:RESERVE",
            Self::CommitFailed { .. } => "SYS:VM:COMMIT",
            Self::DecommitFailed { .. } => "SYS:VM:DECOMMIT",
            Self::ReleaseFailed { .. } => "SYS:VM:RELEASE",
            Self::OutOfRange { .. } => "SYS:VM:RANGE",
            Self::InvalidSize { .. } => "SYS:VM:SIZE",
            Self::NotSupported { .. } => "SYS:UNSUPPORTED",
        }
    }

    /// Create an invalid size error
    pub fn invalid_size(reason: impl Into<String>) -> Self {
        Self::InvalidSize {
            reason: reason.into(),
        }
    }

    /// Text of the last OS error on this thread
    pub(crate) fn last_os_error() -> String {
        std::io::Error::last_os_error().to_string()
    }
}

/// Result type for platform operations
pub type SystemResult<T> = Result<T, SystemError>;
