//! Error types for strata-memory
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. Every
//! convenience constructor also emits the diagnostic for the error it builds,
//! so a reported failure is logged exactly once, where it happens.

use strata_log::{error, warn};
use strata_system::SystemError;
use thiserror::Error;

// ============================================================================
// Main Error Types
// ============================================================================

/// Memory management errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Allocation Errors ---
    #[error("Out of memory: requested {requested} bytes, {available} bytes free")]
    OutOfMemory { requested: usize, available: usize },

    #[error("Invalid allocation size {size}: {reason}")]
    InvalidSize { size: usize, reason: String },

    #[error("Invalid memory layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: String },

    // --- Ownership Errors ---
    #[error("Invalid pointer {address:#x}: {reason}")]
    InvalidPointer { address: usize, reason: String },

    #[error("Double free of block at {address:#x}")]
    DoubleFree { address: usize },

    #[error("Memory corruption detected in {component}: {details}")]
    Corruption { component: String, details: String },

    // --- Arena Errors ---
    #[error("Arena '{arena_id}' exhausted: requested {requested} bytes, available {available}")]
    ArenaExhausted {
        arena_id: String,
        requested: usize,
        available: usize,
    },

    #[error("Unbalanced snapshot on arena '{arena_id}': ending depth {snapshot_depth}, open depth {open_depth}")]
    UnbalancedSnapshot {
        arena_id: String,
        snapshot_depth: u32,
        open_depth: u32,
    },

    #[error("Snapshot taken on arena #{owner} ended on arena '{arena_id}'")]
    ForeignSnapshot { arena_id: String, owner: u64 },

    // --- Feature Support Errors ---
    #[error("Feature not supported: {feature}{}", context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
    NotSupported {
        feature: &'static str,
        context: Option<String>,
    },

    // --- System Errors ---
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Initialization failed: {reason}")]
    InitializationFailed { reason: String },

    #[error("Platform error: {0}")]
    Platform(#[from] SystemError),
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Only capacity failures qualify: the caller may free memory or grow the
    /// backing store and try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }

    /// Check if error means the process cannot safely continue
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ArenaExhausted { .. } | Self::Platform(_))
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfMemory { .. } => "MEM:ALLOC:OOM",
            Self::InvalidSize { .. } => "MEM:ALLOC:SIZE",
            Self::InvalidLayout { .. } => "MEM:ALLOC:LAYOUT",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::InvalidPointer { .. } => "MEM:PTR:INVALID",
            Self::DoubleFree { .. } => "MEM:PTR:DOUBLE_FREE",
            Self::Corruption { .. } => "MEM:SYSTEM:CORRUPTION",
            Self::ArenaExhausted { .. } => "MEM:ARENA:EXHAUSTED",
            Self::UnbalancedSnapshot { .. } => "MEM:SNAPSHOT:UNBALANCED",
            Self::ForeignSnapshot { .. } => "MEM:SNAPSHOT:FOREIGN",
            Self::NotSupported { .. } => "MEM:FEATURE:UNSUPPORTED",
            Self::InvalidState { .. } => "MEM:SYSTEM:STATE",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::InitializationFailed { .. } => "MEM:SYSTEM:INIT",
            Self::Platform(_) => "MEM:PLATFORM",
        }
    }

    // ============================================================================
    // Convenience Constructors - Allocation Errors
    // ============================================================================

    /// Create out of memory error
    pub fn out_of_memory(requested: usize, available: usize) -> Self {
        error!(requested, available, "allocation failed: out of memory");
        Self::OutOfMemory {
            requested,
            available,
        }
    }

    /// Create invalid size error
    pub fn invalid_size(size: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(size, reason = %reason, "invalid allocation size");
        Self::InvalidSize { size, reason }
    }

    /// Create invalid layout error
    pub fn invalid_layout(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(reason = %reason, "invalid layout");
        Self::InvalidLayout { reason }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        warn!(operation = %operation, "size overflow");
        Self::SizeOverflow { operation }
    }

    // ============================================================================
    // Convenience Constructors - Ownership Errors
    // ============================================================================

    /// Create invalid pointer error
    pub fn invalid_pointer(address: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(address, reason = %reason, "invalid pointer");
        Self::InvalidPointer { address, reason }
    }

    /// Create double free error
    pub fn double_free(address: usize) -> Self {
        warn!(address, "double free");
        Self::DoubleFree { address }
    }

    /// Create corruption error
    pub fn corruption(component: impl Into<String>, details: impl Into<String>) -> Self {
        let component = component.into();
        let details = details.into();
        error!(component = %component, details = %details, "memory corruption detected");
        Self::Corruption { component, details }
    }

    // ============================================================================
    // Convenience Constructors - Arena Errors
    // ============================================================================

    /// Create arena exhausted error
    pub fn arena_exhausted(arena_id: impl Into<String>, requested: usize, available: usize) -> Self {
        let arena_id = arena_id.into();
        error!(arena = %arena_id, requested, available, "arena reservation exhausted");
        Self::ArenaExhausted {
            arena_id,
            requested,
            available,
        }
    }

    /// Create unbalanced snapshot error
    pub fn unbalanced_snapshot(
        arena_id: impl Into<String>,
        snapshot_depth: u32,
        open_depth: u32,
    ) -> Self {
        let arena_id = arena_id.into();
        warn!(arena = %arena_id, snapshot_depth, open_depth, "snapshot ended out of order");
        Self::UnbalancedSnapshot {
            arena_id,
            snapshot_depth,
            open_depth,
        }
    }

    /// Create foreign snapshot error
    pub fn foreign_snapshot(arena_id: impl Into<String>, owner: u64) -> Self {
        let arena_id = arena_id.into();
        warn!(arena = %arena_id, owner, "snapshot ended on the wrong arena");
        Self::ForeignSnapshot { arena_id, owner }
    }

    // ============================================================================
    // Convenience Constructors - Support and System Errors
    // ============================================================================

    /// Create not supported error with context
    pub fn not_supported_with_context(feature: &'static str, context: impl Into<String>) -> Self {
        let context = context.into();
        warn!(feature, context = %context, "unsupported operation");
        Self::NotSupported {
            feature,
            context: Some(context),
        }
    }

    /// Create invalid state error
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(reason = %reason, "invalid state");
        Self::InvalidState { reason }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create initialization failed error
    pub fn initialization_failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!(reason = %reason, "memory initialization failed");
        Self::InitializationFailed { reason }
    }

    /// Wrap a platform error
    pub fn platform(source: SystemError) -> Self {
        error!(code = source.code(), error = %source, "platform memory operation failed");
        Self::Platform(source)
    }
}

/// Log a fatal error and abandon the current thread
///
/// Used by the infallible arena entry points; release builds abort.
#[cold]
#[track_caller]
pub(crate) fn fatal(err: MemoryError) -> ! {
    error!(code = err.code(), error = %err, "fatal memory error");
    panic!("fatal memory error: {err}")
}

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = MemoryError::out_of_memory(1024, 512);
        assert!(matches!(
            error,
            MemoryError::OutOfMemory {
                requested: 1024,
                available: 512
            }
        ));
        assert_eq!(error.code(), "MEM:ALLOC:OOM");
    }

    #[test]
    fn test_error_display() {
        let error = MemoryError::arena_exhausted("frame", 4096, 128);
        assert_eq!(
            error.to_string(),
            "Arena 'frame' exhausted: requested 4096 bytes, available 128"
        );

        let error = MemoryError::invalid_pointer(0x1000, "outside buffer");
        assert_eq!(error.to_string(), "Invalid pointer 0x1000: outside buffer");

        let error = MemoryError::not_supported_with_context("reallocate", "arena");
        assert_eq!(error.to_string(), "Feature not supported: reallocate (arena)");
    }

    #[test]
    fn test_error_classification() {
        assert!(MemoryError::out_of_memory(1, 0).is_retryable());
        assert!(!MemoryError::double_free(0x40).is_retryable());

        assert!(MemoryError::arena_exhausted("app", 1, 0).is_fatal());
        assert!(MemoryError::platform(SystemError::invalid_size("zero")).is_fatal());
        assert!(!MemoryError::unbalanced_snapshot("frame", 1, 2).is_fatal());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(MemoryError::double_free(0).code(), "MEM:PTR:DOUBLE_FREE");
        assert_eq!(
            MemoryError::foreign_snapshot("session", 3).code(),
            "MEM:SNAPSHOT:FOREIGN"
        );
        assert_eq!(
            MemoryError::from(SystemError::invalid_size("zero")).code(),
            "MEM:PLATFORM"
        );
    }

    #[test]
    #[should_panic(expected = "fatal memory error")]
    fn test_fatal_panics() {
        fatal(MemoryError::arena_exhausted("scratch", 10, 0));
    }
}
