//! Core functionality for strata-memory
//!
//! This module contains the building blocks shared by every allocator:
//! - Configuration structures
//! - Common types and constants

pub mod config;
pub mod types;

// Re-export commonly used items
pub use crate::error::{MemoryError, MemoryResult};
pub use config::{ArenaConfig, MemoryConfig};
pub use types::*;
