#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![allow(unsafe_code)] // Virtual memory management requires unsafe
//! # Strata System
//!
//! Platform layer for the strata engine.
//!
//! This crate provides:
//! - Virtual memory reservation, commit and decommit ([`memory::VirtualRegion`])
//! - The platform page size
//! - Alignment and byte-formatting helpers
//!
//! ## Features
//!
//! - `memory` (default): virtual memory primitives
//!
//! ## Example
//!
//! ```no_run
//! use strata_system::memory::{VirtualRegion, page_size};
//!
//! fn main() -> strata_system::SystemResult<()> {
//!     // Reserve 64 MiB of address space, back only the first page
//!     let region = VirtualRegion::reserve(64 * 1024 * 1024)?;
//!     region.commit(0, page_size())?;
//!
//!     println!("reserved {} bytes at {:p}", region.len(), region.as_ptr());
//!     Ok(())
//! }
//! ```
pub mod error;
pub mod utils;

#[cfg(feature = "memory")]
#[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
pub mod memory;

// Re-exports
pub use error::{SystemError, SystemResult};

#[cfg(feature = "memory")]
pub use memory::{VirtualRegion, page_size};
