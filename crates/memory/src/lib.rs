//! # strata-memory
//!
//! Memory substrate for the strata engine.
//!
//! Two tiers of allocation:
//! - **Arenas** ([`arena::Arena`]): linear allocators over reserved virtual
//!   memory, committed on demand and reclaimed in bulk through snapshots
//! - **General purpose allocator** ([`heap::GeneralPurposeAllocator`]):
//!   individually freeable blocks inside a fixed buffer, recycled through
//!   size-classed and coalescing free lists
//!
//! Both implement the [`Allocator`](allocator::Allocator) capability so that
//! containers can be written once and handed an
//! [`AllocatorHandle`](allocator::AllocatorHandle).
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_memory::prelude::*;
//!
//! fn main() -> MemoryResult<()> {
//!     let memory = MemoryContext::new(MemoryConfig::low_memory())?;
//!
//!     // Per-frame scratch work, reclaimed by end_frame
//!     memory.begin_frame()?;
//!     let _positions = memory.frame().push_array::<[f32; 3]>(1024);
//!     memory.end_frame()?;
//!
//!     // Thread-local temporaries
//!     let scratch = memory.scratch_pool();
//!     {
//!         let scope = scratch.scratch_scope();
//!         let _tmp = scope.arena().push(4096);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `serde`: (de)serialize [`ArenaConfig`](crate::core::ArenaConfig) and
//!   [`MemoryConfig`]
//!
//! ## Error handling
//!
//! Recoverable failures are returned as [`MemoryError`] and logged through
//! `strata-log` where they are detected. Exhausting an arena's reservation or
//! failing to commit pages is fatal: the infallible arena entry points log the
//! error and panic, which aborts in release builds.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rust_2018_idioms)]
#![allow(unsafe_code)] // Allocators hand out raw memory
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Byte counts are converted to f64 only for ratios and display
#![allow(clippy::cast_precision_loss)]
// Header sizes are stored as u64 and always fit the address space
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::return_self_not_must_use)]
// Block headers are read and written unaligned
#![allow(clippy::cast_ptr_alignment)]

pub mod allocator;
pub mod arena;
pub mod context;
pub mod core;
pub mod error;
pub mod heap;

pub use crate::context::MemoryContext;
pub use crate::core::MemoryConfig;
pub use crate::error::{MemoryError, MemoryResult};

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::allocator::{Allocator, AllocatorHandle, SystemAllocator};
    pub use crate::arena::{
        Arena, ArenaConfig, ArenaRegistry, ArenaScope, ArenaSnapshot, ArenaStats, ScratchPool,
    };
    pub use crate::context::MemoryContext;
    pub use crate::core::MemoryConfig;
    pub use crate::error::{MemoryError, MemoryResult};
    pub use crate::heap::{GeneralPurposeAllocator, GpaStats};
}
