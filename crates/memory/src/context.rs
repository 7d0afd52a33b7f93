//! Explicit memory context
//!
//! [`MemoryContext`] is built once at startup and passed to the subsystems
//! that need long-lived or per-frame memory. Each thread that wants scratch
//! space builds its own [`ScratchPool`] from the context.

use strata_log::info;

use crate::arena::{Arena, ArenaRegistry, ScratchPool};
use crate::core::config::MemoryConfig;
use crate::error::MemoryResult;

/// Owner of the application, session and frame arenas
///
/// # Examples
///
/// ```
/// use strata_memory::{MemoryConfig, MemoryContext};
///
/// let memory = MemoryContext::new(MemoryConfig::low_memory()).unwrap();
/// let _config = memory.app().push(256);
///
/// for _ in 0..3 {
///     memory.begin_frame().unwrap();
///     let _transient = memory.frame().push(4096);
///     memory.end_frame().unwrap();
/// }
/// assert_eq!(memory.frame().allocated(), 0);
/// ```
#[derive(Debug)]
pub struct MemoryContext {
    config: MemoryConfig,
    registry: ArenaRegistry,
}

impl MemoryContext {
    /// Create every arena described by `config`
    pub fn new(config: MemoryConfig) -> MemoryResult<Self> {
        let registry = ArenaRegistry::new(&config)?;
        info!("memory context initialized");
        Ok(Self { config, registry })
    }

    /// Context with the default sizes (1 GiB reservations)
    pub fn with_defaults() -> MemoryResult<Self> {
        Self::new(MemoryConfig::default())
    }

    /// Application-lifetime arena
    #[inline]
    pub fn app(&self) -> &Arena {
        self.registry.app()
    }

    /// Session arena
    #[inline]
    pub fn session(&self) -> &Arena {
        self.registry.session()
    }

    /// Frame arena
    #[inline]
    pub fn frame(&self) -> &Arena {
        self.registry.frame()
    }

    /// See [`ArenaRegistry::begin_frame`]
    pub fn begin_frame(&self) -> MemoryResult<u64> {
        self.registry.begin_frame()
    }

    /// See [`ArenaRegistry::end_frame`]
    pub fn end_frame(&self) -> MemoryResult<()> {
        self.registry.end_frame()
    }

    /// See [`ArenaRegistry::reset_session`]
    pub fn reset_session(&self) -> MemoryResult<()> {
        self.registry.reset_session()
    }

    /// Frames begun so far
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.registry.frame_index()
    }

    /// New scratch pool sized by this context's scratch configuration
    ///
    /// Call once per thread; the arenas are created on first use.
    #[must_use]
    pub fn scratch_pool(&self) -> ScratchPool {
        ScratchPool::with_config(self.config.scratch.clone())
    }

    /// Configuration the context was built from
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// The underlying arenas
    #[must_use]
    pub fn registry(&self) -> &ArenaRegistry {
        &self.registry
    }
}
