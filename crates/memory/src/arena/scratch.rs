//! Per-thread scratch arenas
//!
//! A [`ScratchPool`] owns two small arenas that a thread hands out for
//! short-lived work. Consecutive requests alternate between them, so a
//! function that receives a scratch buffer from its caller can take a second
//! one without clobbering the first.

use core::cell::{Cell, OnceCell};

use strata_log::debug;

use super::{Arena, ArenaConfig, ArenaScope};
use crate::core::types::arena::SCRATCH_COUNT;
use crate::error::{MemoryError, MemoryResult, fatal};

/// Two lazily created scratch arenas used in alternation
///
/// Not `Sync`: each thread keeps its own pool.
#[derive(Debug)]
pub struct ScratchPool {
    config: ArenaConfig,
    arenas: [OnceCell<Arena>; SCRATCH_COUNT],
    next: Cell<usize>,
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchPool {
    /// Pool with the default scratch sizing (16 MiB / 1 MiB)
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::scratch().with_name("scratch"))
    }

    /// Pool whose arenas use `config`
    #[must_use]
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            config,
            arenas: [const { OnceCell::new() }; SCRATCH_COUNT],
            next: Cell::new(0),
        }
    }

    fn arena_at(&self, index: usize) -> MemoryResult<&Arena> {
        let slot = &self.arenas[index];
        if let Some(arena) = slot.get() {
            return Ok(arena);
        }

        let base = self.config.name.as_deref().unwrap_or("scratch");
        let config = self.config.clone().with_name(format!("{base}#{index}"));
        let arena = Arena::try_new(&config).map_err(|e| {
            MemoryError::initialization_failed(format!("scratch arena {index}: {e}"))
        })?;
        debug!(arena = arena.name(), "scratch arena created");
        Ok(slot.get_or_init(|| arena))
    }

    /// Next scratch arena, created on first use
    pub fn try_get_scratch(&self) -> MemoryResult<&Arena> {
        let index = self.next.get();
        let arena = self.arena_at(index)?;
        self.next.set((index + 1) % SCRATCH_COUNT);
        Ok(arena)
    }

    /// Next scratch arena; failure to create it is fatal
    pub fn get_scratch(&self) -> &Arena {
        match self.try_get_scratch() {
            Ok(arena) => arena,
            Err(err) => fatal(err),
        }
    }

    /// Next scratch arena wrapped in a scope that reclaims on drop
    pub fn scratch_scope(&self) -> ArenaScope<'_> {
        self.get_scratch().scope()
    }

    /// Arenas created so far
    #[must_use]
    pub fn created(&self) -> usize {
        self.arenas.iter().filter(|a| a.get().is_some()).count()
    }
}
