//! Snapshot support for arenas

/// Saved high-water mark of an [`Arena`](super::Arena)
///
/// Produced by [`Arena::snapshot_begin`](super::Arena::snapshot_begin) and
/// consumed by [`Arena::snapshot_end`](super::Arena::snapshot_end). Records
/// which arena it came from and how deeply it is nested so that ending it on
/// the wrong arena or out of order is reported instead of corrupting state.
#[must_use = "an open snapshot must be ended"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaSnapshot {
    pub(super) arena_id: u64,
    pub(super) offset: usize,
    pub(super) depth: u32,
}

impl ArenaSnapshot {
    /// Identity of the arena that took the snapshot
    #[inline]
    #[must_use]
    pub fn arena_id(&self) -> u64 {
        self.arena_id
    }

    /// Allocated offset at capture time
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Nesting depth, 1 for the outermost snapshot
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}
