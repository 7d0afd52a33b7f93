//! RAII helpers for scoped arena allocations

use super::{Arena, ArenaSnapshot};
use crate::error::MemoryResult;

/// RAII guard for scoped allocations within an arena
///
/// The guard takes a snapshot of the arena and ends it when dropped, so every
/// push made while it is alive is reclaimed in one step.
///
/// # Examples
///
/// ```
/// use strata_memory::arena::{Arena, ArenaConfig};
///
/// let arena = Arena::new(&ArenaConfig::new(1 << 20, 4096));
/// let _outer = arena.push(16);
/// let mark = arena.allocated();
///
/// {
///     let _scope = arena.scope();
///     let _temp = arena.push(1024);
///     // temp is reclaimed when the scope is dropped
/// }
///
/// assert_eq!(arena.allocated(), mark);
/// ```
#[must_use = "ArenaScope does nothing unless held"]
pub struct ArenaScope<'a> {
    arena: &'a Arena,
    snapshot: Option<ArenaSnapshot>,
}

impl<'a> ArenaScope<'a> {
    pub(super) fn new(arena: &'a Arena) -> Self {
        Self {
            snapshot: Some(arena.snapshot_begin()),
            arena,
        }
    }

    /// The arena this scope belongs to
    #[must_use]
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Offset the arena returns to when the scope ends
    #[must_use]
    pub fn offset(&self) -> usize {
        self.snapshot.map_or(0, |s| s.offset())
    }

    /// End the scope now, surfacing any snapshot error
    ///
    /// After calling this, the guard will not end the snapshot again on drop.
    pub fn end(mut self) -> MemoryResult<()> {
        match self.snapshot.take() {
            Some(snapshot) => self.arena.snapshot_end(snapshot),
            None => Ok(()),
        }
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            // Already logged by the error constructor; nothing to propagate to
            let _ = self.arena.snapshot_end(snapshot);
        }
    }
}

impl core::fmt::Debug for ArenaScope<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArenaScope")
            .field("arena", &self.arena.name())
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaConfig;

    fn arena() -> Arena {
        Arena::new(&ArenaConfig::new(1 << 20, 4096))
    }

    #[test]
    fn test_scope_auto_reset() {
        let arena = arena();
        let _outer = arena.push(100);
        let pos = arena.allocated();

        {
            let scope = arena.scope();
            let _temp = scope.arena().push(200);
            assert!(arena.allocated() > pos);
            assert_eq!(arena.open_scopes(), 1);
        }

        assert_eq!(arena.allocated(), pos);
        assert_eq!(arena.open_scopes(), 0);
    }

    #[test]
    fn test_scope_manual_end() {
        let arena = arena();
        let scope = arena.scope();
        let _temp = arena.push(64);

        scope.end().unwrap();
        assert_eq!(arena.allocated(), 0);
        assert_eq!(arena.open_scopes(), 0);
    }

    #[test]
    fn test_multiple_nested_scopes() {
        let arena = arena();
        let _val1 = arena.push(1);
        let pos1 = arena.allocated();

        {
            let outer = arena.scope();
            let _val2 = arena.push(2);
            let pos2 = arena.allocated();

            {
                let _inner = arena.scope();
                let _val3 = arena.push(3);
                assert_eq!(arena.open_scopes(), 2);
            }

            assert_eq!(arena.allocated(), pos2);
            assert_eq!(outer.offset(), pos1);
        }

        assert_eq!(arena.allocated(), pos1);
    }

    #[test]
    fn test_scope_with_early_return() {
        fn allocate_temp(arena: &Arena, should_fail: bool) -> Result<usize, &'static str> {
            let _scope = arena.scope();
            let _temp = arena.push(42);

            if should_fail {
                return Err("failed");
            }

            Ok(arena.allocated())
        }

        let arena = arena();
        let pos = arena.allocated();

        // Early return should still trigger guard drop
        assert!(allocate_temp(&arena, true).is_err());
        assert_eq!(arena.allocated(), pos);
        assert_eq!(allocate_temp(&arena, false), Ok(64));
        assert_eq!(arena.allocated(), pos);
    }

    #[test]
    fn test_out_of_order_end_is_reported() {
        let arena = arena();
        let outer = arena.scope();
        let inner = arena.scope();

        let err = outer.end().unwrap_err();
        assert_eq!(err.code(), "MEM:SNAPSHOT:UNBALANCED");

        inner.end().unwrap();
        assert_eq!(arena.open_scopes(), 1);
    }
}
