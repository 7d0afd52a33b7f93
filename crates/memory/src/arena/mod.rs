//! Linear arenas over lazily committed virtual memory
//!
//! An [`Arena`] reserves a large range of address space up front and commits
//! pages only as pushes reach them. Memory is handed out by bumping an offset
//! and reclaimed in bulk: by popping in stack order, by ending a snapshot, or
//! by resetting the whole arena. Individual allocations are never freed.
//!
//! ```
//! use strata_memory::arena::{Arena, ArenaConfig};
//!
//! let arena = Arena::new(&ArenaConfig::new(1 << 20, 4096));
//! let snapshot = arena.snapshot_begin();
//! let _tmp = arena.push(8000);
//! assert!(arena.committed() >= 8000);
//! arena.snapshot_end(snapshot).unwrap();
//! assert_eq!(arena.allocated(), 0);
//! ```
//!
//! Every push is aligned to a 64-byte cache line. Exhausting the reservation,
//! or the platform refusing to commit, is fatal for [`Arena::push`]; the
//! `try_` variants return the error instead.

mod registry;
mod scope;
mod scratch;
mod snapshot;

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use strata_log::{debug, trace, warn};
use strata_system::memory::{VirtualRegion, page_size};
use strata_system::utils::{align_up, checked_align_up, format_bytes_usize};

pub use crate::core::config::ArenaConfig;
pub use registry::ArenaRegistry;
pub use scope::ArenaScope;
pub use scratch::ScratchPool;
pub use snapshot::ArenaSnapshot;

use crate::allocator::Allocator;
use crate::core::types::alignment::CACHE_LINE;
use crate::error::{MemoryError, MemoryResult, fatal};

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Bump allocator over a reserved virtual memory region
///
/// `Arena` is `Send` but not `Sync`: it may move between threads, but only one
/// thread may use it at a time.
pub struct Arena {
    id: u64,
    name: String,
    region: VirtualRegion,
    page_size: usize,
    min_resident: usize,
    committed: Cell<usize>,
    allocated: Cell<usize>,
    open_scopes: Cell<u32>,
}

/// Point-in-time usage of an arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Reserved address space
    pub reserved: usize,
    /// Committed bytes
    pub committed: usize,
    /// Bytes handed out
    pub allocated: usize,
    /// Committed bytes past the page-aligned allocation
    pub remaining: usize,
    /// Snapshots not yet ended
    pub open_scopes: u32,
}

impl fmt::Display for ArenaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} allocated / {} committed / {} reserved",
            format_bytes_usize(self.allocated),
            format_bytes_usize(self.committed),
            format_bytes_usize(self.reserved)
        )
    }
}

impl Arena {
    /// Reserve and commit a new arena
    ///
    /// The reservation is rounded up to the page size. The initial commit is
    /// at least the minimum resident size, also page rounded.
    pub fn try_new(config: &ArenaConfig) -> MemoryResult<Self> {
        config.validate()?;
        let page_size = page_size();
        let id = NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed);
        let name = config.name.clone().unwrap_or_else(|| format!("arena#{id}"));

        let region = VirtualRegion::reserve(config.reserve_size).map_err(MemoryError::platform)?;
        let reserved = region.len();
        let min_resident = if config.min_resident == 0 {
            0
        } else {
            align_up(config.min_resident, page_size).min(reserved)
        };
        let initial = checked_align_up(config.initial_commit.max(min_resident), page_size)
            .map_or(reserved, |c| c.min(reserved));
        region.commit(0, initial).map_err(MemoryError::platform)?;

        debug!(arena = %name, reserved, committed = initial, min_resident, "arena created");
        Ok(Self {
            id,
            name,
            region,
            page_size,
            min_resident,
            committed: Cell::new(initial),
            allocated: Cell::new(0),
            open_scopes: Cell::new(0),
        })
    }

    /// Reserve and commit a new arena; failure is fatal
    pub fn new(config: &ArenaConfig) -> Self {
        match Self::try_new(config) {
            Ok(arena) => arena,
            Err(err) => fatal(err),
        }
    }

    /// Shorthand for an unnamed arena with the given sizes
    pub fn with_capacity(reserve_size: usize, initial_commit: usize) -> Self {
        Self::new(&ArenaConfig::new(reserve_size, initial_commit))
    }

    // ------------------------------------------------------------------
    // Push / pop
    // ------------------------------------------------------------------

    /// Bump-allocate `size` bytes, growing the commit if needed
    ///
    /// The returned memory is 64-byte aligned and uninitialized.
    pub fn try_push(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        if size == 0 {
            return Err(MemoryError::invalid_size(0, "arena push of zero bytes"));
        }
        let offset = self.allocated.get();
        let end = checked_align_up(size, CACHE_LINE)
            .and_then(|total| offset.checked_add(total))
            .ok_or_else(|| MemoryError::size_overflow(format!("push of {size} bytes")))?;

        if end > self.committed.get() {
            self.grow(end)?;
        }
        self.allocated.set(end);
        trace!(arena = %self.name, size, offset, "arena push");

        // SAFETY: offset < end <= committed <= reserved, so the pointer lies
        // inside the committed part of our region.
        Ok(unsafe { NonNull::new_unchecked(self.region.as_ptr().add(offset)) })
    }

    /// Bump-allocate `size` bytes; exhaustion is fatal
    pub fn push(&self, size: usize) -> NonNull<u8> {
        match self.try_push(size) {
            Ok(ptr) => ptr,
            Err(err) => fatal(err),
        }
    }

    /// Like [`try_push`](Self::try_push), zeroing the returned bytes
    pub fn try_push_zero(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        let ptr = self.try_push(size)?;
        // SAFETY: `size` bytes at `ptr` were just committed to us.
        unsafe { ptr.as_ptr().write_bytes(0, size) };
        Ok(ptr)
    }

    /// Like [`push`](Self::push), zeroing the returned bytes
    pub fn push_zero(&self, size: usize) -> NonNull<u8> {
        match self.try_push_zero(size) {
            Ok(ptr) => ptr,
            Err(err) => fatal(err),
        }
    }

    /// Retract the high-water mark by the aligned `size`
    ///
    /// Pops must mirror earlier pushes in reverse order. Popping more than is
    /// allocated is reported and leaves the arena unchanged.
    pub fn pop(&self, size: usize) -> MemoryResult<()> {
        let allocated = self.allocated.get();
        let Some(remaining) = checked_align_up(size, CACHE_LINE).and_then(|t| allocated.checked_sub(t))
        else {
            return Err(MemoryError::invalid_state(format!(
                "pop of {size} bytes from arena '{}' holding {allocated}",
                self.name
            )));
        };
        self.allocated.set(remaining);
        trace!(arena = %self.name, size, "arena pop");
        Ok(())
    }

    /// Forget every allocation; fails while snapshots are open
    pub fn reset(&self) -> MemoryResult<()> {
        if self.open_scopes.get() != 0 {
            return Err(MemoryError::invalid_state(format!(
                "reset of arena '{}' with {} open snapshots",
                self.name,
                self.open_scopes.get()
            )));
        }
        self.allocated.set(0);
        debug!(arena = %self.name, "arena reset");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Typed pushes
    // ------------------------------------------------------------------

    fn array_layout<T>(count: usize) -> MemoryResult<Layout> {
        let layout = Layout::array::<T>(count).map_err(|e| {
            MemoryError::invalid_layout(format!("{count} x {}: {e}", core::any::type_name::<T>()))
        })?;
        if layout.align() > CACHE_LINE {
            return Err(MemoryError::invalid_layout(format!(
                "{} needs {}-byte alignment, arenas provide {CACHE_LINE}",
                core::any::type_name::<T>(),
                layout.align()
            )));
        }
        Ok(layout)
    }

    /// Room for `count` values of `T`, uninitialized
    ///
    /// Zero-sized requests return a dangling, well-aligned pointer without
    /// touching the arena.
    pub fn try_push_array<T>(&self, count: usize) -> MemoryResult<NonNull<T>> {
        let layout = Self::array_layout::<T>(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        Ok(self.try_push(layout.size())?.cast())
    }

    /// Room for `count` zeroed values of `T`
    pub fn try_push_array_zeroed<T>(&self, count: usize) -> MemoryResult<NonNull<T>> {
        let layout = Self::array_layout::<T>(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        Ok(self.try_push_zero(layout.size())?.cast())
    }

    /// Room for `count` values of `T`; failure is fatal
    pub fn push_array<T>(&self, count: usize) -> NonNull<T> {
        match self.try_push_array(count) {
            Ok(ptr) => ptr,
            Err(err) => fatal(err),
        }
    }

    /// Room for `count` zeroed values of `T`; failure is fatal
    pub fn push_array_zeroed<T>(&self, count: usize) -> NonNull<T> {
        match self.try_push_array_zeroed(count) {
            Ok(ptr) => ptr,
            Err(err) => fatal(err),
        }
    }

    /// Room for one `T`, uninitialized
    pub fn push_struct<T>(&self) -> NonNull<T> {
        self.push_array(1)
    }

    /// Room for one zeroed `T`
    pub fn push_struct_zeroed<T>(&self) -> NonNull<T> {
        self.push_array_zeroed(1)
    }

    /// Copy `values` into the arena
    pub fn try_push_copy<T: Copy>(&self, values: &[T]) -> MemoryResult<NonNull<[T]>> {
        let ptr = self.try_push_array::<T>(values.len())?;
        // SAFETY: `ptr` has room for `values.len()` elements and cannot overlap
        // a slice the caller already holds.
        unsafe {
            ptr.as_ptr()
                .copy_from_nonoverlapping(values.as_ptr(), values.len());
        }
        Ok(NonNull::slice_from_raw_parts(ptr, values.len()))
    }

    /// Copy `values` into the arena; failure is fatal
    pub fn push_copy<T: Copy>(&self, values: &[T]) -> NonNull<[T]> {
        match self.try_push_copy(values) {
            Ok(ptr) => ptr,
            Err(err) => fatal(err),
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Record the current high-water mark
    pub fn snapshot_begin(&self) -> ArenaSnapshot {
        let depth = self.open_scopes.get() + 1;
        self.open_scopes.set(depth);
        ArenaSnapshot {
            arena_id: self.id,
            offset: self.allocated.get(),
            depth,
        }
    }

    /// Reclaim everything pushed since `snapshot` was taken
    ///
    /// Snapshots must end in reverse order of creation, on the arena that
    /// created them. Violations are reported and leave the arena unchanged.
    pub fn snapshot_end(&self, snapshot: ArenaSnapshot) -> MemoryResult<()> {
        if snapshot.arena_id != self.id {
            return Err(MemoryError::foreign_snapshot(&self.name, snapshot.arena_id));
        }
        let open = self.open_scopes.get();
        if snapshot.depth != open {
            return Err(MemoryError::unbalanced_snapshot(&self.name, snapshot.depth, open));
        }
        if snapshot.offset > self.allocated.get() {
            return Err(MemoryError::invalid_state(format!(
                "arena '{}' was popped below snapshot offset {}",
                self.name, snapshot.offset
            )));
        }
        self.allocated.set(snapshot.offset);
        self.open_scopes.set(open - 1);
        trace!(arena = %self.name, offset = snapshot.offset, depth = open, "snapshot end");
        Ok(())
    }

    /// Snapshot that ends itself when dropped
    pub fn scope(&self) -> ArenaScope<'_> {
        ArenaScope::new(self)
    }

    // ------------------------------------------------------------------
    // Commit management
    // ------------------------------------------------------------------

    fn grow(&self, needed: usize) -> MemoryResult<()> {
        let reserved = self.region.len();
        let allocated = self.allocated.get();
        if needed > reserved {
            return Err(MemoryError::arena_exhausted(
                &self.name,
                needed - allocated,
                reserved - allocated,
            ));
        }

        let committed = self.committed.get();
        let target = align_up(needed, self.page_size).min(reserved);
        self.region
            .commit(committed, target - committed)
            .map_err(MemoryError::platform)?;
        self.committed.set(target);
        debug!(arena = %self.name, from = committed, to = target, "arena grown");
        Ok(())
    }

    /// Return committed pages beyond the minimum resident size to the OS
    ///
    /// Keeps the page-aligned allocation plus `min_resident` bytes committed.
    /// Returns the number of bytes released; 0 when no floor is configured.
    pub fn shrink(&self) -> MemoryResult<usize> {
        if self.min_resident == 0 {
            return Ok(0);
        }
        let used = align_up(self.allocated.get(), self.page_size);
        let keep = used.saturating_add(self.min_resident).min(self.region.len());
        let committed = self.committed.get();
        if committed <= keep {
            return Ok(0);
        }

        let released = committed - keep;
        // SAFETY: every page above `keep` lies past the high-water mark, so no
        // live allocation from this arena points into it.
        unsafe { self.region.decommit(keep, released) }.map_err(MemoryError::platform)?;
        self.committed.set(keep);
        debug!(arena = %self.name, released, committed = keep, "arena shrunk");
        Ok(released)
    }

    /// Committed bytes past the page-aligned allocation
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.committed
            .get()
            .saturating_sub(align_up(self.allocated.get(), self.page_size))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Process-unique identity
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name used in diagnostics
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reserved address space in bytes
    #[must_use]
    pub fn reserved(&self) -> usize {
        self.region.len()
    }

    /// Committed bytes
    #[must_use]
    pub fn committed(&self) -> usize {
        self.committed.get()
    }

    /// Bytes handed out (the high-water mark)
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }

    /// Page-rounded floor kept committed by [`shrink`](Self::shrink)
    #[must_use]
    pub fn min_resident(&self) -> usize {
        self.min_resident
    }

    /// Page size used for commit rounding
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Snapshots not yet ended
    #[must_use]
    pub fn open_scopes(&self) -> u32 {
        self.open_scopes.get()
    }

    /// Start of the reserved region
    #[must_use]
    pub fn base(&self) -> NonNull<u8> {
        self.region.base()
    }

    /// Whether `ptr` lies inside the reservation
    #[must_use]
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.region.contains(ptr)
    }

    /// Current usage
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            reserved: self.reserved(),
            committed: self.committed(),
            allocated: self.allocated(),
            remaining: self.remaining_capacity(),
            open_scopes: self.open_scopes(),
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let open = self.open_scopes.get();
        if open != 0 {
            warn!(arena = %self.name, open, "arena dropped with open snapshots");
        }
        trace!(arena = %self.name, "arena released");
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("reserved", &self.reserved())
            .field("committed", &self.committed())
            .field("allocated", &self.allocated())
            .field("open_scopes", &self.open_scopes())
            .finish()
    }
}

// SAFETY: pushes hand out disjoint, committed ranges of the region; memory is
// only reclaimed in bulk through pop, snapshots or reset, which the capability
// contract leaves to the arena's owner.
unsafe impl Allocator for Arena {
    fn allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        match self.try_push(size) {
            Err(err) if err.is_fatal() => fatal(err),
            result => result,
        }
    }

    unsafe fn reallocate(
        &self,
        _ptr: Option<NonNull<u8>>,
        _new_size: usize,
    ) -> MemoryResult<NonNull<u8>> {
        Err(MemoryError::not_supported_with_context(
            "reallocate",
            format!("arena '{}' is append-only", self.name),
        ))
    }

    unsafe fn release(&self, _ptr: Option<NonNull<u8>>) -> MemoryResult<()> {
        // Individual blocks are never freed; snapshots reclaim in bulk
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::AllocatorHandle;
    use crate::core::types::size::{KB, MB};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn small() -> Arena {
        Arena::new(&ArenaConfig::new(MB, 4 * KB).with_name("test"))
    }

    #[test]
    fn test_push_returns_previous_high_water_mark() {
        let arena = small();
        let base = arena.base().as_ptr() as usize;

        let a = arena.push(10);
        assert_eq!(a.as_ptr() as usize, base);
        assert_eq!(arena.allocated(), 64);

        let b = arena.push(100);
        assert_eq!(b.as_ptr() as usize, base + 64);
        assert_eq!(arena.allocated(), 64 + 128);
    }

    #[rstest]
    #[case(1)]
    #[case(63)]
    #[case(64)]
    #[case(65)]
    #[case(4096)]
    #[case(8000)]
    fn test_push_invariants(#[case] size: usize) {
        let arena = small();
        let before = arena.allocated();
        let ptr = arena.push(size);

        let offset = ptr.as_ptr() as usize - arena.base().as_ptr() as usize;
        assert_eq!(offset, before);
        assert_eq!(offset + align_up(size, CACHE_LINE), arena.allocated());
        assert_eq!(ptr.as_ptr() as usize % CACHE_LINE, 0);
        assert!(arena.allocated() <= arena.committed());
        assert!(arena.committed() <= arena.reserved());
    }

    #[test]
    fn test_push_grows_commit_on_demand() {
        let arena = small();
        assert_eq!(arena.committed(), align_up(4 * KB, arena.page_size()));

        let ptr = arena.push(8000);
        assert!(arena.committed() >= 8000);
        assert_eq!(arena.committed() % arena.page_size(), 0);

        // SAFETY: 8000 bytes pushed and committed.
        unsafe { ptr.as_ptr().write_bytes(0xEE, 8000) };
    }

    #[test]
    #[should_panic(expected = "fatal memory error")]
    fn test_push_past_reservation_is_fatal() {
        let arena = small();
        let _ = arena.push(8000);
        let _ = arena.push(MB);
    }

    #[test]
    fn test_try_push_past_reservation_reports() {
        let arena = small();
        let err = arena.try_push(2 * MB).unwrap_err();
        assert_eq!(err.code(), "MEM:ARENA:EXHAUSTED");
        assert!(err.is_fatal());
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn test_push_zero() {
        let arena = small();
        let dirty = arena.push(256);
        // SAFETY: 256 bytes pushed.
        unsafe { dirty.as_ptr().write_bytes(0xFF, 256) };
        arena.pop(256).unwrap();

        let clean = arena.push_zero(256);
        assert_eq!(clean, dirty);
        // SAFETY: 256 bytes pushed and zeroed.
        let bytes = unsafe { core::slice::from_raw_parts(clean.as_ptr(), 256) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pop_underflow_is_reported() {
        let arena = small();
        let _ = arena.push(64);
        let err = arena.pop(128).unwrap_err();
        assert_eq!(err.code(), "MEM:SYSTEM:STATE");
        assert_eq!(arena.allocated(), 64);

        arena.pop(64).unwrap();
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let arena = small();
        let _ = arena.push(100);
        let mark = arena.allocated();

        let snapshot = arena.snapshot_begin();
        assert_eq!(arena.open_scopes(), 1);
        let _ = arena.push(3000);
        let _ = arena.push(5000);

        arena.snapshot_end(snapshot).unwrap();
        assert_eq!(arena.allocated(), mark);
        assert_eq!(arena.open_scopes(), 0);
    }

    #[test]
    fn test_snapshot_out_of_order_is_reported() {
        let arena = small();
        let outer = arena.snapshot_begin();
        let _ = arena.push(64);
        let inner = arena.snapshot_begin();
        let _ = arena.push(64);

        let err = arena.snapshot_end(outer).unwrap_err();
        assert!(matches!(
            err,
            MemoryError::UnbalancedSnapshot {
                snapshot_depth: 1,
                open_depth: 2,
                ..
            }
        ));
        assert_eq!(arena.allocated(), 128);

        arena.snapshot_end(inner).unwrap();
        arena.snapshot_end(outer).unwrap();
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn test_foreign_snapshot_is_reported() {
        let a = small();
        let b = small();
        let snapshot = a.snapshot_begin();

        let err = b.snapshot_end(snapshot).unwrap_err();
        assert_eq!(err.code(), "MEM:SNAPSHOT:FOREIGN");
        a.snapshot_end(snapshot).unwrap();
    }

    #[test]
    fn test_snapshot_after_pop_below_is_reported() {
        let arena = small();
        let _ = arena.push(64);
        let snapshot = arena.snapshot_begin();
        arena.pop(64).unwrap();

        assert!(arena.snapshot_end(snapshot).is_err());
        assert_eq!(arena.open_scopes(), 1);
    }

    #[test]
    fn test_reset() {
        let arena = small();
        let _ = arena.push(512);
        let snapshot = arena.snapshot_begin();
        assert!(arena.reset().is_err());

        arena.snapshot_end(snapshot).unwrap();
        arena.reset().unwrap();
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn test_shrink_keeps_min_resident() {
        let page = page_size();
        let arena = Arena::new(&ArenaConfig::new(MB, page).with_min_resident(page));
        assert_eq!(arena.min_resident(), page);

        let _ = arena.push(16 * page);
        arena.pop(16 * page).unwrap();
        let _ = arena.push(100);
        assert_eq!(arena.committed(), 16 * page);

        let released = arena.shrink().unwrap();
        assert_eq!(arena.committed(), 2 * page);
        assert_eq!(released, 14 * page);
        assert_eq!(arena.remaining_capacity(), page);

        // Growing again after a shrink works
        let ptr = arena.push(4 * page);
        // SAFETY: just pushed.
        unsafe { ptr.as_ptr().write_bytes(1, 4 * page) };
    }

    #[test]
    fn test_shrink_without_floor_is_noop() {
        let arena = small();
        let _ = arena.push(64 * KB);
        arena.pop(64 * KB).unwrap();
        assert_eq!(arena.shrink().unwrap(), 0);
        assert!(arena.committed() >= 64 * KB);
    }

    #[test]
    fn test_remaining_capacity() {
        let page = page_size();
        let arena = Arena::new(&ArenaConfig::new(MB, 4 * page));
        assert_eq!(arena.remaining_capacity(), 4 * page);
        let _ = arena.push(1);
        assert_eq!(arena.remaining_capacity(), 3 * page);
    }

    #[test]
    fn test_typed_pushes() {
        #[derive(Clone, Copy, Debug, PartialEq)]
        struct Particle {
            pos: [f32; 3],
            life: u32,
        }

        let arena = small();
        let particles = arena.push_array_zeroed::<Particle>(16);
        // SAFETY: 16 zeroed particles; all-zero is a valid Particle.
        let slice = unsafe { core::slice::from_raw_parts(particles.as_ptr(), 16) };
        assert!(slice.iter().all(|p| p.life == 0));

        let one = arena.push_struct::<u64>();
        // SAFETY: room for one u64.
        unsafe { one.as_ptr().write(7) };

        let copied = arena.try_push_copy(&[1u32, 2, 3]).unwrap();
        // SAFETY: three u32 copied in.
        assert_eq!(unsafe { copied.as_ref() }, &[1, 2, 3]);

        let empty = arena.try_push_array::<u64>(0).unwrap();
        assert_eq!(empty, NonNull::dangling());
    }

    #[test]
    fn test_over_aligned_type_is_rejected() {
        #[repr(align(128))]
        struct Wide([u8; 128]);

        let arena = small();
        let err = arena.try_push_array::<Wide>(1).unwrap_err();
        assert_eq!(err.code(), "MEM:ALLOC:LAYOUT");
    }

    #[test]
    fn test_zero_size_push_is_reported() {
        let arena = small();
        assert_eq!(arena.try_push(0).unwrap_err().code(), "MEM:ALLOC:SIZE");
    }

    #[test]
    fn test_allocator_adapter() {
        let arena = small();
        let handle = AllocatorHandle::from(&arena);
        assert_eq!(handle.name(), "test");

        let ptr = handle.allocate(128).unwrap();
        assert_eq!(arena.allocated(), 128);

        // SAFETY: `ptr` came from this arena.
        let err = unsafe { handle.reallocate(Some(ptr), 256) }.unwrap_err();
        assert_eq!(err.code(), "MEM:FEATURE:UNSUPPORTED");

        // SAFETY: release is a no-op for arenas.
        unsafe { handle.release(Some(ptr)).unwrap() };
        assert_eq!(arena.allocated(), 128);
    }

    #[test]
    fn test_stats_display() {
        let arena = Arena::new(&ArenaConfig::new(MB, 64 * KB));
        let _ = arena.push(1024);
        let stats = arena.stats();
        assert_eq!(stats.allocated, 1024);
        assert_eq!(stats.to_string(), "1.00 KB allocated / 64.00 KB committed / 1.00 MB reserved");
    }

    #[test]
    fn test_arena_moves_across_threads() {
        let arena = small();
        let _ = arena.push(64);
        let allocated = std::thread::spawn(move || {
            let _ = arena.push(64);
            arena.allocated()
        })
        .join()
        .unwrap();
        assert_eq!(allocated, 128);
    }
}
