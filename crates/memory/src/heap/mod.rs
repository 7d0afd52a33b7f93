//! General purpose allocator over a fixed buffer
//!
//! Blocks are carved from the top of the buffer downwards. The untouched part
//! below the lowest block is the *bump region*; freed blocks go back to it
//! when they border it, and otherwise onto a free list:
//!
//! - blocks up to 16 MiB are rounded to a power of two and recycled through
//!   one of 16 size-class buckets (512 B .. 16 MiB), without coalescing
//! - larger blocks live on one address-ordered list that is searched first-fit,
//!   split when the leftover is large, and coalesced with both neighbours on
//!   free
//!
//! Every block starts with a small header holding its size and free-list
//! links. Pointers passed back in are checked against the buffer and the
//! header before anything is trusted, so foreign pointers, double frees and
//! trampled headers are reported instead of corrupting the lists.
//!
//! ```
//! use strata_memory::heap::GeneralPurposeAllocator;
//!
//! let mut buffer = vec![0u8; 1 << 20];
//! let heap = GeneralPurposeAllocator::new(&mut buffer);
//!
//! let ptr = heap.alloc(1000).unwrap();
//! unsafe { heap.free(Some(ptr)).unwrap() };
//! assert_eq!(heap.free_memory(), 1 << 20);
//! ```

mod block;
mod free_list;

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use strata_log::{debug, trace};
use strata_system::utils::{checked_align_up, format_bytes_usize};

use self::block::{BlockHeader, Blocks, HEADER};
use self::free_list::FreeList;
use crate::allocator::Allocator;
use crate::arena::Arena;
use crate::core::types::heap::{BUCKET_COUNT, LARGEST_BUCKET_CLASS, MIN_BLOCK_SIZE, SPLIT_THRESHOLD};
use crate::error::{MemoryError, MemoryResult};

/// Bytes of bookkeeping in front of every payload
pub const BLOCK_HEADER_SIZE: usize = HEADER;

/// Size-classed free-list allocator over a borrowed buffer
///
/// Not `Sync`: one thread at a time, or wrap it in a lock.
pub struct GeneralPurposeAllocator<'buf> {
    blocks: Blocks,
    /// Offset of the lowest carved byte; `[0, bump)` is untouched
    bump: Cell<usize>,
    large: Cell<FreeList>,
    buckets: [Cell<FreeList>; BUCKET_COUNT],
    in_use: Cell<usize>,
    _buffer: PhantomData<&'buf mut [u8]>,
}

// SAFETY: the allocator has exclusive access to its buffer for 'buf; moving it
// to another thread moves that access with it.
unsafe impl Send for GeneralPurposeAllocator<'_> {}

/// Usage breakdown of a [`GeneralPurposeAllocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpaStats {
    /// Buffer size
    pub capacity: usize,
    /// Bytes in live blocks, headers included
    pub in_use: usize,
    /// Bytes in the bump region and on every free list
    pub free: usize,
    /// Untouched bytes below the lowest block
    pub bump_remaining: usize,
    /// Nodes on the large list
    pub large_blocks: usize,
    /// Nodes across all buckets
    pub bucket_blocks: usize,
    /// Largest single free extent
    pub largest_free_block: usize,
}

impl GpaStats {
    /// Share of free memory not in the largest free extent, 0.0 to 1.0
    #[must_use]
    pub fn fragmentation_ratio(&self) -> f64 {
        if self.free == 0 {
            return 0.0;
        }
        1.0 - self.largest_free_block as f64 / self.free as f64
    }
}

impl fmt::Display for GpaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in use / {} free of {} ({} large, {} bucketed)",
            format_bytes_usize(self.in_use),
            format_bytes_usize(self.free),
            format_bytes_usize(self.capacity),
            self.large_blocks,
            self.bucket_blocks
        )
    }
}

/// Index of the bucket holding power-of-two `class`
#[inline]
fn bucket_index(class: usize) -> usize {
    (class / MIN_BLOCK_SIZE).trailing_zeros() as usize
}

/// Run `f` on a copy of the list in `cell` and store it back
fn edit<R>(
    cell: &Cell<FreeList>,
    f: impl FnOnce(&mut FreeList) -> MemoryResult<R>,
) -> MemoryResult<R> {
    let mut list = cell.get();
    let result = f(&mut list);
    cell.set(list);
    result
}

impl<'buf> GeneralPurposeAllocator<'buf> {
    /// Manage `buffer`; the whole buffer starts out as bump region
    pub fn new(buffer: &'buf mut [u8]) -> Self {
        let size = buffer.len();
        let base = NonNull::from(buffer).cast::<u8>();
        // SAFETY: the borrow gives us exclusive access to `size` bytes for 'buf.
        unsafe { Self::from_raw_parts(base, size) }
    }

    /// Manage `size` bytes at `base`
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `size` bytes for `'buf`,
    /// and nothing else may access that memory except through pointers this
    /// allocator hands out.
    pub unsafe fn from_raw_parts(base: NonNull<u8>, size: usize) -> Self {
        debug!(capacity = size, "general purpose allocator created");
        Self {
            // SAFETY: forwarded caller contract.
            blocks: unsafe { Blocks::new(base, size) },
            bump: Cell::new(size),
            large: Cell::new(FreeList::EMPTY),
            buckets: [const { Cell::new(FreeList::EMPTY) }; BUCKET_COUNT],
            in_use: Cell::new(0),
            _buffer: PhantomData,
        }
    }

    /// Push `size` bytes onto `arena` and manage them
    ///
    /// # Safety
    ///
    /// The arena must not pop, reset or end a snapshot below the pushed range
    /// while the allocator is alive.
    pub unsafe fn from_arena(arena: &'buf Arena, size: usize) -> MemoryResult<Self> {
        let base = arena.try_push(size)?;
        // SAFETY: the pushed range is committed and owned by us until the
        // arena reclaims it, which the caller rules out.
        Ok(unsafe { Self::from_raw_parts(base, size) })
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Allocate at least `size` bytes
    ///
    /// Running out of space is reported as [`MemoryError::OutOfMemory`] and
    /// leaves the allocator unchanged.
    pub fn alloc(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        if size == 0 {
            return Err(MemoryError::invalid_size(0, "allocation size must be non-zero"));
        }
        let needed = size
            .checked_add(HEADER)
            .and_then(|total| checked_align_up(total, MIN_BLOCK_SIZE))
            .ok_or_else(|| MemoryError::size_overflow(format!("heap allocation of {size} bytes")))?;

        let (offset, block_size) = if needed > LARGEST_BUCKET_CLASS {
            match self.take_large(needed)? {
                Some(found) => found,
                None => (self.carve(size, needed)?, needed),
            }
        } else {
            let class = needed.next_power_of_two();
            let reused = edit(&self.buckets[bucket_index(class)], |list| {
                list.pop_front(&self.blocks)
            })?;
            match reused {
                Some(offset) => (offset, class),
                None => (self.carve(size, class)?, class),
            }
        };

        self.blocks.write(offset, BlockHeader::allocated(block_size))?;
        self.in_use.set(self.in_use.get() + block_size);
        trace!(size, block_size, offset, "heap alloc");
        Ok(self.blocks.payload(offset))
    }

    /// First-fit search of the large list
    fn take_large(&self, needed: usize) -> MemoryResult<Option<(usize, usize)>> {
        edit(&self.large, |list| {
            let mut found = None;
            for node in list.nodes(&self.blocks) {
                let (offset, header) = node?;
                if header.block_size() >= needed {
                    found = Some((offset, header.block_size()));
                    break;
                }
            }
            let Some((offset, size)) = found else {
                return Ok(None);
            };

            let excess = size - needed;
            if excess > SPLIT_THRESHOLD {
                // Hand out the tail; the head keeps its place in the list
                self.blocks.set_size(offset, excess)?;
                trace!(offset, size, needed, "large block split");
                Ok(Some((offset + excess, needed)))
            } else {
                list.remove(&self.blocks, offset)?;
                Ok(Some((offset, size)))
            }
        })
    }

    /// Take `block_size` bytes off the top of the bump region
    fn carve(&self, requested: usize, block_size: usize) -> MemoryResult<usize> {
        let bump = self.bump.get();
        if block_size > bump {
            return Err(MemoryError::out_of_memory(requested, self.free_memory()));
        }
        self.bump.set(bump - block_size);
        Ok(bump - block_size)
    }

    // ------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------

    /// Validate a payload pointer and return its block offset and size
    fn block_of(&self, ptr: NonNull<u8>) -> MemoryResult<(usize, usize)> {
        let address = ptr.as_ptr() as usize;
        let capacity = self.blocks.len();
        let offset = self
            .blocks
            .offset_of(ptr)
            .filter(|&offset| offset >= self.bump.get() && offset < capacity)
            .ok_or_else(|| {
                MemoryError::invalid_pointer(address, "not inside the allocated part of the heap")
            })?;

        let header = self.blocks.read(offset)?;
        let size = header.block_size();
        let well_formed = size >= MIN_BLOCK_SIZE
            && size % MIN_BLOCK_SIZE == 0
            && size <= capacity - offset
            && (size > LARGEST_BUCKET_CLASS || size.is_power_of_two());
        if !well_formed {
            return Err(MemoryError::corruption(
                "heap",
                format!("block at {offset:#x} has invalid size {}", header.size),
            ));
        }
        if !header.is_allocated() {
            return Err(MemoryError::double_free(address));
        }
        Ok((offset, size))
    }

    /// Return a block to the allocator
    ///
    /// `None` is a no-op. Pointers that did not come from this allocator, or
    /// that were already freed, are reported and leave it unchanged.
    ///
    /// # Safety
    ///
    /// `ptr` must not be used after this call succeeds.
    pub unsafe fn free(&self, ptr: Option<NonNull<u8>>) -> MemoryResult<()> {
        let Some(ptr) = ptr else {
            return Ok(());
        };
        let (offset, size) = self.block_of(ptr)?;
        self.in_use.set(self.in_use.get() - size);
        trace!(offset, size, "heap free");
        self.release_block(offset, size)
    }

    fn release_block(&self, offset: usize, size: usize) -> MemoryResult<()> {
        if offset == self.bump.get() {
            self.blocks.write(offset, BlockHeader::free(size))?;
            self.bump.set(offset + size);
            return self.absorb_large();
        }
        if size <= LARGEST_BUCKET_CLASS {
            return edit(&self.buckets[bucket_index(size)], |list| {
                list.push_front(&self.blocks, offset, size)
            });
        }
        self.insert_large(offset, size)
    }

    /// Address-ordered insert with coalescing on both sides
    fn insert_large(&self, offset: usize, size: usize) -> MemoryResult<()> {
        let list = self.large.get();
        let mut prev: Option<(usize, usize)> = None;
        let mut next: Option<(usize, usize)> = None;

        match list.tail() {
            Some(tail) if tail < offset => {
                prev = Some((tail, self.blocks.read(tail)?.block_size()));
            }
            _ => {
                for node in list.nodes(&self.blocks) {
                    let (node_offset, header) = node?;
                    if node_offset < offset {
                        prev = Some((node_offset, header.block_size()));
                    } else {
                        next = Some((node_offset, header.block_size()));
                        break;
                    }
                }
            }
        }

        if let Some((prev_offset, prev_size)) = prev
            && prev_offset + prev_size > offset
        {
            return Err(MemoryError::corruption(
                "heap",
                format!("block at {offset:#x} overlaps free block at {prev_offset:#x}"),
            ));
        }
        if let Some((next_offset, _)) = next
            && offset + size > next_offset
        {
            return Err(MemoryError::corruption(
                "heap",
                format!("block at {offset:#x} overlaps free block at {next_offset:#x}"),
            ));
        }

        edit(&self.large, |list| {
            let (node, node_size) = match prev {
                Some((prev_offset, prev_size)) if prev_offset + prev_size == offset => {
                    self.blocks.set_size(prev_offset, prev_size + size)?;
                    self.blocks.write(offset, BlockHeader::free(size))?;
                    (prev_offset, prev_size + size)
                }
                _ => {
                    list.insert_after(&self.blocks, prev.map(|(p, _)| p), offset, size)?;
                    (offset, size)
                }
            };
            if let Some((next_offset, next_size)) = next
                && node + node_size == next_offset
            {
                list.remove(&self.blocks, next_offset)?;
                self.blocks.set_size(node, node_size + next_size)?;
            }
            Ok(())
        })?;

        self.absorb_large()
    }

    /// Fold large-list nodes that border the bump region back into it
    fn absorb_large(&self) -> MemoryResult<()> {
        edit(&self.large, |list| {
            while let Some(head) = list.head() {
                if head != self.bump.get() {
                    break;
                }
                let size = self.blocks.read(head)?.block_size();
                list.remove(&self.blocks, head)?;
                self.bump.set(head + size);
                trace!(offset = head, size, "large block absorbed into bump region");
            }
            Ok(())
        })
    }

    /// Resize an allocation
    ///
    /// `None` behaves as [`alloc`](Self::alloc). A size that still fits the
    /// block returns `ptr` unchanged; otherwise the contents move to a new
    /// block and the old one is freed. On error `ptr` stays valid.
    ///
    /// # Safety
    ///
    /// When a different pointer is returned, `ptr` must not be used again.
    pub unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
    ) -> MemoryResult<NonNull<u8>> {
        let Some(ptr) = ptr else {
            return self.alloc(new_size);
        };
        let (offset, size) = self.block_of(ptr)?;
        if new_size == 0 {
            return Err(MemoryError::invalid_size(0, "reallocation size must be non-zero"));
        }
        let usable = size - HEADER;
        if new_size <= usable {
            return Ok(ptr);
        }

        let moved = self.alloc(new_size)?;
        // SAFETY: both blocks are live, distinct and at least `usable` bytes.
        unsafe { moved.as_ptr().copy_from_nonoverlapping(ptr.as_ptr(), usable) };
        self.in_use.set(self.in_use.get() - size);
        self.release_block(offset, size)?;
        trace!(from = offset, size, new_size, "heap realloc moved");
        Ok(moved)
    }

    /// Forget every block at once
    ///
    /// Every outstanding pointer becomes invalid; freeing one afterwards is
    /// reported.
    pub fn clear_all(&self) {
        self.large.set(FreeList::EMPTY);
        for bucket in &self.buckets {
            bucket.set(FreeList::EMPTY);
        }
        self.bump.set(self.blocks.len());
        self.in_use.set(0);
        debug!(capacity = self.blocks.len(), "heap cleared");
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Payload bytes available behind a live pointer
    pub fn usable_size(&self, ptr: NonNull<u8>) -> MemoryResult<usize> {
        let (_, size) = self.block_of(ptr)?;
        Ok(size - HEADER)
    }

    /// Buffer size
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.blocks.len()
    }

    /// Bytes in live blocks, headers included
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    /// Untouched bytes in the bump region
    #[must_use]
    pub fn bump_remaining(&self) -> usize {
        self.bump.get()
    }

    /// Bump region plus every free-list node
    ///
    /// Walks the large list; meant for diagnostics.
    #[must_use]
    pub fn free_memory(&self) -> usize {
        let large: usize = self
            .large
            .get()
            .nodes(&self.blocks)
            .map_while(Result::ok)
            .map(|(_, header)| header.block_size())
            .sum();
        let bucketed: usize = self
            .buckets
            .iter()
            .enumerate()
            .map(|(index, bucket)| bucket.get().len() * (MIN_BLOCK_SIZE << index))
            .sum();
        self.bump.get() + large + bucketed
    }

    /// Usage breakdown
    #[must_use]
    pub fn stats(&self) -> GpaStats {
        let large = self.large.get();
        let largest_large = large
            .nodes(&self.blocks)
            .map_while(Result::ok)
            .map(|(_, header)| header.block_size())
            .max()
            .unwrap_or(0);
        let largest_bucket = self
            .buckets
            .iter()
            .rposition(|bucket| !bucket.get().is_empty())
            .map_or(0, |index| MIN_BLOCK_SIZE << index);

        GpaStats {
            capacity: self.capacity(),
            in_use: self.in_use(),
            free: self.free_memory(),
            bump_remaining: self.bump.get(),
            large_blocks: large.len(),
            bucket_blocks: self.buckets.iter().map(|b| b.get().len()).sum(),
            largest_free_block: self.bump.get().max(largest_large).max(largest_bucket),
        }
    }

    /// See [`GpaStats::fragmentation_ratio`]
    #[must_use]
    pub fn fragmentation_ratio(&self) -> f64 {
        self.stats().fragmentation_ratio()
    }

    /// Whether `ptr` points into the managed buffer
    #[must_use]
    pub fn contains(&self, ptr: *const u8) -> bool {
        let base = self.blocks.base().as_ptr() as usize;
        (ptr as usize).wrapping_sub(base) < self.blocks.len()
    }
}

impl fmt::Debug for GeneralPurposeAllocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralPurposeAllocator")
            .field("capacity", &self.capacity())
            .field("in_use", &self.in_use())
            .field("bump_remaining", &self.bump.get())
            .finish_non_exhaustive()
    }
}

// SAFETY: blocks handed out are disjoint ranges of the buffer and stay valid
// until freed, reallocated away or cleared.
unsafe impl Allocator for GeneralPurposeAllocator<'_> {
    fn allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        self.alloc(size)
    }

    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
    ) -> MemoryResult<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.realloc(ptr, new_size) }
    }

    unsafe fn release(&self, ptr: Option<NonNull<u8>>) -> MemoryResult<()> {
        // SAFETY: forwarded caller contract.
        unsafe { self.free(ptr) }
    }

    fn name(&self) -> &str {
        "heap"
    }
}
