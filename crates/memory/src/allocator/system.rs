//! Global-heap allocator behind the capability interface

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use strata_log::trace;

use super::Allocator;
use crate::core::types::alignment::HEAP_ALIGN;
use crate::error::{MemoryError, MemoryResult};

/// Bytes in front of every payload: total size, then a liveness tag
const PREFIX: usize = HEAP_ALIGN;
const LIVE_TAG: usize = 0x5354_5241;

/// Allocator that forwards to the Rust global allocator
///
/// Payloads are 16-byte aligned. A small prefix records each allocation's
/// size so `reallocate` and `release` work from the pointer alone.
#[derive(Debug, Default)]
pub struct SystemAllocator {
    live: AtomicUsize,
    live_bytes: AtomicUsize,
}

impl SystemAllocator {
    /// Create a new system allocator
    #[must_use]
    pub const fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
        }
    }

    /// Allocations not yet released
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Payload bytes not yet released
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }

    fn layout_for(size: usize) -> MemoryResult<Layout> {
        let total = size
            .checked_add(PREFIX)
            .ok_or_else(|| MemoryError::size_overflow("system allocation prefix"))?;
        Layout::from_size_align(total, HEAP_ALIGN)
            .map_err(|e| MemoryError::invalid_layout(format!("{size} bytes: {e}")))
    }

    /// Locate and check the prefix of a payload pointer
    ///
    /// # Safety
    ///
    /// `ptr` must have come from this allocator and still be live.
    unsafe fn prefix_of(ptr: NonNull<u8>) -> MemoryResult<(NonNull<u8>, usize)> {
        let address = ptr.as_ptr() as usize;
        if address % HEAP_ALIGN != 0 || address < PREFIX {
            return Err(MemoryError::invalid_pointer(
                address,
                "not a system allocator payload",
            ));
        }
        // SAFETY: the caller guarantees `ptr` is a live payload, so the prefix
        // directly in front of it belongs to the same allocation.
        let (base, size, tag) = unsafe {
            let base = ptr.as_ptr().sub(PREFIX);
            let words = base.cast::<usize>();
            (base, words.read(), words.add(1).read())
        };
        if tag != LIVE_TAG {
            return Err(MemoryError::invalid_pointer(address, "allocation tag missing"));
        }
        // SAFETY: `base` is `ptr - PREFIX` inside the same allocation.
        Ok((unsafe { NonNull::new_unchecked(base) }, size))
    }

    /// Write the prefix and return the payload pointer
    ///
    /// # Safety
    ///
    /// `base` must point to at least `PREFIX + size` writable bytes.
    unsafe fn stamp(base: NonNull<u8>, size: usize) -> NonNull<u8> {
        // SAFETY: guaranteed by the caller; `base` is HEAP_ALIGN aligned.
        unsafe {
            let words = base.as_ptr().cast::<usize>();
            words.write(size);
            words.add(1).write(LIVE_TAG);
            NonNull::new_unchecked(base.as_ptr().add(PREFIX))
        }
    }
}

// SAFETY: every payload comes from the global allocator with a layout covering
// the prefix and the requested size; payloads never overlap.
unsafe impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        if size == 0 {
            return Err(MemoryError::invalid_size(size, "allocation size must be non-zero"));
        }
        let layout = Self::layout_for(size)?;
        // SAFETY: layout has non-zero size.
        let base = NonNull::new(unsafe { alloc::alloc(layout) })
            .ok_or_else(|| MemoryError::out_of_memory(size, 0))?;

        self.live.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_add(size, Ordering::Relaxed);
        trace!(size, "system allocate");
        // SAFETY: `base` covers PREFIX + size bytes.
        Ok(unsafe { Self::stamp(base, size) })
    }

    unsafe fn reallocate(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
    ) -> MemoryResult<NonNull<u8>> {
        let Some(ptr) = ptr else {
            return self.allocate(new_size);
        };
        if new_size == 0 {
            return Err(MemoryError::invalid_size(new_size, "reallocation size must be non-zero"));
        }
        // SAFETY: caller guarantees `ptr` is live and ours.
        let (base, old_size) = unsafe { Self::prefix_of(ptr)? };
        let old_layout = Self::layout_for(old_size)?;
        let new_layout = Self::layout_for(new_size)?;

        // SAFETY: `base` was allocated with `old_layout`; the new size is
        // non-zero and was validated by `layout_for`.
        let new_base = NonNull::new(unsafe { alloc::realloc(base.as_ptr(), old_layout, new_layout.size()) })
            .ok_or_else(|| MemoryError::out_of_memory(new_size, 0))?;

        self.live_bytes.fetch_sub(old_size, Ordering::Relaxed);
        self.live_bytes.fetch_add(new_size, Ordering::Relaxed);
        trace!(old_size, new_size, "system reallocate");
        // SAFETY: `new_base` covers PREFIX + new_size bytes.
        Ok(unsafe { Self::stamp(new_base, new_size) })
    }

    unsafe fn release(&self, ptr: Option<NonNull<u8>>) -> MemoryResult<()> {
        let Some(ptr) = ptr else {
            return Ok(());
        };
        // SAFETY: caller guarantees `ptr` is live and ours.
        let (base, size) = unsafe { Self::prefix_of(ptr)? };
        let layout = Self::layout_for(size)?;
        // SAFETY: clear the tag so a stale copy of the prefix is not mistaken
        // for a live allocation, then return the block with its original layout.
        unsafe {
            base.as_ptr().cast::<usize>().add(1).write(0);
            alloc::dealloc(base.as_ptr(), layout);
        }

        self.live.fetch_sub(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(size, Ordering::Relaxed);
        trace!(size, "system release");
        Ok(())
    }

    fn name(&self) -> &str {
        "system"
    }
}
