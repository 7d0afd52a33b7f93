//! Block headers and bounds-checked access to the backing buffer

use core::mem::size_of;
use core::ptr::NonNull;

use crate::error::{MemoryError, MemoryResult};

/// Link value meaning "no neighbour"
pub(super) const NIL: usize = usize::MAX;

/// Link value stamped into both links of an allocated block
///
/// Never a valid offset, so a freed block (whose links point at list
/// neighbours or `NIL`) can be told apart from a live one.
pub(super) const ALLOCATED: usize = usize::MAX - 1;

/// Header stored in front of every block
///
/// `size` covers the header itself. While the block is free, `next` and
/// `prev` link it into a free list by buffer offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct BlockHeader {
    pub size: u64,
    pub next: usize,
    pub prev: usize,
}

/// Bytes between a block's start and its payload
pub(super) const HEADER: usize = size_of::<BlockHeader>();

impl BlockHeader {
    pub fn allocated(size: usize) -> Self {
        Self {
            size: size as u64,
            next: ALLOCATED,
            prev: ALLOCATED,
        }
    }

    pub fn free(size: usize) -> Self {
        Self {
            size: size as u64,
            next: NIL,
            prev: NIL,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.next == ALLOCATED && self.prev == ALLOCATED
    }

    pub fn block_size(&self) -> usize {
        // Headers are only written with usize sizes; anything larger is
        // clamped so the bounds check that follows rejects it.
        usize::try_from(self.size).unwrap_or(usize::MAX)
    }
}

#[inline]
pub(super) fn link(offset: Option<usize>) -> usize {
    offset.unwrap_or(NIL)
}

#[inline]
pub(super) fn unlink(value: usize) -> Option<usize> {
    (value != NIL).then_some(value)
}

/// The buffer a general purpose allocator carves blocks from
///
/// Every header access goes through [`read`](Self::read) and
/// [`write`](Self::write), which check that the whole header lies inside the
/// buffer before touching memory.
#[derive(Debug)]
pub(super) struct Blocks {
    base: NonNull<u8>,
    size: usize,
}

impl Blocks {
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `size` bytes for as long
    /// as the returned value is used.
    pub unsafe fn new(base: NonNull<u8>, size: usize) -> Self {
        Self { base, size }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    fn check(&self, offset: usize) -> MemoryResult<()> {
        match offset.checked_add(HEADER) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(MemoryError::corruption(
                "heap",
                format!("block offset {offset:#x} outside {}-byte buffer", self.size),
            )),
        }
    }

    pub fn read(&self, offset: usize) -> MemoryResult<BlockHeader> {
        self.check(offset)?;
        // SAFETY: `check` proved the header lies inside the buffer; headers
        // carry no alignment guarantee so the read is unaligned.
        Ok(unsafe {
            self.base
                .as_ptr()
                .add(offset)
                .cast::<BlockHeader>()
                .read_unaligned()
        })
    }

    pub fn write(&self, offset: usize, header: BlockHeader) -> MemoryResult<()> {
        self.check(offset)?;
        // SAFETY: as in `read`.
        unsafe {
            self.base
                .as_ptr()
                .add(offset)
                .cast::<BlockHeader>()
                .write_unaligned(header);
        }
        Ok(())
    }

    pub fn set_next(&self, offset: usize, next: Option<usize>) -> MemoryResult<()> {
        let mut header = self.read(offset)?;
        header.next = link(next);
        self.write(offset, header)
    }

    pub fn set_prev(&self, offset: usize, prev: Option<usize>) -> MemoryResult<()> {
        let mut header = self.read(offset)?;
        header.prev = link(prev);
        self.write(offset, header)
    }

    /// Change a block's size, keeping its links
    pub fn set_size(&self, offset: usize, size: usize) -> MemoryResult<()> {
        let mut header = self.read(offset)?;
        header.size = size as u64;
        self.write(offset, header)
    }

    /// Payload pointer of the block at `offset`
    pub fn payload(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset + HEADER <= self.size);
        // SAFETY: callers pass offsets of blocks inside the buffer, so the
        // payload address is in bounds and non-null.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset + HEADER)) }
    }

    /// Block offset of a payload pointer, if the pointer is inside the buffer
    pub fn offset_of(&self, payload: NonNull<u8>) -> Option<usize> {
        (payload.as_ptr() as usize)
            .checked_sub(self.base.as_ptr() as usize)?
            .checked_sub(HEADER)
    }
}
