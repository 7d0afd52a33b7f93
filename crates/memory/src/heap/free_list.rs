//! Intrusive doubly linked free lists addressed by buffer offset

use super::block::{BlockHeader, Blocks, link, unlink};
use crate::error::MemoryResult;

/// Head, tail and length of one free list
///
/// Nodes live in the block headers themselves; the list only records the
/// ends. Copyable so the allocator can keep it in a `Cell`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct FreeList {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl FreeList {
    pub const EMPTY: Self = Self {
        head: None,
        tail: None,
        len: 0,
    };

    #[inline]
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Link `offset` in front of the current head
    pub fn push_front(&mut self, blocks: &Blocks, offset: usize, size: usize) -> MemoryResult<()> {
        let mut header = BlockHeader::free(size);
        header.next = link(self.head);
        blocks.write(offset, header)?;

        match self.head {
            Some(head) => blocks.set_prev(head, Some(offset))?,
            None => self.tail = Some(offset),
        }
        self.head = Some(offset);
        self.len += 1;
        Ok(())
    }

    /// Unlink and return the head
    pub fn pop_front(&mut self, blocks: &Blocks) -> MemoryResult<Option<usize>> {
        let Some(head) = self.head else {
            return Ok(None);
        };
        self.remove(blocks, head)?;
        Ok(Some(head))
    }

    /// Link `offset` directly after `after`, or at the front when `None`
    pub fn insert_after(
        &mut self,
        blocks: &Blocks,
        after: Option<usize>,
        offset: usize,
        size: usize,
    ) -> MemoryResult<()> {
        let Some(prev) = after else {
            return self.push_front(blocks, offset, size);
        };
        let next = unlink(blocks.read(prev)?.next);

        let mut header = BlockHeader::free(size);
        header.prev = prev;
        header.next = link(next);
        blocks.write(offset, header)?;

        blocks.set_next(prev, Some(offset))?;
        match next {
            Some(next) => blocks.set_prev(next, Some(offset))?,
            None => self.tail = Some(offset),
        }
        self.len += 1;
        Ok(())
    }

    /// Unlink the node at `offset`
    pub fn remove(&mut self, blocks: &Blocks, offset: usize) -> MemoryResult<()> {
        let header = blocks.read(offset)?;
        let (prev, next) = (unlink(header.prev), unlink(header.next));

        match prev {
            Some(prev) => blocks.set_next(prev, next)?,
            None => self.head = next,
        }
        match next {
            Some(next) => blocks.set_prev(next, prev)?,
            None => self.tail = prev,
        }
        blocks.write(offset, BlockHeader::free(header.block_size()))?;
        self.len -= 1;
        Ok(())
    }

    /// Walk the list from the head
    pub fn nodes<'a>(&self, blocks: &'a Blocks) -> Nodes<'a> {
        Nodes {
            blocks,
            next: self.head,
            remaining: self.len,
        }
    }
}

/// Iterator over `(offset, header)` pairs of a free list
///
/// Stops after the recorded length even if the links say otherwise, and
/// stops after the first unreadable node.
pub(super) struct Nodes<'a> {
    blocks: &'a Blocks,
    next: Option<usize>,
    remaining: usize,
}

impl Iterator for Nodes<'_> {
    type Item = MemoryResult<(usize, BlockHeader)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let offset = self.next?;
        match self.blocks.read(offset) {
            Ok(header) => {
                self.remaining -= 1;
                self.next = unlink(header.next);
                Some(Ok((offset, header)))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }
}
