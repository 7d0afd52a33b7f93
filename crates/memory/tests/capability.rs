//! A container written once against the allocator capability and backed by
//! each concrete allocator in turn

use std::ptr::NonNull;

use pretty_assertions::assert_eq;
use rstest::rstest;
use strata_memory::MemoryResult;
use strata_memory::allocator::{AllocatorHandle, SystemAllocator};
use strata_memory::arena::Arena;
use strata_memory::core::types::size::{KB, MB};
use strata_memory::heap::GeneralPurposeAllocator;

/// Growable list of `u64` that only knows about an [`AllocatorHandle`]
struct List<'a> {
    allocator: AllocatorHandle<'a>,
    data: Option<NonNull<u64>>,
    len: usize,
    capacity: usize,
}

impl<'a> List<'a> {
    fn new(allocator: AllocatorHandle<'a>) -> Self {
        Self {
            allocator,
            data: None,
            len: 0,
            capacity: 0,
        }
    }

    fn push(&mut self, value: u64) -> MemoryResult<()> {
        if self.len == self.capacity {
            let capacity = (self.capacity * 2).max(4);
            let bytes = capacity * size_of::<u64>();
            let grown = match self.data {
                // SAFETY: `data` came from this allocator and is live.
                Some(data) => unsafe { self.allocator.reallocate(Some(data.cast()), bytes) },
                None => self.allocator.allocate(bytes),
            };
            let grown = match grown {
                Ok(ptr) => ptr,
                // Append-only allocators cannot resize: allocate and copy
                Err(_) if self.data.is_some() => {
                    let fresh = self.allocator.allocate(bytes)?;
                    if let Some(data) = self.data {
                        // SAFETY: both ranges are live and distinct.
                        unsafe {
                            fresh
                                .cast::<u64>()
                                .as_ptr()
                                .copy_from_nonoverlapping(data.as_ptr(), self.len);
                            self.allocator.release(Some(data.cast()))?;
                        }
                    }
                    fresh
                }
                Err(err) => return Err(err),
            };
            self.data = Some(grown.cast());
            self.capacity = capacity;
        }
        if let Some(data) = self.data {
            // SAFETY: `len < capacity` slots are allocated.
            unsafe { data.as_ptr().add(self.len).write(value) };
        }
        self.len += 1;
        Ok(())
    }

    fn as_slice(&self) -> &[u64] {
        match self.data {
            // SAFETY: the first `len` slots are initialized.
            Some(data) => unsafe { std::slice::from_raw_parts(data.as_ptr(), self.len) },
            None => &[],
        }
    }
}

impl Drop for List<'_> {
    fn drop(&mut self) {
        // SAFETY: `data` came from this allocator and is released once.
        let _ = unsafe { self.allocator.release(self.data.map(NonNull::cast)) };
    }
}

fn fill(handle: AllocatorHandle<'_>) -> Vec<u64> {
    let mut list = List::new(handle);
    for i in 0..1000 {
        list.push(i * 3).unwrap();
    }
    list.as_slice().to_vec()
}

#[rstest]
#[case::system("system")]
#[case::arena("arena")]
#[case::heap("heap")]
fn same_container_on_every_allocator(#[case] backend: &str) {
    let expected: Vec<u64> = (0..1000).map(|i| i * 3).collect();

    match backend {
        "system" => {
            let system = SystemAllocator::new();
            assert_eq!(fill(AllocatorHandle::from(&system)), expected);
            assert_eq!(system.live_allocations(), 0);
        }
        "arena" => {
            let arena = Arena::with_capacity(MB, 4 * KB);
            let handle = AllocatorHandle::from(&arena);
            assert_eq!(handle.name(), arena.name());
            assert_eq!(fill(handle), expected);
            assert!(arena.allocated() > 1000 * size_of::<u64>());
        }
        "heap" => {
            let mut buffer = vec![0u8; MB];
            let heap = GeneralPurposeAllocator::new(&mut buffer);
            assert_eq!(fill(AllocatorHandle::from(&heap)), expected);
            assert_eq!(heap.in_use(), 0);
            assert_eq!(heap.free_memory(), MB);
        }
        other => unreachable!("unknown backend {other}"),
    }
}

#[test]
fn arena_reallocate_is_reported() {
    let arena = Arena::with_capacity(MB, 4 * KB);
    let handle = AllocatorHandle::from(&arena);
    let ptr = handle.allocate(64).unwrap();

    // SAFETY: `ptr` came from the arena.
    let err = unsafe { handle.reallocate(Some(ptr), 128) }.unwrap_err();
    assert_eq!(err.code(), "MEM:FEATURE:UNSUPPORTED");
    assert_eq!(arena.allocated(), 64);
}

#[test]
fn heap_exhaustion_is_recoverable_through_the_handle() {
    let mut buffer = vec![0u8; 8 * KB];
    let heap = GeneralPurposeAllocator::new(&mut buffer);
    let handle = AllocatorHandle::from(&heap);

    let err = handle.allocate(16 * KB).unwrap_err();
    assert!(err.is_retryable());
    assert!(!err.is_fatal());
}
