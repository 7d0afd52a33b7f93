//! Misuse that must be reported instead of corrupting allocator state

use pretty_assertions::assert_eq;
use strata_memory::MemoryError;
use strata_memory::arena::Arena;
use strata_memory::core::types::size::{KB, MB};
use strata_memory::heap::GeneralPurposeAllocator;

#[test]
fn snapshot_from_another_arena_is_rejected() {
    strata_log::init_test();
    let a = Arena::with_capacity(MB, 4 * KB);
    let b = Arena::with_capacity(MB, 4 * KB);

    let _ = b.push(256);
    let snapshot = a.snapshot_begin();
    let err = b.snapshot_end(snapshot).unwrap_err();

    assert!(matches!(err, MemoryError::ForeignSnapshot { owner, .. } if owner == a.id()));
    assert_eq!(b.allocated(), 256);
    a.snapshot_end(snapshot).unwrap();
}

#[test]
fn out_of_order_snapshot_leaves_arena_unchanged() {
    let arena = Arena::with_capacity(MB, 4 * KB);
    let outer = arena.snapshot_begin();
    let _ = arena.push(100);
    let inner = arena.snapshot_begin();
    let _ = arena.push(100);

    assert!(arena.snapshot_end(outer).is_err());
    assert_eq!(arena.allocated(), 256);
    assert_eq!(arena.open_scopes(), 2);

    arena.snapshot_end(inner).unwrap();
    arena.snapshot_end(outer).unwrap();
    assert_eq!(arena.allocated(), 0);
}

#[test]
fn over_pop_is_rejected() {
    let arena = Arena::with_capacity(MB, 4 * KB);
    let _ = arena.push(64);
    assert!(arena.pop(65).is_err());
    assert_eq!(arena.allocated(), 64);
}

#[test]
fn heap_rejects_pointers_it_does_not_own() {
    let mut mine = vec![0u8; 64 * KB];
    let mut theirs = vec![0u8; 64 * KB];
    let heap = GeneralPurposeAllocator::new(&mut mine);
    let other = GeneralPurposeAllocator::new(&mut theirs);

    let _ = heap.alloc(100).unwrap();
    let foreign = other.alloc(100).unwrap();

    // SAFETY: rejected before anything is written.
    let err = unsafe { heap.free(Some(foreign)) }.unwrap_err();
    assert_eq!(err.code(), "MEM:PTR:INVALID");
    assert_eq!(heap.in_use(), 512);
    assert_eq!(other.in_use(), 512);
}

#[test]
fn heap_double_free_is_rejected_for_every_path() {
    let mut buffer = vec![0u8; 64 * MB];
    let heap = GeneralPurposeAllocator::new(&mut buffer);

    let small = heap.alloc(100).unwrap();
    let large = heap.alloc(20 * MB).unwrap();
    let _guard = heap.alloc(1).unwrap();

    // SAFETY: each pointer is live for its first free only.
    unsafe {
        heap.free(Some(small)).unwrap();
        heap.free(Some(large)).unwrap();

        assert!(matches!(heap.free(Some(small)), Err(MemoryError::DoubleFree { .. })));
        assert!(matches!(heap.free(Some(large)), Err(MemoryError::DoubleFree { .. })));
        assert!(heap.realloc(Some(small), 10).is_err());
    }
    assert_eq!(heap.in_use() + heap.free_memory(), heap.capacity());
}

#[test]
fn freed_block_absorbed_by_bump_is_no_longer_owned() {
    let mut buffer = vec![0u8; 64 * KB];
    let heap = GeneralPurposeAllocator::new(&mut buffer);

    let ptr = heap.alloc(100).unwrap();
    // SAFETY: live for the first free only.
    unsafe {
        heap.free(Some(ptr)).unwrap();
        let err = heap.free(Some(ptr)).unwrap_err();
        assert_eq!(err.code(), "MEM:PTR:INVALID");
    }
}
