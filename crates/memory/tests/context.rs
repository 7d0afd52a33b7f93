//! Integration tests for the memory context and its arena registry

use pretty_assertions::assert_eq;
use strata_memory::arena::ArenaConfig;
use strata_memory::core::types::size::{GB, KB, MB};
use strata_memory::{MemoryConfig, MemoryContext};

#[test]
fn default_context_reserves_a_gigabyte_per_arena() {
    strata_log::init_test();
    let memory = MemoryContext::with_defaults().unwrap();

    for arena in [memory.app(), memory.session(), memory.frame()] {
        assert_eq!(arena.reserved(), GB);
        assert!(arena.committed() >= MB);
    }
    assert_eq!(memory.app().name(), "app");
    assert_eq!(memory.frame().name(), "frame");
}

#[test]
fn frame_loop_reclaims_every_iteration() {
    let memory = MemoryContext::new(MemoryConfig::low_memory()).unwrap();
    let persistent = memory.app().push_copy(b"strata");

    for frame in 1..=10u64 {
        assert_eq!(memory.begin_frame().unwrap(), frame);
        let _ = memory.frame().push_array_zeroed::<u32>(frame as usize * 1000);
        memory.end_frame().unwrap();
        assert_eq!(memory.frame().allocated(), 0);
    }

    assert_eq!(memory.frame_index(), 10);
    // SAFETY: app-arena memory lives as long as the context.
    assert_eq!(unsafe { persistent.as_ref() }, b"strata");
}

#[test]
fn session_reset_keeps_app_data() {
    let memory = MemoryContext::new(MemoryConfig::low_memory()).unwrap();
    let _ = memory.app().push(512);
    let _ = memory.session().push(64 * KB);

    memory.reset_session().unwrap();
    assert_eq!(memory.session().allocated(), 0);
    assert_eq!(memory.app().allocated(), 512);

    let _ = memory.session().push(128);
    memory.reset_session().unwrap();
    assert_eq!(memory.session().allocated(), 0);
}

#[test]
fn failed_initialization_is_reported() {
    let mut config = MemoryConfig::low_memory();
    config.frame = ArenaConfig::new(MB, 2 * MB);

    let err = MemoryContext::new(config).unwrap_err();
    assert_eq!(err.code(), "MEM:CONFIG:INVALID");
    assert!(err.to_string().contains("frame"));
}

#[test]
fn each_thread_builds_its_own_scratch_pool() {
    let memory = MemoryContext::new(MemoryConfig::low_memory()).unwrap();
    let scratch = memory.config().scratch.clone();

    std::thread::scope(|s| {
        for _ in 0..4 {
            let scratch = scratch.clone();
            s.spawn(move || {
                let pool = strata_memory::arena::ScratchPool::with_config(scratch);
                let scope = pool.scratch_scope();
                let _ = scope.arena().push(16 * KB);
                assert_eq!(scope.arena().allocated(), 16 * KB);
            });
        }
    });

    let pool = memory.scratch_pool();
    assert_eq!(pool.get_scratch().reserved(), 4 * MB);
}
