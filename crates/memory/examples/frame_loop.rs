//! A toy update loop: long-lived data in the app arena, per-frame data in the
//! frame arena, temporaries in scratch arenas and a heap for resizable buffers.
//!
//! Run with `STRATA_LOG=debug cargo run --example frame_loop` to see the
//! arenas grow.

use anyhow::Context;
use strata_memory::prelude::*;
use strata_system::utils::format_bytes_usize as fmt;

#[derive(Clone, Copy, Debug)]
struct Particle {
    pos: [f32; 2],
    vel: [f32; 2],
}

fn main() -> anyhow::Result<()> {
    let _guard = strata_log::init().context("installing logger")?;

    let memory = MemoryContext::new(MemoryConfig::low_memory()).context("creating arenas")?;
    let scratch = memory.scratch_pool();

    // A heap carved out of the app arena for buffers that grow and shrink
    // SAFETY: the app arena is never popped or reset.
    let heap = unsafe { GeneralPurposeAllocator::from_arena(memory.app(), 8 << 20) }?;
    let mut log_ptr = heap.alloc(64)?;
    let mut log_len = 0usize;

    for _ in 0..5 {
        let frame = memory.begin_frame()?;
        let _span = strata_log::info_span!("frame", index = frame).entered();
        let count = 1000 * frame as usize;

        let particles = memory.frame().push_array::<Particle>(count);
        for i in 0..count {
            let p = Particle {
                pos: [i as f32, 0.0],
                vel: [1.0, frame as f32],
            };
            // SAFETY: `count` particles were pushed this frame.
            unsafe { particles.as_ptr().add(i).write(p) };
        }

        let energy = {
            let tmp = scratch.scratch_scope();
            let speeds = tmp.arena().push_array::<f32>(count);
            let mut total = 0.0;
            for i in 0..count {
                // SAFETY: both arrays hold `count` elements.
                unsafe {
                    let p = particles.as_ptr().add(i).read();
                    let speed = p.vel[0].hypot(p.vel[1]);
                    speeds.as_ptr().add(i).write(speed);
                    total += speed;
                }
            }
            total
        };

        let line = format!("frame {frame}: {count} particles, energy {energy:.1}\n");
        // SAFETY: `log_ptr` is live and reallocation keeps the prefix.
        unsafe {
            log_ptr = heap.realloc(Some(log_ptr), log_len + line.len())?;
            log_ptr
                .as_ptr()
                .add(log_len)
                .copy_from_nonoverlapping(line.as_ptr(), line.len());
        }
        log_len += line.len();

        println!(
            "frame {frame}: frame arena {} / scratch {}",
            fmt(memory.frame().allocated()),
            fmt(scratch.get_scratch().committed())
        );
        memory.end_frame()?;
    }

    // SAFETY: `log_len` bytes of UTF-8 were written above.
    let log = unsafe { std::slice::from_raw_parts(log_ptr.as_ptr(), log_len) };
    print!("{}", std::str::from_utf8(log)?);
    println!("heap: {}", heap.stats());
    println!("app arena: {}", memory.app().stats());

    // SAFETY: last use of `log_ptr`.
    unsafe { heap.free(Some(log_ptr))? };
    Ok(())
}
