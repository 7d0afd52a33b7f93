use strata_system::memory::{self, VirtualRegion};
use strata_system::utils::format_bytes_usize as fmt;

fn main() -> strata_system::SystemResult<()> {
    let page = memory::page_size();

    println!("=== Virtual Memory ===");
    println!("page size  : {}", fmt(page));

    let region = VirtualRegion::reserve(256 * 1024 * 1024)?;
    println!("reserved   : {} at {:p}", fmt(region.len()), region.as_ptr());

    region.commit(0, 16 * page)?;
    println!("committed  : {}", fmt(16 * page));

    // SAFETY: the first 16 pages were just committed.
    unsafe { region.as_ptr().write_bytes(0, 16 * page) };

    // SAFETY: nothing references the upper half of the committed range.
    unsafe { region.decommit(8 * page, 8 * page)? };
    println!("decommitted: {}", fmt(8 * page));

    println!("\nTip: reserved but uncommitted pages cost address space only.");

    Ok(())
}
