//! Common types and constants for memory management

/// Memory alignment requirements
pub mod alignment {
    /// Alignment of every arena push; one cache line
    pub const CACHE_LINE: usize = strata_system::utils::cache_line_size();

    /// Alignment of payloads handed out by the system heap allocator
    pub const HEAP_ALIGN: usize = 16;
}

/// Memory size constants
pub mod size {
    /// 1 Kilobyte
    pub const KB: usize = 1024;

    /// 1 Megabyte
    pub const MB: usize = 1024 * KB;

    /// 1 Gigabyte
    pub const GB: usize = 1024 * MB;
}

/// Default arena sizes
pub mod arena {
    use super::size::{GB, MB};

    /// Reservation of the app, session and frame arenas
    pub const GLOBAL_RESERVE: usize = GB;

    /// Initial commit of the app, session and frame arenas
    pub const GLOBAL_COMMIT: usize = MB;

    /// Reservation of each scratch arena
    pub const SCRATCH_RESERVE: usize = 16 * MB;

    /// Initial commit of each scratch arena
    pub const SCRATCH_COMMIT: usize = MB;

    /// Scratch arenas per thread
    pub const SCRATCH_COUNT: usize = 2;
}

/// General purpose allocator geometry
pub mod heap {
    /// Every block size is a multiple of this; also the smallest bucket class
    pub const MIN_BLOCK_SIZE: usize = 512;

    /// Number of power-of-two bucket free lists
    pub const BUCKET_COUNT: usize = 16;

    /// Blocks above this size bypass the buckets
    pub const BUCKET_CEILING: usize = MIN_BLOCK_SIZE << BUCKET_COUNT;

    /// Largest size class with its own bucket (`MIN_BLOCK_SIZE << 15`)
    pub const LARGEST_BUCKET_CLASS: usize = MIN_BLOCK_SIZE << (BUCKET_COUNT - 1);

    /// A large free block is split only when the leftover exceeds this
    pub const SPLIT_THRESHOLD: usize = BUCKET_CEILING << 1;
}
