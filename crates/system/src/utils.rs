//! Size arithmetic and formatting helpers
//!
//! This module provides the small utilities shared across the strata crates:
//! - Human-readable byte formatting
//! - Alignment arithmetic
//! - Platform constants (cache line size)

/// Format bytes as human-readable string
///
/// Converts byte counts to human-readable format with appropriate units.
///
/// # Examples
///
/// ```
/// use strata_system::utils::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// assert_eq!(format_bytes(1048576), "1.00 MB");
/// ```
#[inline]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format bytes as human-readable string (usize variant)
#[inline]
#[must_use]
pub fn format_bytes_usize(bytes: usize) -> String {
    format_bytes(bytes as u64)
}

/// Get cache line size for current platform
#[inline]
#[must_use]
pub const fn cache_line_size() -> usize {
    // x86_64 and aarch64 both use 64-byte lines; 64 is also the safe default
    64
}

/// Round `value` up to a multiple of `alignment`
///
/// `alignment` must be a power of two. Overflows wrap in release builds;
/// use [`checked_align_up`] for untrusted sizes.
#[inline]
#[must_use]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Round `value` up to a multiple of `alignment`, `None` on overflow
#[inline]
#[must_use]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    match value.checked_add(alignment - 1) {
        Some(v) => Some(v & !(alignment - 1)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_bytes_usize() {
        assert_eq!(format_bytes_usize(16 * 1024 * 1024), "16.00 MB");
    }

    #[test]
    fn test_cache_line_size() {
        assert!(cache_line_size().is_power_of_two());
    }

    #[rstest]
    #[case(0, 64, 0)]
    #[case(1, 64, 64)]
    #[case(64, 64, 64)]
    #[case(65, 64, 128)]
    #[case(1000, 512, 1024)]
    #[case(4097, 4096, 8192)]
    fn test_align_up(#[case] value: usize, #[case] alignment: usize, #[case] expected: usize) {
        assert_eq!(align_up(value, alignment), expected);
        assert_eq!(checked_align_up(value, alignment), Some(expected));
    }

    #[test]
    fn test_checked_align_up_overflow() {
        assert_eq!(checked_align_up(usize::MAX, 64), None);
        assert_eq!(checked_align_up(usize::MAX - 62, 64), None);
        assert_eq!(checked_align_up(usize::MAX - 63, 64), Some(usize::MAX - 63));
    }
}
