//! Virtual memory: reserve address space up front, commit pages on demand
//!
//! A [`VirtualRegion`] owns one reservation. Reserved pages are inaccessible
//! until [`VirtualRegion::commit`] backs them with memory; committed pages can
//! be handed back with [`VirtualRegion::decommit`] without giving up the
//! address range. The reservation is released when the region is dropped.

use std::ptr::NonNull;

use crate::error::{SystemError, SystemResult};
use crate::utils::checked_align_up;

pub use region::Protection as MemoryProtection;

/// Size of a virtual memory page in bytes
#[inline]
#[must_use]
pub fn page_size() -> usize {
    region::page::size()
}

/// Round `size` up to a whole number of pages, `None` on overflow
#[inline]
#[must_use]
pub fn page_align(size: usize) -> Option<usize> {
    checked_align_up(size, page_size())
}

/// An owned range of reserved virtual address space
#[derive(Debug)]
pub struct VirtualRegion {
    base: NonNull<u8>,
    size: usize,
}

// SAFETY: the region is the sole owner of its mapping and the OS calls made
// through `&self` (protect, madvise, VirtualAlloc/VirtualFree) are thread-safe.
unsafe impl Send for VirtualRegion {}
// SAFETY: see above; the region itself holds no mutable state.
unsafe impl Sync for VirtualRegion {}

impl VirtualRegion {
    /// Reserve at least `size` bytes of address space, rounded up to page size
    ///
    /// Nothing is committed; touching the range before [`commit`](Self::commit)
    /// faults.
    pub fn reserve(size: usize) -> SystemResult<Self> {
        if size == 0 {
            return Err(SystemError::invalid_size("cannot reserve 0 bytes"));
        }
        let size = page_align(size).ok_or_else(|| {
            SystemError::invalid_size(format!("{size} bytes overflows when rounded to pages"))
        })?;
        let base = os::reserve(size).map_err(|reason| SystemError::ReserveFailed { size, reason })?;
        Ok(Self { base, size })
    }

    /// Start of the reservation
    #[inline]
    #[must_use]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Start of the reservation as a raw pointer
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    /// Reserved size in bytes (always a multiple of the page size)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Always false; a region cannot be reserved empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Whether `ptr` points inside the reservation
    #[inline]
    #[must_use]
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.base.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr - start < self.size
    }

    /// Back `[offset, offset + len)` with readable and writable memory
    ///
    /// `offset` must be page aligned; `len` is rounded up to whole pages.
    /// Committing pages that are already committed is allowed and leaves
    /// their contents untouched.
    pub fn commit(&self, offset: usize, len: usize) -> SystemResult<()> {
        let Some(len) = self.page_range(offset, len)? else {
            return Ok(());
        };
        // SAFETY: `page_range` checked that the range lies inside our reservation.
        unsafe { os::commit(self.base.as_ptr().add(offset), len) }
            .map_err(|reason| SystemError::CommitFailed {
                offset,
                len,
                reason,
            })
    }

    /// Return `[offset, offset + len)` to the OS, keeping the address range
    ///
    /// `offset` must be page aligned; `len` is rounded up to whole pages.
    ///
    /// # Safety
    ///
    /// The contents of the range are discarded and the pages become
    /// inaccessible. No live reference may point into the range.
    pub unsafe fn decommit(&self, offset: usize, len: usize) -> SystemResult<()> {
        let Some(len) = self.page_range(offset, len)? else {
            return Ok(());
        };
        // SAFETY: range is inside the reservation; the caller guarantees nothing
        // still references it.
        unsafe { os::decommit(self.base.as_ptr().add(offset), len) }.map_err(|reason| {
            SystemError::DecommitFailed {
                offset,
                len,
                reason,
            }
        })
    }

    /// Validate a range and round its length to pages, `None` for empty ranges
    fn page_range(&self, offset: usize, len: usize) -> SystemResult<Option<usize>> {
        if len == 0 {
            return Ok(None);
        }
        let out_of_range = SystemError::OutOfRange {
            offset,
            len,
            size: self.size,
        };
        if offset % page_size() != 0 || offset >= self.size {
            return Err(out_of_range);
        }
        match page_align(len) {
            Some(rounded) if rounded <= self.size - offset => Ok(Some(rounded)),
            _ => Err(out_of_range),
        }
    }
}

impl Drop for VirtualRegion {
    fn drop(&mut self) {
        // SAFETY: we own the reservation and nothing can borrow from it past drop.
        let released = unsafe { os::release(self.base.as_ptr(), self.size) };
        debug_assert!(
            released.is_ok(),
            "failed to release {}-byte region: {released:?}",
            self.size
        );
    }
}

#[cfg(unix)]
mod os {
    use std::ptr::{self, NonNull};

    use crate::error::SystemError;

    #[cfg(any(target_os = "linux", target_os = "android"))]
    const MAP_NORESERVE: libc::c_int = libc::MAP_NORESERVE;
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    const MAP_NORESERVE: libc::c_int = 0;

    pub(super) fn reserve(size: usize) -> Result<NonNull<u8>, String> {
        // SAFETY: anonymous private mapping at a kernel-chosen address; no
        // existing memory is affected.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | MAP_NORESERVE,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(SystemError::last_os_error());
        }
        NonNull::new(ptr.cast::<u8>()).ok_or_else(|| "mmap returned a null mapping".to_string())
    }

    pub(super) unsafe fn commit(ptr: *mut u8, len: usize) -> Result<(), String> {
        // SAFETY: caller passes a page-aligned range inside a live reservation.
        unsafe { region::protect(ptr, len, region::Protection::READ_WRITE) }
            .map_err(|e| e.to_string())
    }

    pub(super) unsafe fn decommit(ptr: *mut u8, len: usize) -> Result<(), String> {
        // SAFETY: caller passes a page-aligned range inside a live reservation
        // that nothing references any more.
        if unsafe { libc::madvise(ptr.cast(), len, libc::MADV_DONTNEED) } != 0 {
            return Err(SystemError::last_os_error());
        }
        // SAFETY: same range as above.
        unsafe { region::protect(ptr, len, region::Protection::NONE) }.map_err(|e| e.to_string())
    }

    pub(super) unsafe fn release(ptr: *mut u8, size: usize) -> Result<(), String> {
        // SAFETY: caller passes the exact mapping returned by `reserve`.
        if unsafe { libc::munmap(ptr.cast(), size) } != 0 {
            return Err(SystemError::last_os_error());
        }
        Ok(())
    }
}

#[cfg(windows)]
mod os {
    use std::ptr::{self, NonNull};

    use winapi::um::memoryapi::{VirtualAlloc, VirtualFree};
    use winapi::um::winnt::{
        MEM_COMMIT, MEM_DECOMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_NOACCESS, PAGE_READWRITE,
    };

    use crate::error::SystemError;

    pub(super) fn reserve(size: usize) -> Result<NonNull<u8>, String> {
        // SAFETY: reserving at a system-chosen address touches no existing memory.
        let ptr = unsafe { VirtualAlloc(ptr::null_mut(), size, MEM_RESERVE, PAGE_NOACCESS) };
        NonNull::new(ptr.cast::<u8>()).ok_or_else(SystemError::last_os_error)
    }

    pub(super) unsafe fn commit(ptr: *mut u8, len: usize) -> Result<(), String> {
        // SAFETY: caller passes a range inside a live reservation.
        let committed = unsafe { VirtualAlloc(ptr.cast(), len, MEM_COMMIT, PAGE_READWRITE) };
        if committed.is_null() {
            return Err(SystemError::last_os_error());
        }
        Ok(())
    }

    pub(super) unsafe fn decommit(ptr: *mut u8, len: usize) -> Result<(), String> {
        // SAFETY: caller passes a committed range that nothing references.
        if unsafe { VirtualFree(ptr.cast(), len, MEM_DECOMMIT) } == 0 {
            return Err(SystemError::last_os_error());
        }
        Ok(())
    }

    pub(super) unsafe fn release(ptr: *mut u8, _size: usize) -> Result<(), String> {
        // SAFETY: caller passes the base address returned by `reserve`.
        if unsafe { VirtualFree(ptr.cast(), 0, MEM_RELEASE) } == 0 {
            return Err(SystemError::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(any(unix, windows)))]
mod os {
    use std::ptr::NonNull;

    const UNSUPPORTED: &str = "virtual memory is not supported on this platform";

    pub(super) fn reserve(_size: usize) -> Result<NonNull<u8>, String> {
        Err(UNSUPPORTED.to_string())
    }

    pub(super) unsafe fn commit(_ptr: *mut u8, _len: usize) -> Result<(), String> {
        Err(UNSUPPORTED.to_string())
    }

    pub(super) unsafe fn decommit(_ptr: *mut u8, _len: usize) -> Result<(), String> {
        Err(UNSUPPORTED.to_string())
    }

    pub(super) unsafe fn release(_ptr: *mut u8, _size: usize) -> Result<(), String> {
        Err(UNSUPPORTED.to_string())
    }
}
