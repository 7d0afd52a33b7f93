//! Allocator capability
//!
//! Every allocator in this crate is exposed to the rest of the engine through
//! one small contract: [`Allocator`]. Containers (hash maps, strings, pools)
//! are written once against it and take an [`AllocatorHandle`] to decide which
//! concrete allocator backs them.
//!
//! Failures are returned as [`MemoryError`](crate::error::MemoryError) values;
//! the error constructors have already logged the diagnostic by the time a
//! caller sees them.
//!
//! | Allocator | allocate | reallocate | release |
//! |-----------|----------|------------|---------|
//! | [`Arena`](crate::arena::Arena) | bump push | unsupported (error) | no-op |
//! | [`GeneralPurposeAllocator`](crate::heap::GeneralPurposeAllocator) | free lists / bump | grow by copy | free-list insert |
//! | [`SystemAllocator`] | global heap | global heap | global heap |

mod system;

use core::fmt;
use core::ptr::NonNull;

pub use system::SystemAllocator;

use crate::error::MemoryResult;

/// Three-operation allocation contract
///
/// # Safety
///
/// Implementors must guarantee that a pointer returned by `allocate` or
/// `reallocate` is valid for reads and writes of the requested size until it
/// is released, reallocated, or the allocator's own bulk reset reclaims it,
/// and that it does not overlap any other live allocation.
pub unsafe trait Allocator {
    /// Allocate at least `size` bytes; `size` must be non-zero
    fn allocate(&self, size: usize) -> MemoryResult<NonNull<u8>>;

    /// Resize an allocation, moving it if needed
    ///
    /// `None` behaves as [`allocate`](Self::allocate). On error the original
    /// allocation is left untouched.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator and not yet released.
    unsafe fn reallocate(&self, ptr: Option<NonNull<u8>>, new_size: usize)
    -> MemoryResult<NonNull<u8>>;

    /// Give an allocation back; `None` is a no-op
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator and not yet released.
    /// It must not be used afterwards.
    unsafe fn release(&self, ptr: Option<NonNull<u8>>) -> MemoryResult<()>;

    /// Name used in diagnostics
    fn name(&self) -> &str {
        "allocator"
    }
}

/// Non-owning, copyable reference to an allocator
///
/// The creator of the allocator keeps ownership; a handle is passed by value
/// to whoever needs to allocate through it.
#[derive(Clone, Copy)]
pub struct AllocatorHandle<'a> {
    inner: &'a dyn Allocator,
}

impl<'a> AllocatorHandle<'a> {
    /// Wrap an allocator
    #[inline]
    pub fn new(allocator: &'a dyn Allocator) -> Self {
        Self { inner: allocator }
    }

    /// See [`Allocator::allocate`]
    #[inline]
    pub fn allocate(self, size: usize) -> MemoryResult<NonNull<u8>> {
        self.inner.allocate(size)
    }

    /// Allocate and zero `size` bytes
    pub fn allocate_zeroed(self, size: usize) -> MemoryResult<NonNull<u8>> {
        let ptr = self.inner.allocate(size)?;
        // SAFETY: `allocate` returned a block valid for `size` bytes.
        unsafe { ptr.as_ptr().write_bytes(0, size) };
        Ok(ptr)
    }

    /// See [`Allocator::reallocate`]
    ///
    /// # Safety
    ///
    /// Same contract as [`Allocator::reallocate`].
    #[inline]
    pub unsafe fn reallocate(
        self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
    ) -> MemoryResult<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.inner.reallocate(ptr, new_size) }
    }

    /// See [`Allocator::release`]
    ///
    /// # Safety
    ///
    /// Same contract as [`Allocator::release`].
    #[inline]
    pub unsafe fn release(self, ptr: Option<NonNull<u8>>) -> MemoryResult<()> {
        // SAFETY: forwarded caller contract.
        unsafe { self.inner.release(ptr) }
    }

    /// Name of the underlying allocator
    #[must_use]
    pub fn name(self) -> &'a str {
        self.inner.name()
    }
}

impl<'a, A: Allocator> From<&'a A> for AllocatorHandle<'a> {
    fn from(allocator: &'a A) -> Self {
        Self::new(allocator)
    }
}

impl fmt::Debug for AllocatorHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AllocatorHandle").field(&self.inner.name()).finish()
    }
}
