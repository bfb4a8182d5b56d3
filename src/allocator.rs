//! The allocation capability injected into every container.
//!
//! A container owns exactly one buffer at a time and talks to memory only
//! through an [`Allocator`]. The allocator itself is *borrowed*: implementing
//! the trait for `&A` lets a container hold a reference to an allocator that
//! outlives it, while zero-sized allocators such as [`Global`] can simply be
//! held by value.

use core::alloc::Layout;
use core::ptr::NonNull;

/// An allocate / reallocate / deallocate capability.
///
/// # Safety
/// Implementors must return blocks that are valid for reads and writes of
/// `layout.size()` bytes and aligned to `layout.align()`, and must keep a
/// block valid until it is passed to [`deallocate`](Allocator::deallocate)
/// or successfully [`reallocate`](Allocator::reallocate)d. A failed
/// reallocation must leave the original block intact.
pub unsafe trait Allocator {
    /// Attempts to allocate a block for `layout`. Never called with a
    /// zero-sized layout.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Attempts to resize a block to `new_size` bytes, keeping the alignment
    /// of `old_layout`. The first `min(old_layout.size(), new_size)` bytes
    /// are preserved. On failure, returns [`None`] and the old block remains
    /// valid and owned by the caller.
    ///
    /// # Safety
    /// `ptr` must denote a block currently allocated by this allocator with
    /// `old_layout`, and `new_size` must be non-zero.
    unsafe fn reallocate(&self, ptr: NonNull<u8>, old_layout: Layout, new_size: usize) -> Option<NonNull<u8>>;

    /// Releases a block.
    ///
    /// # Safety
    /// `ptr` must denote a block currently allocated by this allocator with
    /// `layout`.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn reallocate(&self, ptr: NonNull<u8>, old_layout: Layout, new_size: usize) -> Option<NonNull<u8>> {
        (**self).reallocate(ptr, old_layout, new_size)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }
}

/// The system allocator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl Allocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() != 0);
        NonNull::new(unsafe { alloc::alloc::alloc(layout) })
    }

    #[inline]
    unsafe fn reallocate(&self, ptr: NonNull<u8>, old_layout: Layout, new_size: usize) -> Option<NonNull<u8>> {
        debug_assert!(new_size != 0);
        NonNull::new(alloc::alloc::realloc(ptr.as_ptr(), old_layout, new_size))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        alloc::alloc::dealloc(ptr.as_ptr(), layout)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use core::cell::Cell;

    /// Wraps [`Global`], denying requests once switched off.
    #[derive(Default)]
    pub(crate) struct Switch {
        denied: Cell<bool>,
        live: Cell<usize>,
    }

    impl Switch {
        pub(crate) fn deny(&self) {
            self.denied.set(true);
        }

        pub(crate) fn allow(&self) {
            self.denied.set(false);
        }

        pub(crate) fn live_blocks(&self) -> usize {
            self.live.get()
        }
    }

    unsafe impl Allocator for Switch {
        fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
            if self.denied.get() {
                return None;
            }
            let ptr = Global.allocate(layout)?;
            self.live.set(self.live.get() + 1);
            Some(ptr)
        }

        unsafe fn reallocate(&self, ptr: NonNull<u8>, old_layout: Layout, new_size: usize) -> Option<NonNull<u8>> {
            if self.denied.get() {
                return None;
            }
            Global.reallocate(ptr, old_layout, new_size)
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            self.live.set(self.live.get() - 1);
            Global.deallocate(ptr, layout)
        }
    }
}
