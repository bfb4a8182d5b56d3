//! Arena-based memory management.
//!
//! An arena controls a contiguous region of memory, partitioning it by simply
//! incrementing a pointer. Memory handed out this way cannot be reclaimed
//! individually, with one exception: the most recent block may be grown,
//! shrunk or released in place, which covers the common case of a single
//! container resizing its only buffer.
//!
//! Since [`Arena`] implements [`Allocator`] through a shared reference, a
//! container borrows the arena it allocates from, and the borrow checker
//! ensures the arena outlives every container using it:
//!
//! ```
//! use core::mem::MaybeUninit;
//! use sheaf::{Arena, Sequence};
//!
//! let mut region = [MaybeUninit::uninit(); 256];
//! let arena = Arena::from(&mut region[..]);
//!
//! let mut seq = Sequence::<u32, _>::with_capacity_in(4, &arena).unwrap();
//! seq.add_last(1).unwrap();
//! seq.add_first(0).unwrap();
//! assert_eq!(seq.get_at(2), Some(&1));
//! ```
//!
//! Exhausting the region is reported like any other denied allocation, so an
//! arena is also a convenient way to bound how much memory a container may
//! use.

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt::{self, Debug, Formatter};
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ops::Range;
use core::ptr::NonNull;

use crate::allocator::Allocator;

/// A bump allocator over a borrowed memory region.
///
/// See the [module-level documentation](crate::arena) for more.
pub struct Arena<'src> {
    start: *mut u8,
    cursor: Cell<*mut u8>,
    end: *mut u8,
    last: Cell<*mut u8>,
    src: PhantomData<&'src mut [MaybeUninit<u8>]>,
}

impl<'src> From<&'src mut [MaybeUninit<u8>]> for Arena<'src> {
    fn from(buf: &'src mut [MaybeUninit<u8>]) -> Self {
        let Range { start, end } = buf.as_mut_ptr_range();
        let start = start.cast::<u8>();
        Arena {
            start,
            cursor: Cell::new(start),
            end: end.cast(),
            last: Cell::new(core::ptr::null_mut()),
            src: PhantomData,
        }
    }
}

impl<'src> Arena<'src> {
    /// Returns the size of the underlying region in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.end as usize - self.start as usize
    }

    /// Returns the number of bytes that have not been handed out yet.
    ///
    /// Alignment padding may prevent an allocation of exactly this size
    /// from succeeding.
    #[inline]
    pub fn bytes_remaining(&self) -> usize {
        self.end as usize - self.cursor.get() as usize
    }

    #[inline]
    fn try_alloc_raw(&self, layout: Layout) -> Option<NonNull<u8>> {
        let cursor = self.cursor.get();
        let align_offset = cursor.align_offset(layout.align());

        // `ptr::align_offset()` is free to always return `usize::MAX`, in
        // which case the region is treated as exhausted
        if align_offset == usize::MAX {
            return None;
        }

        // bounds must be checked through usize arithmetic, it is UB for
        // the result of `ptr::add` to be out of bounds
        let total_bytes = align_offset.checked_add(layout.size())?;
        if self.end as usize - (cursor as usize) < total_bytes {
            return None;
        }

        let result = unsafe { cursor.add(align_offset) };
        self.cursor.set(unsafe { result.add(layout.size()) });
        self.last.set(result);
        NonNull::new(result)
    }

    #[inline]
    fn is_last(&self, ptr: NonNull<u8>) -> bool {
        self.last.get() == ptr.as_ptr()
    }
}

unsafe impl Allocator for Arena<'_> {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let result = self.try_alloc_raw(layout);
        if result.is_none() {
            log::debug!(
                "arena exhausted: requested {} bytes, {} remaining",
                layout.size(),
                self.bytes_remaining()
            );
        }
        result
    }

    unsafe fn reallocate(&self, ptr: NonNull<u8>, old_layout: Layout, new_size: usize) -> Option<NonNull<u8>> {
        if self.is_last(ptr) {
            // the most recent block can be resized without moving it
            let available = self.end as usize - ptr.as_ptr() as usize;
            if new_size <= available {
                self.cursor.set(ptr.as_ptr().add(new_size));
                return Some(ptr);
            }
            log::debug!("arena exhausted: cannot extend block to {} bytes", new_size);
            return None;
        }

        let new_layout = Layout::from_size_align(new_size, old_layout.align()).ok()?;
        let new_ptr = self.allocate(new_layout)?;
        let count = usize::min(old_layout.size(), new_size);
        core::ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), count);
        Some(new_ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, _layout: Layout) {
        if self.is_last(ptr) {
            self.cursor.set(ptr.as_ptr());
            self.last.set(core::ptr::null_mut());
        }
    }
}

impl Debug for Arena<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("bytes_remaining", &self.bytes_remaining())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_and_exhaust() {
        let mut region = [MaybeUninit::uninit(); 64];
        let arena = Arena::from(&mut region[..]);
        assert_eq!(arena.capacity(), 64);

        let layout = Layout::from_size_align(24, 8).unwrap();
        let a = arena.allocate(layout).unwrap();
        let b = arena.allocate(layout).unwrap();
        assert_ne!(a, b);
        assert!(arena.allocate(layout).is_none());
    }

    #[test]
    fn last_block_resizes_in_place() {
        let mut region = [MaybeUninit::uninit(); 64];
        let arena = Arena::from(&mut region[..]);

        let layout = Layout::from_size_align(8, 1).unwrap();
        let a = arena.allocate(layout).unwrap();
        unsafe {
            a.as_ptr().write(0xAB);
            let grown = arena.reallocate(a, layout, 48).unwrap();
            assert_eq!(grown, a);
            assert_eq!(grown.as_ptr().read(), 0xAB);
            assert_eq!(arena.bytes_remaining(), 16);

            let shrunk = arena.reallocate(grown, Layout::from_size_align(48, 1).unwrap(), 4).unwrap();
            assert_eq!(shrunk, a);
            assert_eq!(arena.bytes_remaining(), 60);

            assert!(arena.reallocate(shrunk, Layout::from_size_align(4, 1).unwrap(), 65).is_none());
            assert_eq!(shrunk.as_ptr().read(), 0xAB);
        }
    }

    #[test]
    fn older_block_is_copied() {
        let mut region = [MaybeUninit::uninit(); 64];
        let arena = Arena::from(&mut region[..]);

        let layout = Layout::from_size_align(4, 1).unwrap();
        let a = arena.allocate(layout).unwrap();
        let _b = arena.allocate(layout).unwrap();
        unsafe {
            a.as_ptr().copy_from_nonoverlapping([1u8, 2, 3, 4].as_ptr(), 4);
            let moved = arena.reallocate(a, layout, 8).unwrap();
            assert_ne!(moved, a);
            let mut bytes = [0u8; 4];
            bytes.as_mut_ptr().copy_from_nonoverlapping(moved.as_ptr(), 4);
            assert_eq!(bytes, [1, 2, 3, 4]);
        }
    }

    #[test]
    fn release_rewinds_last_block() {
        let mut region = [MaybeUninit::uninit(); 32];
        let arena = Arena::from(&mut region[..]);

        let layout = Layout::from_size_align(32, 1).unwrap();
        let a = arena.allocate(layout).unwrap();
        assert_eq!(arena.bytes_remaining(), 0);
        unsafe { arena.deallocate(a, layout) };
        assert_eq!(arena.bytes_remaining(), 32);
        assert!(arena.allocate(layout).is_some());
    }
}
