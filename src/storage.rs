//! The single owned buffer behind every container.
//!
//! Slots are addressed by 1-based offsets: offset 0 is reserved as the
//! "no slot" sentinel used by the node pools, and never denotes data.

use core::alloc::Layout;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::allocator::Allocator;
use crate::error::Error;

/// Computes the memory layout of `items` slots of `T`.
#[inline]
fn layout_with_capacity<T>(items: usize) -> Result<Layout, Error> {
    Layout::array::<T>(items).map_err(|_| Error::AllocationFailure)
}

/// A freshly allocated block that has not been filled yet.
///
/// Obtained from [`Buffer::reserve_block`] and consumed by
/// [`Buffer::adopt`]; reserving before mutating lets a caller find out
/// whether a relocation is possible while its structure is still untouched.
pub(crate) struct Block<T> {
    ptr: NonNull<T>,
    cap: usize,
}

/// An uninitialized, allocator-owned array of `T` with a known capacity.
///
/// The buffer never drops the values stored in it; that is up to the
/// container, which alone knows which slots are initialized.
pub(crate) struct Buffer<T, A: Allocator> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
    elem: PhantomData<T>,
}

impl<T, A: Allocator> Buffer<T, A> {
    /// Allocates a buffer with room for `capacity` slots (at least one).
    pub(crate) fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, Error> {
        let cap = usize::max(capacity, 1);
        let layout = layout_with_capacity::<T>(cap)?;
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            match alloc.allocate(layout) {
                Some(ptr) => ptr.cast(),
                None => {
                    log::debug!("initial allocation of {} slots denied", cap);
                    return Err(Error::AllocationFailure);
                }
            }
        };

        Ok(Buffer {
            ptr,
            cap,
            alloc,
            elem: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns a pointer to the slot at `offset`.
    ///
    /// # Safety
    /// `offset` must lie within `1..=capacity`. The slot may be uninitialized.
    #[inline]
    pub(crate) unsafe fn at(&self, offset: usize) -> *mut T {
        debug_assert!(offset >= 1 && offset <= self.cap);
        self.ptr.as_ptr().add(offset - 1)
    }

    /// Moves `count` slots starting at `src` to start at `dst`. The ranges
    /// may overlap.
    ///
    /// # Safety
    /// Both ranges must lie within `1..=capacity`.
    #[inline]
    pub(crate) unsafe fn shift(&mut self, src: usize, dst: usize, count: usize) {
        if count > 0 {
            core::ptr::copy(self.at(src), self.at(dst), count);
        }
    }

    /// Changes the capacity through the allocator's `reallocate`, preserving
    /// the first `min(capacity, new_capacity)` slots.
    ///
    /// On failure the buffer, its contents and its capacity are unchanged.
    pub(crate) fn resize(&mut self, new_capacity: usize) -> Result<(), Error> {
        debug_assert!(new_capacity >= 1);
        if new_capacity == self.cap {
            return Ok(());
        }

        let old_layout = layout_with_capacity::<T>(self.cap)?;
        let new_layout = layout_with_capacity::<T>(new_capacity)?;
        if new_layout.size() != 0 {
            let raw = self.ptr.cast::<u8>();
            match unsafe { self.alloc.reallocate(raw, old_layout, new_layout.size()) } {
                Some(ptr) => self.ptr = ptr.cast(),
                None => {
                    log::debug!("resizing from {} to {} slots denied", self.cap, new_capacity);
                    return Err(Error::AllocationFailure);
                }
            }
        }

        log::trace!("resized from {} to {} slots", self.cap, new_capacity);
        self.cap = new_capacity;
        Ok(())
    }

    /// Allocates a separate block of `capacity` slots without touching the
    /// current one.
    pub(crate) fn reserve_block(&self, capacity: usize) -> Result<Block<T>, Error> {
        debug_assert!(capacity >= 1);
        let layout = layout_with_capacity::<T>(capacity)?;
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            match self.alloc.allocate(layout) {
                Some(ptr) => ptr.cast(),
                None => {
                    log::debug!("reserving a block of {} slots denied", capacity);
                    return Err(Error::AllocationFailure);
                }
            }
        };
        Ok(Block { ptr, cap: capacity })
    }

    /// Moves the first `keep` slots into `block`, releases the current
    /// allocation and continues with `block` as the buffer.
    ///
    /// # Safety
    /// `block` must come from [`reserve_block`](Buffer::reserve_block) on
    /// this buffer, and `keep` must not exceed either capacity.
    pub(crate) unsafe fn adopt(&mut self, block: Block<T>, keep: usize) {
        debug_assert!(keep <= self.cap && keep <= block.cap);
        core::ptr::copy_nonoverlapping(self.ptr.as_ptr(), block.ptr.as_ptr(), keep);
        self.release();
        log::trace!("relocated from {} to {} slots", self.cap, block.cap);
        self.ptr = block.ptr;
        self.cap = block.cap;
    }

    #[inline]
    fn release(&mut self) {
        if let Ok(layout) = layout_with_capacity::<T>(self.cap) {
            if layout.size() != 0 {
                unsafe { self.alloc.deallocate(self.ptr.cast(), layout) };
            }
        }
    }
}

impl<T, A: Allocator> Drop for Buffer<T, A> {
    fn drop(&mut self) {
        self.release();
    }
}

/// The capacity a container shrinks to once only `len` of its `capacity`
/// slots are in use, or `None` if it should keep its current buffer.
///
/// Capacity is quartered as soon as the live count fits into a quarter of
/// it, never dropping below one slot.
#[inline]
pub(crate) fn shrink_target(len: usize, capacity: usize) -> Option<usize> {
    let target = if capacity < 4 { 1 } else { capacity / 4 };
    if target < capacity && len <= target {
        Some(target)
    } else {
        None
    }
}

/// The capacity a full container of `capacity` slots grows to so that it
/// can hold at least `required` slots.
#[inline]
pub(crate) fn grow_target(capacity: usize, required: usize) -> Result<usize, Error> {
    let mut target = capacity;
    while target < required {
        target = target.checked_mul(2).ok_or(Error::AllocationFailure)?;
    }
    Ok(target)
}
