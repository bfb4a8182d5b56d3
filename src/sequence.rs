//! A growable double-ended sequence implemented with a ring buffer.
//!
//! This sequence has amortized O(1) inserts and removals at both ends, and
//! inserts, removals and lookups at arbitrary positions cost
//! O(min(index, len - index)), since whichever end is closer to the affected
//! position is the one that gets shifted.
//!
//! Positions are 1-based: index 1 is the front, index `len()` the back, and
//! inserting at `len() + 1` appends.

use core::fmt::{self, Debug, Formatter};
use core::iter::FusedIterator;
use core::mem::MaybeUninit;

use crate::allocator::{Allocator, Global};
use crate::error::{Error, Failure};
use crate::storage::{grow_target, shrink_target, Buffer};

/// A growable double-ended sequence implemented with a ring buffer.
///
/// The occupied slots form a circular run from `start` to `end` (inclusive),
/// which may wrap around the end of the buffer. The buffer doubles when an
/// insertion finds it full, and is quartered once a removal leaves it at
/// most a quarter full. Whenever the run wraps during a capacity change, the
/// shorter of its two segments is moved, so the run stays intact.
///
/// # Examples
/// ```
/// let mut seq = sheaf::Sequence::new().unwrap();
/// seq.add_last(1).unwrap();
/// seq.add_last(2).unwrap();
/// seq.add_first(0).unwrap();
/// assert_eq!(seq.len(), 3);
/// assert_eq!(seq.iter().copied().collect::<Vec<_>>(), [0, 1, 2]);
/// ```
pub struct Sequence<T, A: Allocator = Global> {
    start: usize,
    end: usize,
    len: usize,
    buf: Buffer<T, A>,
}

impl<T> Sequence<T, Global> {
    /// Constructs an empty sequence using the system allocator.
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity_in(1, Global)
    }

    /// Constructs an empty sequence with room for `capacity` elements, using
    /// the system allocator. A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_capacity_in(capacity, Global)
    }
}

impl<T, A: Allocator> Sequence<T, A> {
    /// Constructs an empty sequence allocating from `alloc`.
    pub fn new_in(alloc: A) -> Result<Self, Error> {
        Self::with_capacity_in(1, alloc)
    }

    /// Constructs an empty sequence with room for `capacity` elements,
    /// allocating from `alloc`. A capacity of zero is treated as one.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, Error> {
        Ok(Sequence {
            start: 1,
            end: 1,
            len: 0,
            buf: Buffer::with_capacity_in(capacity, alloc)?,
        })
    }

    /// Returns the number of elements the sequence can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns the number of elements in the sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` exactly when the sequence contains zero elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the allocator backing this sequence.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    #[inline(always)]
    fn next(&self, offset: usize) -> usize {
        if offset == self.capacity() {
            1
        } else {
            offset + 1
        }
    }

    #[inline(always)]
    fn prev(&self, offset: usize) -> usize {
        if offset == 1 {
            self.capacity()
        } else {
            offset - 1
        }
    }

    #[inline(always)]
    fn offset_of(&self, index: usize) -> usize {
        (self.start - 1 + index - 1) % self.capacity() + 1
    }

    /// Makes room for one more element, doubling the buffer if it is full.
    fn grow(&mut self) -> Result<(), Error> {
        let old_cap = self.capacity();
        if self.len < old_cap {
            return Ok(());
        }

        let new_cap = grow_target(old_cap, old_cap + 1)?;
        self.buf.resize(new_cap)?;

        // a full buffer is either contiguous from slot 1, or wraps right
        // before `start`; in the latter case, relocate the shorter segment
        if self.start > self.end {
            let pre_wrap = old_cap - self.start + 1;
            let post_wrap = self.end;
            if pre_wrap <= post_wrap {
                let new_start = new_cap - pre_wrap + 1;
                unsafe { self.buf.shift(self.start, new_start, pre_wrap) };
                self.start = new_start;
            } else {
                unsafe { self.buf.shift(1, old_cap + 1, post_wrap) };
                self.end = old_cap + post_wrap;
            }
        }

        Ok(())
    }

    /// Quarters the buffer if it is sparse enough.
    ///
    /// Elements are first gathered inside the slots that survive the shrink.
    /// If the allocator then denies the reallocation, the layout is restored
    /// within the untouched, larger buffer before reporting the failure.
    fn shrink(&mut self) -> Result<(), Error> {
        let old_cap = self.capacity();
        let Some(new_cap) = shrink_target(self.len, old_cap) else {
            return Ok(());
        };

        if self.len == 0 {
            self.start = 1;
            self.end = 1;
            return self.buf.resize(new_cap);
        }

        if self.start <= self.end {
            if self.end > new_cap {
                // a contiguous run at the bottom is valid under either capacity
                unsafe { self.buf.shift(self.start, 1, self.len) };
                self.start = 1;
                self.end = self.len;
            }
            return self.buf.resize(new_cap);
        }

        let old_start = self.start;
        let pre_wrap = old_cap - old_start + 1;
        let new_start = new_cap - pre_wrap + 1;
        unsafe { self.buf.shift(old_start, new_start, pre_wrap) };
        self.start = new_start;

        if let Err(e) = self.buf.resize(new_cap) {
            unsafe { self.buf.shift(new_start, old_start, pre_wrap) };
            self.start = old_start;
            return Err(e);
        }

        Ok(())
    }

    #[inline]
    fn finish_removal(&mut self, value: T) -> Result<T, Failure<T>> {
        if self.len == 0 {
            self.start = 1;
            self.end = 1;
        }

        match self.shrink() {
            Ok(()) => Ok(value),
            Err(e) => Err(Failure::new(e, value)),
        }
    }

    /// Prepends an element to the front of the sequence.
    ///
    /// If the buffer is full and the allocator denies growing it, the
    /// sequence is left unchanged and `value` is handed back.
    ///
    /// # Examples
    /// ```
    /// let mut seq = sheaf::Sequence::new().unwrap();
    /// seq.add_first('b').unwrap();
    /// seq.add_first('a').unwrap();
    /// assert_eq!(seq.get_first(), Some(&'a'));
    /// ```
    pub fn add_first(&mut self, value: T) -> Result<(), Failure<T>> {
        if let Err(e) = self.grow() {
            return Err(Failure::new(e, value));
        }

        if self.len == 0 {
            self.end = self.start;
        } else {
            self.start = self.prev(self.start);
        }

        unsafe { self.buf.at(self.start).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Appends an element to the back of the sequence.
    ///
    /// If the buffer is full and the allocator denies growing it, the
    /// sequence is left unchanged and `value` is handed back.
    pub fn add_last(&mut self, value: T) -> Result<(), Failure<T>> {
        if let Err(e) = self.grow() {
            return Err(Failure::new(e, value));
        }

        if self.len == 0 {
            self.end = self.start;
        } else {
            self.end = self.next(self.end);
        }

        unsafe { self.buf.at(self.end).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Inserts an element so that it ends up at position `index`.
    ///
    /// Whichever end is closer to the insertion point will be moved to make
    /// room. If the buffer is full and the allocator denies growing it, the
    /// sequence is left unchanged and `value` is handed back.
    ///
    /// # Panics
    /// Panics if `index` is zero or greater than `len() + 1`.
    ///
    /// # Examples
    /// ```
    /// let mut seq = sheaf::Sequence::new().unwrap();
    /// seq.add_last('a').unwrap();
    /// seq.add_last('c').unwrap();
    /// seq.add_at(2, 'b').unwrap();
    /// assert_eq!(seq.iter().collect::<String>(), "abc");
    /// ```
    pub fn add_at(&mut self, index: usize, value: T) -> Result<(), Failure<T>> {
        if index == 0 || index > self.len + 1 {
            panic!("index out of bounds in `add_at`");
        }

        if index == 1 {
            return self.add_first(value);
        }
        if index == self.len + 1 {
            return self.add_last(value);
        }

        if let Err(e) = self.grow() {
            return Err(Failure::new(e, value));
        }

        let before = index - 1;
        let after = self.len - before;
        let mut dst;
        if before < after {
            // shift everything in front of the insertion point one slot forward
            dst = self.prev(self.start);
            self.start = dst;
            for _ in 0..before {
                let src = self.next(dst);
                unsafe { self.buf.shift(src, dst, 1) };
                dst = src;
            }
        } else {
            // shift everything from the insertion point on one slot backward
            dst = self.next(self.end);
            self.end = dst;
            for _ in 0..after {
                let src = self.prev(dst);
                unsafe { self.buf.shift(src, dst, 1) };
                dst = src;
            }
        }

        unsafe { self.buf.at(dst).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Removes the first element and returns it.
    ///
    /// If the removal leaves the buffer sparse but the allocator denies
    /// shrinking it, the element is still removed and handed back inside
    /// the [`Failure`]; only the capacity stays where it was.
    ///
    /// # Panics
    /// Panics if the sequence is empty.
    ///
    /// # Examples
    /// ```
    /// let mut seq = sheaf::Sequence::new().unwrap();
    /// seq.add_last(1).unwrap();
    /// seq.add_last(2).unwrap();
    /// assert_eq!(seq.remove_first().ok(), Some(1));
    /// assert_eq!(seq.remove_first().ok(), Some(2));
    /// assert!(seq.is_empty());
    /// ```
    pub fn remove_first(&mut self) -> Result<T, Failure<T>> {
        if self.len == 0 {
            panic!("`remove_first` called on an empty sequence");
        }

        let value = unsafe { self.buf.at(self.start).read() };
        self.start = self.next(self.start);
        self.len -= 1;
        self.finish_removal(value)
    }

    /// Removes the last element and returns it.
    ///
    /// Shrinking failures are reported as for [`remove_first`](Sequence::remove_first).
    ///
    /// # Panics
    /// Panics if the sequence is empty.
    pub fn remove_last(&mut self) -> Result<T, Failure<T>> {
        if self.len == 0 {
            panic!("`remove_last` called on an empty sequence");
        }

        let value = unsafe { self.buf.at(self.end).read() };
        self.end = self.prev(self.end);
        self.len -= 1;
        self.finish_removal(value)
    }

    /// Removes and returns the element at position `index`.
    ///
    /// Whichever end is closer to the removal point will be moved to fill
    /// the gap. Shrinking failures are reported as for
    /// [`remove_first`](Sequence::remove_first).
    ///
    /// # Panics
    /// Panics if `index` is zero or greater than `len()`.
    ///
    /// # Examples
    /// ```
    /// let mut seq = sheaf::Sequence::new().unwrap();
    /// for x in 1..=3 {
    ///     seq.add_last(x).unwrap();
    /// }
    /// assert_eq!(seq.remove_at(2).ok(), Some(2));
    /// assert_eq!(seq.iter().copied().collect::<Vec<_>>(), [1, 3]);
    /// ```
    pub fn remove_at(&mut self, index: usize) -> Result<T, Failure<T>> {
        if index == 0 || index > self.len {
            panic!("index out of bounds in `remove_at`");
        }

        let hole = self.offset_of(index);
        let value = unsafe { self.buf.at(hole).read() };

        let before = index - 1;
        let after = self.len - index;
        let mut dst = hole;
        if before < after {
            for _ in 0..before {
                let src = self.prev(dst);
                unsafe { self.buf.shift(src, dst, 1) };
                dst = src;
            }
            self.start = self.next(self.start);
        } else {
            for _ in 0..after {
                let src = self.next(dst);
                unsafe { self.buf.shift(src, dst, 1) };
                dst = src;
            }
            self.end = self.prev(self.end);
        }

        self.len -= 1;
        self.finish_removal(value)
    }

    /// Returns a reference to the front element, or [`None`] if the sequence
    /// is empty.
    #[inline]
    pub fn get_first(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        unsafe { Some(&*self.buf.at(self.start)) }
    }

    /// Returns a reference to the back element, or [`None`] if the sequence
    /// is empty.
    #[inline]
    pub fn get_last(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        unsafe { Some(&*self.buf.at(self.end)) }
    }

    /// Returns a reference to the element at position `index`, or [`None`]
    /// if `index` is zero or greater than `len()`.
    #[inline]
    pub fn get_at(&self, index: usize) -> Option<&T> {
        if index == 0 || index > self.len {
            return None;
        }
        unsafe { Some(&*self.buf.at(self.offset_of(index))) }
    }

    /// Places `value` at the front of the sequence, returning the element
    /// previously stored there.
    ///
    /// # Panics
    /// Panics if the sequence is empty.
    pub fn set_first(&mut self, value: T) -> T {
        if self.len == 0 {
            panic!("`set_first` called on an empty sequence");
        }
        unsafe { self.buf.at(self.start).replace(value) }
    }

    /// Places `value` at the back of the sequence, returning the element
    /// previously stored there.
    ///
    /// # Panics
    /// Panics if the sequence is empty.
    pub fn set_last(&mut self, value: T) -> T {
        if self.len == 0 {
            panic!("`set_last` called on an empty sequence");
        }
        unsafe { self.buf.at(self.end).replace(value) }
    }

    /// Places `value` at position `index`, returning the element previously
    /// stored there.
    ///
    /// # Panics
    /// Panics if `index` is zero or greater than `len()`.
    ///
    /// # Examples
    /// ```
    /// let mut seq = sheaf::Sequence::new().unwrap();
    /// seq.add_last(1).unwrap();
    /// seq.add_last(4).unwrap();
    /// assert_eq!(seq.set_at(2, 2), 4);
    /// assert_eq!(seq.get_last(), Some(&2));
    /// ```
    pub fn set_at(&mut self, index: usize, value: T) -> T {
        if index == 0 || index > self.len {
            panic!("index out of bounds in `set_at`");
        }
        unsafe { self.buf.at(self.offset_of(index)).replace(value) }
    }

    /// Drops every element, keeping the current capacity.
    pub fn clear(&mut self) {
        let mut offset = self.start;
        for _ in 0..self.len {
            unsafe { self.buf.at(offset).drop_in_place() };
            offset = self.next(offset);
        }

        self.len = 0;
        self.start = 1;
        self.end = 1;
    }

    /// Returns a front-to-back iterator over the sequence.
    ///
    /// The iterator borrows the sequence, so it cannot be mutated until the
    /// iterator is gone; to iterate again, create a new one.
    pub fn iter(&self) -> Iter<'_, T> {
        let slots = unsafe {
            core::slice::from_raw_parts(self.buf.at(1) as *const MaybeUninit<T>, self.capacity())
        };
        Iter {
            slots,
            offset: self.start,
            remaining: self.len,
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let cap = self.capacity();
        assert!(cap >= 1);
        assert!(self.len <= cap);
        assert!(self.start >= 1 && self.start <= cap);
        assert!(self.end >= 1 && self.end <= cap);
        if self.len > 0 {
            assert_eq!((self.end + cap - self.start) % cap + 1, self.len);
        }
    }
}

impl<T, A: Allocator> Drop for Sequence<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Debug, A: Allocator> Debug for Sequence<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Sequence<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A front-to-back iterator over the elements of a [`Sequence`].
///
/// This `struct` is created by [`Sequence::iter`].
pub struct Iter<'a, T> {
    slots: &'a [MaybeUninit<T>],
    offset: usize,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    /// Advances the iterator, reporting exhaustion as [`Error::Stop`].
    pub fn try_next(&mut self) -> Result<&'a T, Error> {
        self.next().ok_or(Error::Stop)
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }

        let item = unsafe { self.slots[self.offset - 1].assume_init_ref() };
        self.offset = if self.offset == self.slots.len() {
            1
        } else {
            self.offset + 1
        };
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots,
            offset: self.offset,
            remaining: self.remaining,
        }
    }
}

impl<T: Debug> Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
