//! An order-statistic AVL tree stored in a compact node pool.
//!
//! Every node records the size of its subtree, so elements can be looked up,
//! inserted and removed both by key and by rank (1-based in-order position)
//! in O(log n) time.
//!
//! Nodes live in a single buffer, addressed by 1-based slot numbers with 0
//! meaning "no node". The root always occupies slot 1, and the live nodes
//! are always exactly the slots `1..=len()`: removing a node moves the node
//! in the last slot into the hole. Rotations exchange payloads instead of
//! relinking the subtree root, which is what keeps the root in place.

use core::cmp::Ordering;
use core::fmt::{self, Debug, Formatter};
use core::ptr::{self, addr_of, addr_of_mut};

use crate::allocator::{Allocator, Global};
use crate::error::{Error, Failure};
use crate::order::{Binary, BinaryOrder, Compare};
use crate::storage::{grow_target, shrink_target, Buffer};

mod iter;

pub use iter::Iter;

const ROOT: usize = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Balance {
    LeftHeavy,
    Even,
    RightHeavy,
}

impl Balance {
    /// Height of the right subtree minus height of the left subtree.
    #[inline]
    fn factor(self) -> i8 {
        match self {
            Balance::LeftHeavy => -1,
            Balance::Even => 0,
            Balance::RightHeavy => 1,
        }
    }

    #[inline]
    fn from_factor(factor: i8) -> Self {
        debug_assert!((-1..=1).contains(&factor));
        match factor {
            0 => Balance::Even,
            f if f < 0 => Balance::LeftHeavy,
            _ => Balance::RightHeavy,
        }
    }
}

struct Node<T> {
    parent: usize,
    left: usize,
    right: usize,
    size: usize,
    balance: Balance,
    value: T,
}

/// An order-statistic self-balancing search tree.
///
/// Elements are kept sorted by the comparator `C`, which defaults to
/// [`BinaryOrder`]. Equal elements are permitted; the `_left` and `_right`
/// variants of each keyed operation decide whether ties resolve towards the
/// first or the last of the equal run.
///
/// # Examples
/// ```
/// let mut tree = sheaf::Tree::new().unwrap();
/// tree.add_left(10u32).unwrap();
/// tree.add_left(20).unwrap();
/// tree.add_left(5).unwrap();
/// assert_eq!(tree.get_at(1), Some(&5));
/// assert_eq!(tree.get_at(2), Some(&10));
/// assert_eq!(tree.get_at(3), Some(&20));
/// assert_eq!(tree.search_left(&10), Ok((2, &10)));
/// ```
pub struct Tree<T, C = BinaryOrder, A: Allocator = Global> {
    len: usize,
    buf: Buffer<Node<T>, A>,
    compare: C,
}

impl<T: Binary> Tree<T, BinaryOrder, Global> {
    /// Constructs an empty tree ordered by [`BinaryOrder`], using the system
    /// allocator.
    pub fn new() -> Result<Self, Error> {
        Self::with_compare_in(1, BinaryOrder, Global)
    }

    /// Constructs an empty tree with room for `capacity` elements, ordered
    /// by [`BinaryOrder`] and using the system allocator.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_compare_in(capacity, BinaryOrder, Global)
    }
}

impl<T: Binary, A: Allocator> Tree<T, BinaryOrder, A> {
    /// Constructs an empty tree ordered by [`BinaryOrder`], allocating from
    /// `alloc`.
    pub fn new_in(alloc: A) -> Result<Self, Error> {
        Self::with_compare_in(1, BinaryOrder, alloc)
    }

    /// Constructs an empty tree with room for `capacity` elements, ordered
    /// by [`BinaryOrder`] and allocating from `alloc`.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, Error> {
        Self::with_compare_in(capacity, BinaryOrder, alloc)
    }
}

impl<T, C: Compare<T>> Tree<T, C, Global> {
    /// Constructs an empty tree ordered by `compare`, using the system
    /// allocator.
    pub fn with_compare(compare: C) -> Result<Self, Error> {
        Self::with_compare_in(1, compare, Global)
    }
}

impl<T, C: Compare<T>, A: Allocator> Tree<T, C, A> {
    /// Constructs an empty tree with room for `capacity` elements, ordered
    /// by `compare` and allocating from `alloc`. A capacity of zero is
    /// treated as one.
    pub fn with_compare_in(capacity: usize, compare: C, alloc: A) -> Result<Self, Error> {
        Ok(Tree {
            len: 0,
            buf: Buffer::with_capacity_in(capacity, alloc)?,
            compare,
        })
    }

    /// Returns the comparator ordering this tree.
    #[inline]
    pub fn comparator(&self) -> &C {
        &self.compare
    }

    /// Finds the parent slot for a new leaf holding `value`, and whether it
    /// goes to the parent's left.
    fn leaf_by_key(&self, value: &T, ties_left: bool) -> (usize, bool) {
        if self.len == 0 {
            return (0, false);
        }

        let mut slot = ROOT;
        loop {
            let node = self.node(slot);
            let ord = self.compare.compare(value, &node.value);
            let go_left = ord == Ordering::Less || (ties_left && ord == Ordering::Equal);
            let next = if go_left { node.left } else { node.right };
            if next == 0 {
                return (slot, go_left);
            }
            slot = next;
        }
    }

    /// Returns the slot and rank of the first (or last) element equal to
    /// `probe`.
    fn find(&self, probe: &T, leftmost: bool) -> Option<(usize, usize)> {
        let mut slot = if self.len == 0 { 0 } else { ROOT };
        let mut before = 0;
        let mut found = None;

        while slot != 0 {
            let node = self.node(slot);
            match self.compare.compare(probe, &node.value) {
                Ordering::Less => slot = node.left,
                Ordering::Greater => {
                    before += self.size(node.left) + 1;
                    slot = node.right;
                }
                Ordering::Equal => {
                    let rank = before + self.size(node.left) + 1;
                    found = Some((slot, rank));
                    if leftmost {
                        slot = node.left;
                    } else {
                        before = rank;
                        slot = node.right;
                    }
                }
            }
        }

        found
    }

    /// Inserts an element, placing it before any elements equal to it.
    ///
    /// If the pool is full and the allocator denies growing it, the tree is
    /// left unchanged and `value` is handed back.
    ///
    /// # Examples
    /// ```
    /// let mut tree = sheaf::Tree::with_compare(|a: &(u8, char), b: &(u8, char)| a.0.cmp(&b.0)).unwrap();
    /// tree.add_left((1, 'a')).unwrap();
    /// tree.add_left((1, 'b')).unwrap();
    /// assert_eq!(tree.get_at(1), Some(&(1, 'b')));
    /// ```
    pub fn add_left(&mut self, value: T) -> Result<(), Failure<T>> {
        let (parent, as_left) = self.leaf_by_key(&value, true);
        self.attach(parent, as_left, value)
    }

    /// Inserts an element, placing it after any elements equal to it.
    ///
    /// If the pool is full and the allocator denies growing it, the tree is
    /// left unchanged and `value` is handed back.
    pub fn add_right(&mut self, value: T) -> Result<(), Failure<T>> {
        let (parent, as_left) = self.leaf_by_key(&value, false);
        self.attach(parent, as_left, value)
    }

    /// Locates the first element equal to `probe`, returning its rank along
    /// with a reference to it, or [`Error::NotFound`].
    pub fn search_left(&self, probe: &T) -> Result<(usize, &T), Error> {
        match self.find(probe, true) {
            Some((slot, rank)) => Ok((rank, &self.node(slot).value)),
            None => Err(Error::NotFound),
        }
    }

    /// Locates the last element equal to `probe`, returning its rank along
    /// with a reference to it, or [`Error::NotFound`].
    pub fn search_right(&self, probe: &T) -> Result<(usize, &T), Error> {
        match self.find(probe, false) {
            Some((slot, rank)) => Ok((rank, &self.node(slot).value)),
            None => Err(Error::NotFound),
        }
    }

    /// Removes and returns the first element equal to `probe`.
    ///
    /// If no element matches, `probe` is handed back with
    /// [`Error::NotFound`]. If the removal leaves the pool sparse but the
    /// allocator denies shrinking it, the element is still removed and
    /// handed back inside a [`Failure`] of kind [`Error::AllocationFailure`].
    ///
    /// # Examples
    /// ```
    /// let mut tree = sheaf::Tree::new().unwrap();
    /// tree.add_right(7u16).unwrap();
    /// assert_eq!(tree.remove_left(7).ok(), Some(7));
    /// let miss = tree.remove_left(7).unwrap_err();
    /// assert_eq!(miss.kind(), sheaf::Error::NotFound);
    /// ```
    pub fn remove_left(&mut self, probe: T) -> Result<T, Failure<T>> {
        match self.find(&probe, true) {
            Some((slot, _)) => self.remove_slot(slot, true),
            None => Err(Failure::new(Error::NotFound, probe)),
        }
    }

    /// Removes and returns the last element equal to `probe`.
    ///
    /// Misses and shrinking failures are reported as for
    /// [`remove_left`](Tree::remove_left).
    pub fn remove_right(&mut self, probe: T) -> Result<T, Failure<T>> {
        match self.find(&probe, false) {
            Some((slot, _)) => self.remove_slot(slot, false),
            None => Err(Failure::new(Error::NotFound, probe)),
        }
    }

    #[cfg(test)]
    pub(crate) fn check_order(&self) {
        let mut prev: Option<&T> = None;
        for x in self.iter() {
            if let Some(p) = prev {
                assert_ne!(self.compare.compare(p, x), Ordering::Greater);
            }
            prev = Some(x);
        }
    }
}

impl<T, C, A: Allocator> Tree<T, C, A> {
    /// Returns the number of elements the pool can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns the number of elements in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` exactly when the tree contains zero elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the allocator backing this tree.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    #[inline(always)]
    fn node(&self, slot: usize) -> &Node<T> {
        unsafe { &*self.buf.at(slot) }
    }

    #[inline(always)]
    fn node_mut(&mut self, slot: usize) -> &mut Node<T> {
        unsafe { &mut *self.buf.at(slot) }
    }

    #[inline(always)]
    fn size(&self, slot: usize) -> usize {
        if slot == 0 {
            0
        } else {
            self.node(slot).size
        }
    }

    fn leftmost(&self, mut slot: usize) -> usize {
        while self.node(slot).left != 0 {
            slot = self.node(slot).left;
        }
        slot
    }

    fn rightmost(&self, mut slot: usize) -> usize {
        while self.node(slot).right != 0 {
            slot = self.node(slot).right;
        }
        slot
    }

    /// Returns the slot holding the element at `rank`, which must be valid.
    fn select(&self, mut rank: usize) -> usize {
        let mut slot = ROOT;
        loop {
            let node = self.node(slot);
            let left = self.size(node.left);
            match rank.cmp(&(left + 1)) {
                Ordering::Less => slot = node.left,
                Ordering::Equal => return slot,
                Ordering::Greater => {
                    rank -= left + 1;
                    slot = node.right;
                }
            }
        }
    }

    fn leaf_by_rank(&self, mut rank: usize) -> (usize, bool) {
        if self.len == 0 {
            return (0, false);
        }

        let mut slot = ROOT;
        loop {
            let node = self.node(slot);
            let left = self.size(node.left);
            if rank <= left + 1 {
                if node.left == 0 {
                    return (slot, true);
                }
                slot = node.left;
            } else {
                rank -= left + 1;
                if node.right == 0 {
                    return (slot, false);
                }
                slot = node.right;
            }
        }
    }

    fn grow(&mut self) -> Result<(), Error> {
        let capacity = self.buf.capacity();
        if self.len < capacity {
            return Ok(());
        }
        let target = grow_target(capacity, capacity + 1)?;
        self.buf.resize(target)
    }

    fn shrink(&mut self) -> Result<(), Error> {
        match shrink_target(self.len, self.buf.capacity()) {
            Some(target) => self.buf.resize(target),
            None => Ok(()),
        }
    }

    /// Links a new leaf below `parent`, then restores sizes and balance.
    fn attach(&mut self, parent: usize, as_left: bool, value: T) -> Result<(), Failure<T>> {
        if let Err(e) = self.grow() {
            return Err(Failure::new(e, value));
        }

        let slot = self.len + 1;
        let leaf = Node {
            parent,
            left: 0,
            right: 0,
            size: 1,
            balance: Balance::Even,
            value,
        };
        unsafe { self.buf.at(slot).write(leaf) };
        self.len = slot;

        if parent == 0 {
            return Ok(());
        }

        if as_left {
            self.node_mut(parent).left = slot;
        } else {
            self.node_mut(parent).right = slot;
        }

        let mut ancestor = parent;
        while ancestor != 0 {
            let node = self.node_mut(ancestor);
            node.size += 1;
            ancestor = node.parent;
        }

        self.rebalance_after_insert(slot);
        Ok(())
    }

    fn swap_values(&mut self, a: usize, b: usize) {
        unsafe {
            let a = self.buf.at(a);
            let b = self.buf.at(b);
            ptr::swap(addr_of_mut!((*a).value), addr_of_mut!((*b).value));
        }
    }

    /// Rotates the subtree at `x` to the left, where `bx` and `bz` are the
    /// balance factors of `x` and of its right child. Either may be out of
    /// the stored range.
    ///
    /// The subtree stays rooted at slot `x`; the former root moves down into
    /// the slot of its right child. The balance of the new top is returned
    /// rather than stored, since a double rotation passes it through a
    /// value of 2.
    fn rotate_left(&mut self, x: usize, bx: i8, bz: i8) -> i8 {
        let z = self.node(x).right;
        let a = self.node(x).left;
        let (b, c) = (self.node(z).left, self.node(z).right);

        self.swap_values(x, z);
        let top = self.node_mut(x);
        top.left = z;
        top.right = c;
        let low = self.node_mut(z);
        low.left = a;
        low.right = b;
        if a != 0 {
            self.node_mut(a).parent = z;
        }
        if c != 0 {
            self.node_mut(c).parent = x;
        }

        let size = 1 + self.size(a) + self.size(b);
        let nbx = bx - 1 - bz.max(0);
        let nbz = bz - 1 + nbx.min(0);
        let low = self.node_mut(z);
        low.size = size;
        low.balance = Balance::from_factor(nbx);
        nbz
    }

    /// Mirror image of [`rotate_left`](Tree::rotate_left).
    fn rotate_right(&mut self, x: usize, bx: i8, bz: i8) -> i8 {
        let z = self.node(x).left;
        let c = self.node(x).right;
        let (a, b) = (self.node(z).left, self.node(z).right);

        self.swap_values(x, z);
        let top = self.node_mut(x);
        top.left = a;
        top.right = z;
        let low = self.node_mut(z);
        low.left = b;
        low.right = c;
        if a != 0 {
            self.node_mut(a).parent = x;
        }
        if c != 0 {
            self.node_mut(c).parent = z;
        }

        let size = 1 + self.size(b) + self.size(c);
        let nbx = bx + 1 - bz.min(0);
        let nbz = bz + 1 + nbx.max(0);
        let low = self.node_mut(z);
        low.size = size;
        low.balance = Balance::from_factor(nbx);
        nbz
    }

    /// Fixes a right-leaning overload at `x`. Returns the former balance of
    /// the right child, which decides whether the subtree height changed.
    fn fix_right_heavy(&mut self, x: usize) -> i8 {
        let z = self.node(x).right;
        let bz = self.node(z).balance.factor();
        let pivot = if bz < 0 {
            let by = self.node(self.node(z).left).balance.factor();
            self.rotate_right(z, bz, by)
        } else {
            bz
        };
        let top = self.rotate_left(x, 2, pivot);
        self.node_mut(x).balance = Balance::from_factor(top);
        bz
    }

    fn fix_left_heavy(&mut self, x: usize) -> i8 {
        let z = self.node(x).left;
        let bz = self.node(z).balance.factor();
        let pivot = if bz > 0 {
            let by = self.node(self.node(z).right).balance.factor();
            self.rotate_left(z, bz, by)
        } else {
            bz
        };
        let top = self.rotate_right(x, -2, pivot);
        self.node_mut(x).balance = Balance::from_factor(top);
        bz
    }

    fn rebalance_after_insert(&mut self, leaf: usize) {
        let mut child = leaf;
        let mut slot = self.node(child).parent;

        while slot != 0 {
            let node = self.node(slot);
            let factor = node.balance.factor() + if node.left == child { -1 } else { 1 };
            match factor {
                0 => {
                    self.node_mut(slot).balance = Balance::Even;
                    return;
                }
                -1 | 1 => {
                    let node = self.node_mut(slot);
                    node.balance = Balance::from_factor(factor);
                    child = slot;
                    slot = node.parent;
                }
                2 => {
                    self.fix_right_heavy(slot);
                    return;
                }
                _ => {
                    self.fix_left_heavy(slot);
                    return;
                }
            }
        }
    }

    /// Walks up from `slot`, whose subtree on the `from_left` side just lost
    /// one level of height, until the height change is absorbed.
    fn rebalance_after_removal(&mut self, mut slot: usize, mut from_left: bool) {
        loop {
            let factor = self.node(slot).balance.factor() + if from_left { 1 } else { -1 };
            match factor {
                -1 | 1 => {
                    self.node_mut(slot).balance = Balance::from_factor(factor);
                    return;
                }
                0 => self.node_mut(slot).balance = Balance::Even,
                2 => {
                    if self.fix_right_heavy(slot) == 0 {
                        return;
                    }
                }
                _ => {
                    if self.fix_left_heavy(slot) == 0 {
                        return;
                    }
                }
            }

            let parent = self.node(slot).parent;
            if parent == 0 {
                return;
            }
            from_left = self.node(parent).left == slot;
            slot = parent;
        }
    }

    /// Moves the payload of `source` into `target`, returning the payload
    /// `target` held. Leaves `source` logically uninitialized.
    unsafe fn take_and_refill(&mut self, target: usize, source: usize) -> T {
        let target = self.buf.at(target);
        let source = self.buf.at(source);
        let out = ptr::read(addr_of!((*target).value));
        ptr::copy_nonoverlapping(addr_of!((*source).value), addr_of_mut!((*target).value), 1);
        out
    }

    /// Moves the node in the last slot into `freed`, which must be detached
    /// from the tree, and repairs the references to it.
    fn compact(&mut self, freed: usize) {
        let last = self.len;
        if freed != last {
            unsafe { ptr::copy_nonoverlapping(self.buf.at(last), self.buf.at(freed), 1) };
            let (parent, left, right) = {
                let node = self.node(freed);
                (node.parent, node.left, node.right)
            };
            let up = self.node_mut(parent);
            if up.left == last {
                up.left = freed;
            } else {
                up.right = freed;
            }
            if left != 0 {
                self.node_mut(left).parent = freed;
            }
            if right != 0 {
                self.node_mut(right).parent = freed;
            }
        }
        self.len = last - 1;
    }

    /// Unlinks the element in `target` and returns it, keeping the pool
    /// compact. A node with two children takes over the payload of its
    /// in-order predecessor or successor, whose node is unlinked instead.
    fn delete(&mut self, target: usize, predecessor: bool) -> T {
        let (left, right) = (self.node(target).left, self.node(target).right);

        let (removed, spliced) = if left != 0 && right != 0 {
            let neighbor = if predecessor {
                self.rightmost(left)
            } else {
                self.leftmost(right)
            };
            (unsafe { self.take_and_refill(target, neighbor) }, neighbor)
        } else if target == ROOT && (left | right) != 0 {
            // the single child of the root is a leaf
            let child = left | right;
            let removed = unsafe { self.take_and_refill(ROOT, child) };
            let root = self.node_mut(ROOT);
            root.left = 0;
            root.right = 0;
            root.size = 1;
            root.balance = Balance::Even;
            self.compact(child);
            return removed;
        } else {
            let removed = unsafe { ptr::read(addr_of!((*self.buf.at(target)).value)) };
            (removed, target)
        };

        if spliced == ROOT {
            self.len = 0;
            return removed;
        }

        let node = self.node(spliced);
        let parent = node.parent;
        let child = if node.left != 0 { node.left } else { node.right };
        let from_left = self.node(parent).left == spliced;
        if from_left {
            self.node_mut(parent).left = child;
        } else {
            self.node_mut(parent).right = child;
        }
        if child != 0 {
            self.node_mut(child).parent = parent;
        }

        let mut ancestor = parent;
        while ancestor != 0 {
            let node = self.node_mut(ancestor);
            node.size -= 1;
            ancestor = node.parent;
        }

        self.rebalance_after_removal(parent, from_left);
        self.compact(spliced);
        removed
    }

    fn remove_slot(&mut self, slot: usize, predecessor: bool) -> Result<T, Failure<T>> {
        let value = self.delete(slot, predecessor);
        match self.shrink() {
            Ok(()) => Ok(value),
            Err(e) => Err(Failure::new(e, value)),
        }
    }

    /// Inserts an element at in-order position `rank`, disregarding the
    /// comparator. Keeping the tree sorted is up to the caller.
    ///
    /// If the pool is full and the allocator denies growing it, the tree is
    /// left unchanged and `value` is handed back.
    ///
    /// # Panics
    /// Panics if `rank` is zero or greater than `len() + 1`.
    ///
    /// # Examples
    /// ```
    /// let mut tree = sheaf::Tree::new().unwrap();
    /// tree.add_at(1, 'c').unwrap();
    /// tree.add_at(1, 'a').unwrap();
    /// tree.add_at(2, 'b').unwrap();
    /// assert_eq!(tree.iter().collect::<String>(), "abc");
    /// ```
    pub fn add_at(&mut self, rank: usize, value: T) -> Result<(), Failure<T>> {
        if rank == 0 || rank > self.len + 1 {
            panic!("rank out of bounds in `add_at`");
        }
        let (parent, as_left) = self.leaf_by_rank(rank);
        self.attach(parent, as_left, value)
    }

    /// Removes and returns the element at in-order position `rank`.
    ///
    /// Shrinking failures are reported as for
    /// [`remove_left`](Tree::remove_left).
    ///
    /// # Panics
    /// Panics if `rank` is zero or greater than `len()`.
    pub fn remove_at(&mut self, rank: usize) -> Result<T, Failure<T>> {
        if rank == 0 || rank > self.len {
            panic!("rank out of bounds in `remove_at`");
        }
        let slot = self.select(rank);
        let predecessor = self.node(slot).balance == Balance::LeftHeavy;
        self.remove_slot(slot, predecessor)
    }

    /// Returns a reference to the element at in-order position `rank`, or
    /// [`None`] if `rank` is zero or greater than `len()`.
    pub fn get_at(&self, rank: usize) -> Option<&T> {
        if rank == 0 || rank > self.len {
            return None;
        }
        Some(&self.node(self.select(rank)).value)
    }

    /// Places `value` at in-order position `rank`, returning the element
    /// previously stored there. Keeping the tree sorted is up to the caller.
    ///
    /// # Panics
    /// Panics if `rank` is zero or greater than `len()`.
    pub fn set_at(&mut self, rank: usize, value: T) -> T {
        if rank == 0 || rank > self.len {
            panic!("rank out of bounds in `set_at`");
        }
        let slot = self.select(rank);
        core::mem::replace(&mut self.node_mut(slot).value, value)
    }

    /// Returns an iterator over the elements in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        let nodes = unsafe { core::slice::from_raw_parts(self.buf.at(1) as *const Node<T>, self.len) };
        Iter::new(nodes)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(self.capacity() >= 1);
        assert!(self.len <= self.capacity());
        if self.len == 0 {
            return;
        }

        assert_eq!(self.node(ROOT).parent, 0);
        let (size, _) = self.check_subtree(ROOT);
        assert_eq!(size, self.len);

        assert_eq!(self.iter().len(), self.len);
        for (i, x) in self.iter().enumerate() {
            assert!(ptr::eq(x, self.get_at(i + 1).unwrap()));
        }
    }

    #[cfg(test)]
    fn check_subtree(&self, slot: usize) -> (usize, i32) {
        if slot == 0 {
            return (0, 0);
        }

        assert!(slot <= self.len);
        let node = self.node(slot);
        for child in [node.left, node.right] {
            if child != 0 {
                assert_eq!(self.node(child).parent, slot);
            }
        }

        let (left_size, left_height) = self.check_subtree(node.left);
        let (right_size, right_height) = self.check_subtree(node.right);
        assert_eq!(node.size, 1 + left_size + right_size);
        assert_eq!(right_height - left_height, node.balance.factor() as i32);
        (node.size, 1 + left_height.max(right_height))
    }
}

impl<T, C, A: Allocator> Drop for Tree<T, C, A> {
    fn drop(&mut self) {
        for slot in 1..=self.len {
            unsafe { ptr::drop_in_place(addr_of_mut!((*self.buf.at(slot)).value)) };
        }
    }
}

impl<T: Debug, C, A: Allocator> Debug for Tree<T, C, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, C, A: Allocator> IntoIterator for &'a Tree<T, C, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
