//! A path-compressed binary trie stored in a compact node pool.
//!
//! Elements are keyed by the bit string a [`BitView`] exposes for them.
//! Every node records the length of the key prefix it stands for, and its
//! children are selected by the key bit at that position: a set bit leads
//! left, a clear bit leads right. Bits between a node and its child are not
//! stored anywhere; lookups verify them against the element they arrive at.
//!
//! Nodes are either *active*, holding the element whose key is exactly the
//! node's prefix, or *inactive* branches. Apart from the root, which stands
//! for the empty prefix and always exists, an inactive node always has two
//! children, so the pool holds at most `2 * len() + 1` nodes. As in the
//! [`Tree`](crate::Tree), the live nodes are always the slots
//! `1..=nodes`, and freeing a node moves the last one into its place.

use core::fmt::{self, Debug, Formatter};
use core::iter::FusedIterator;
use core::mem::MaybeUninit;
use core::ptr;

use crate::allocator::{Allocator, Global};
use crate::bits::{BinaryBits, BitView};
use crate::error::{Error, Failure, Rejected};
use crate::order::Binary;
use crate::storage::{grow_target, shrink_target, Buffer};

const ROOT: usize = 1;

struct Node<T> {
    parent: usize,
    left: usize,
    right: usize,
    depth: usize,
    active: bool,
    value: MaybeUninit<T>,
}

impl<T> Node<T> {
    #[inline]
    fn child(&self, bit: bool) -> usize {
        if bit {
            self.left
        } else {
            self.right
        }
    }

    #[inline]
    fn set_child(&mut self, bit: bool, child: usize) {
        if bit {
            self.left = child;
        } else {
            self.right = child;
        }
    }

    #[inline]
    fn replace_child(&mut self, old: usize, new: usize) {
        if self.left == old {
            self.left = new;
        } else {
            debug_assert_eq!(self.right, old);
            self.right = new;
        }
    }
}

/// How an insertion attaches to the existing structure, decided before any
/// node is touched.
enum Placement {
    /// The key is the prefix of an existing node.
    Existing(usize),
    /// The key extends below a node that has no child on its side.
    Leaf { parent: usize },
    /// The key ends between `parent` and its `child`.
    Interior { parent: usize, child: usize },
    /// The key diverges from the `child` edge of `parent` at bit `at`.
    Fork { parent: usize, child: usize, at: usize },
}

impl Placement {
    fn new_nodes(&self) -> usize {
        match self {
            Placement::Existing(_) => 0,
            Placement::Leaf { .. } | Placement::Interior { .. } => 1,
            Placement::Fork { .. } => 2,
        }
    }
}

/// A compacting binary trie.
///
/// Keys come from the bit view `B`, which defaults to [`BinaryBits`]. Each
/// key is stored at most once; [`add_unique`](Trie::add_unique) and
/// [`add_replace`](Trie::add_replace) differ in what happens on collision.
///
/// # Examples
/// ```
/// let mut trie = sheaf::Trie::new().unwrap();
/// trie.add_unique(0b0000_0101u8).unwrap();
/// assert_eq!(trie.search(&0b0000_0101), Ok(&0b0000_0101));
/// assert_eq!(trie.remove(0b0000_0101).ok(), Some(0b0000_0101));
/// assert_eq!(trie.search(&0b0000_0101), Err(sheaf::Error::NotFound));
/// ```
pub struct Trie<T, B = BinaryBits, A: Allocator = Global> {
    nodes: usize,
    len: usize,
    buf: Buffer<Node<T>, A>,
    view: B,
}

impl<T: Binary> Trie<T, BinaryBits, Global> {
    /// Constructs an empty trie keyed by [`BinaryBits`], using the system
    /// allocator.
    pub fn new() -> Result<Self, Error> {
        Self::with_view_in(1, BinaryBits, Global)
    }

    /// Constructs an empty trie with room for `capacity` nodes, keyed by
    /// [`BinaryBits`] and using the system allocator.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_view_in(capacity, BinaryBits, Global)
    }
}

impl<T: Binary, A: Allocator> Trie<T, BinaryBits, A> {
    /// Constructs an empty trie keyed by [`BinaryBits`], allocating from
    /// `alloc`.
    pub fn new_in(alloc: A) -> Result<Self, Error> {
        Self::with_view_in(1, BinaryBits, alloc)
    }

    /// Constructs an empty trie with room for `capacity` nodes, keyed by
    /// [`BinaryBits`] and allocating from `alloc`.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, Error> {
        Self::with_view_in(capacity, BinaryBits, alloc)
    }
}

impl<T, B: BitView<T>> Trie<T, B, Global> {
    /// Constructs an empty trie keyed by `view`, using the system allocator.
    pub fn with_view(view: B) -> Result<Self, Error> {
        Self::with_view_in(1, view, Global)
    }
}

impl<T, B: BitView<T>, A: Allocator> Trie<T, B, A> {
    /// Constructs an empty trie with room for `capacity` nodes, keyed by
    /// `view` and allocating from `alloc`. A capacity of zero is treated as
    /// one, the slot of the root.
    pub fn with_view_in(capacity: usize, view: B, alloc: A) -> Result<Self, Error> {
        let buf: Buffer<Node<T>, A> = Buffer::with_capacity_in(capacity, alloc)?;
        let root = Node {
            parent: 0,
            left: 0,
            right: 0,
            depth: 0,
            active: false,
            value: MaybeUninit::uninit(),
        };
        unsafe { buf.at(ROOT).write(root) };

        Ok(Trie {
            nodes: 1,
            len: 0,
            buf,
            view,
        })
    }

    /// Returns the bit view keying this trie.
    #[inline]
    pub fn view(&self) -> &B {
        &self.view
    }

    /// Returns the index of the first bit where the keys of `a` and `b`
    /// differ, or the length of the shorter key if one is a prefix of the
    /// other.
    fn divergence(&self, a: &T, b: &T) -> usize {
        let shorter = usize::min(self.view.bit_len(a), self.view.bit_len(b));
        (0..shorter)
            .find(|&i| self.view.bit(a, i) != self.view.bit(b, i))
            .unwrap_or(shorter)
    }

    /// Returns any active node at or below `slot`. Only an empty trie has
    /// none.
    fn representative(&self, mut slot: usize) -> Option<usize> {
        loop {
            let node = self.node(slot);
            if node.active {
                return Some(slot);
            }
            slot = if node.left != 0 { node.left } else { node.right };
            if slot == 0 {
                return None;
            }
        }
    }

    /// Works out where `value` belongs without changing anything.
    fn place(&self, value: &T) -> Placement {
        let len = self.view.bit_len(value);

        // follow the key as far as the structure allows
        let mut slot = ROOT;
        while self.node(slot).depth < len {
            let next = self.node(slot).child(self.view.bit(value, self.node(slot).depth));
            if next == 0 {
                break;
            }
            slot = next;
        }

        // every key below `slot` agrees with `value` on the bits tested so
        // far, so any of them reveals where `value` branches off
        let rep = self.representative(slot);
        let at = match rep {
            Some(rep) => self.divergence(value, self.value(rep)),
            None => len,
        };

        let mut parent = ROOT;
        loop {
            let depth = self.node(parent).depth;
            if depth == len {
                return Placement::Existing(parent);
            }

            let child = self.node(parent).child(self.view.bit(value, depth));
            if child == 0 {
                return Placement::Leaf { parent };
            }
            if self.node(child).depth > at {
                return if at == len {
                    Placement::Interior { parent, child }
                } else {
                    Placement::Fork { parent, child, at }
                };
            }
            parent = child;
        }
    }

    fn reserve(&mut self, extra: usize) -> Result<(), Error> {
        let capacity = self.buf.capacity();
        let required = self.nodes + extra;
        if required <= capacity {
            return Ok(());
        }
        let target = grow_target(capacity, required)?;
        self.buf.resize(target)
    }

    fn push_node(&mut self, parent: usize, depth: usize, value: Option<T>) -> usize {
        let slot = self.nodes + 1;
        let node = Node {
            parent,
            left: 0,
            right: 0,
            depth,
            active: value.is_some(),
            value: match value {
                Some(v) => MaybeUninit::new(v),
                None => MaybeUninit::uninit(),
            },
        };
        unsafe { self.buf.at(slot).write(node) };
        self.nodes = slot;
        slot
    }

    /// Stores `value`, replacing the element under the same key if there is
    /// one.
    fn insert(&mut self, value: T) -> Result<Option<T>, Failure<T>> {
        let placement = self.place(&value);
        if let Err(e) = self.reserve(placement.new_nodes()) {
            return Err(Failure::new(e, value));
        }

        let len = self.view.bit_len(&value);
        match placement {
            Placement::Existing(slot) => {
                let node = self.node_mut(slot);
                if node.active {
                    let old = core::mem::replace(&mut node.value, MaybeUninit::new(value));
                    return Ok(Some(unsafe { old.assume_init() }));
                }
                node.value = MaybeUninit::new(value);
                node.active = true;
            }
            Placement::Leaf { parent } => {
                let bit = self.view.bit(&value, self.node(parent).depth);
                let leaf = self.push_node(parent, len, Some(value));
                self.node_mut(parent).set_child(bit, leaf);
            }
            Placement::Interior { parent, child } => {
                let bit = self.view.bit(&value, self.node(parent).depth);
                let below = self.view.bit(self.value_below(child), len);
                let inner = self.push_node(parent, len, Some(value));
                self.node_mut(parent).set_child(bit, inner);
                self.node_mut(inner).set_child(below, child);
                self.node_mut(child).parent = inner;
            }
            Placement::Fork { parent, child, at } => {
                let bit = self.view.bit(&value, self.node(parent).depth);
                let theirs = self.view.bit(self.value_below(child), at);
                let ours = self.view.bit(&value, at);
                debug_assert_ne!(theirs, ours);

                let fork = self.push_node(parent, at, None);
                let leaf = self.push_node(fork, len, Some(value));
                self.node_mut(parent).set_child(bit, fork);
                self.node_mut(fork).set_child(theirs, child);
                self.node_mut(fork).set_child(ours, leaf);
                self.node_mut(child).parent = fork;
            }
        }

        self.len += 1;
        Ok(None)
    }

    /// Inserts an element unless its key is already present.
    ///
    /// On collision the stored element is left untouched; the rejection
    /// hands `value` back with [`Error::AlreadyExists`] and exposes the
    /// stored element through [`Rejected::existing`]. If the pool cannot
    /// grow, the trie is left unchanged and `value` is handed back with
    /// [`Error::AllocationFailure`].
    ///
    /// # Examples
    /// ```
    /// let mut trie = sheaf::Trie::new().unwrap();
    /// trie.add_unique(42u32).unwrap();
    /// let dup = trie.add_unique(42).unwrap_err();
    /// assert_eq!(dup.kind(), sheaf::Error::AlreadyExists);
    /// assert_eq!(dup.existing(), Some(&42));
    /// assert_eq!(trie.len(), 1);
    /// ```
    pub fn add_unique(&mut self, value: T) -> Result<(), Rejected<'_, T>> {
        if let Some(slot) = self.locate(&value) {
            return Err(Rejected::duplicate(value, self.value(slot)));
        }
        match self.insert(value) {
            Ok(_) => Ok(()),
            Err(failure) => Err(failure.into()),
        }
    }

    /// Inserts an element, replacing the element stored under the same key
    /// if there is one.
    ///
    /// Returns `Some` with the replaced element on collision, and [`None`]
    /// if the key was new. If the pool cannot grow, the trie is left
    /// unchanged and `value` is handed back with
    /// [`Error::AllocationFailure`].
    pub fn add_replace(&mut self, value: T) -> Result<Option<T>, Failure<T>> {
        self.insert(value)
    }

    /// Returns the slot of the active node keyed exactly like `probe`.
    fn locate(&self, probe: &T) -> Option<usize> {
        let len = self.view.bit_len(probe);
        let mut slot = ROOT;
        while self.node(slot).depth < len {
            slot = self.node(slot).child(self.view.bit(probe, self.node(slot).depth));
            if slot == 0 {
                return None;
            }
        }

        let node = self.node(slot);
        if !node.active || node.depth != len {
            return None;
        }
        if self.divergence(probe, self.value(slot)) != len {
            return None;
        }
        Some(slot)
    }

    /// Returns the element stored under the key of `probe`, or
    /// [`Error::NotFound`].
    pub fn search(&self, probe: &T) -> Result<&T, Error> {
        match self.locate(probe) {
            Some(slot) => Ok(self.value(slot)),
            None => Err(Error::NotFound),
        }
    }

    /// Removes and returns the element stored under the key of `probe`.
    ///
    /// If no element matches, `probe` is handed back with
    /// [`Error::NotFound`]. If the removal would leave the pool sparse but
    /// the allocator denies the smaller buffer, nothing is removed and
    /// `probe` is handed back with [`Error::AllocationFailure`].
    ///
    /// Every inactive node left behind keeps two children, except the root:
    /// it stands for the empty prefix and is never freed, so after a
    /// removal it may be inactive with one child or none.
    pub fn remove(&mut self, probe: T) -> Result<T, Failure<T>> {
        let Some(slot) = self.locate(&probe) else {
            return Err(Failure::new(Error::NotFound, probe));
        };

        // plan which nodes go away along with the element
        let node = self.node(slot);
        let parent = node.parent;
        let children = (node.left != 0) as usize + (node.right != 0) as usize;
        let mut freed = [0usize; 2];
        let freed_count = if slot == ROOT || children == 2 {
            0
        } else if children == 1 {
            freed[0] = slot;
            1
        } else {
            freed[0] = slot;
            let up = self.node(parent);
            if parent != ROOT && !up.active {
                freed[1] = parent;
                2
            } else {
                1
            }
        };

        // the smaller buffer is secured before anything is unlinked
        let block = match shrink_target(self.nodes - freed_count, self.buf.capacity()) {
            Some(target) => match self.buf.reserve_block(target) {
                Ok(block) => Some(block),
                Err(e) => return Err(Failure::new(e, probe)),
            },
            None => None,
        };

        let node = self.node_mut(slot);
        node.active = false;
        let value = unsafe { node.value.assume_init_read() };
        self.len -= 1;

        match freed_count {
            1 if children == 1 => {
                let node = self.node(slot);
                let child = if node.left != 0 { node.left } else { node.right };
                self.node_mut(parent).replace_child(slot, child);
                self.node_mut(child).parent = parent;
            }
            1 => self.node_mut(parent).replace_child(slot, 0),
            2 => {
                let up = self.node(parent);
                let sibling = if up.left == slot { up.right } else { up.left };
                let grandparent = up.parent;
                self.node_mut(grandparent).replace_child(parent, sibling);
                self.node_mut(sibling).parent = grandparent;
            }
            _ => {}
        }

        // relocating in descending slot order never moves a freed node
        if freed[0] < freed[1] {
            freed.swap(0, 1);
        }
        for &hole in &freed[..freed_count] {
            self.compact(hole);
        }

        if let Some(block) = block {
            unsafe { self.buf.adopt(block, self.nodes) };
        }

        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(self.nodes >= 1);
        assert!(self.nodes <= self.capacity());
        assert!(self.nodes <= 2 * self.len + 1);

        let root = self.node(ROOT);
        assert_eq!(root.parent, 0);
        assert_eq!(root.depth, 0);

        let mut active = 0;
        for slot in 1..=self.nodes {
            let node = self.node(slot);
            for child in [node.left, node.right] {
                if child != 0 {
                    assert!(child <= self.nodes);
                    assert_eq!(self.node(child).parent, slot);
                    assert!(self.node(child).depth > node.depth);
                }
            }

            if slot != ROOT {
                let up = self.node(node.parent);
                assert!(up.left == slot || up.right == slot);
                if !node.active {
                    assert!(node.left != 0 && node.right != 0);
                }
            }

            if node.active {
                active += 1;
                let value = self.value(slot);
                assert_eq!(self.view.bit_len(value), node.depth);

                // every branch on the way down agrees with the key
                let mut below = slot;
                while below != ROOT {
                    let up = self.node(below).parent;
                    let bit = self.view.bit(value, self.node(up).depth);
                    assert_eq!(self.node(up).child(bit), below);
                    below = up;
                }
            }
        }
        assert_eq!(active, self.len);
    }
}

impl<T, B, A: Allocator> Trie<T, B, A> {
    /// Returns the number of nodes the pool can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns the number of elements in the trie.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` exactly when the trie contains zero elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the allocator backing this trie.
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

    /// Returns the element of an active node.
    #[inline(always)]
    fn value(&self, slot: usize) -> &T {
        debug_assert!(self.node(slot).active);
        unsafe { self.node(slot).value.assume_init_ref() }
    }

    /// Returns some element stored at or below the non-root node `slot`.
    fn value_below(&self, mut slot: usize) -> &T {
        while !self.node(slot).active {
            slot = self.node(slot).left;
        }
        self.value(slot)
    }

    /// Moves the node in the last slot into `hole`, which must be detached
    /// from the trie, and repairs the references to it.
    fn compact(&mut self, hole: usize) {
        let last = self.nodes;
        if hole != last {
            unsafe { ptr::copy_nonoverlapping(self.buf.at(last), self.buf.at(hole), 1) };
            let (parent, left, right) = {
                let node = self.node(hole);
                (node.parent, node.left, node.right)
            };
            self.node_mut(parent).replace_child(last, hole);
            if left != 0 {
                self.node_mut(left).parent = hole;
            }
            if right != 0 {
                self.node_mut(right).parent = hole;
            }
        }
        self.nodes = last - 1;
    }

    /// Returns an iterator over the elements in pool order.
    ///
    /// Pool order roughly follows insertion order, but removals shuffle it.
    pub fn iter(&self) -> Iter<'_, T> {
        let nodes = unsafe { core::slice::from_raw_parts(self.buf.at(ROOT) as *const Node<T>, self.nodes) };
        Iter {
            nodes,
            index: 0,
            remaining: self.len,
        }
    }
}

impl<T, B, A: Allocator> Drop for Trie<T, B, A> {
    fn drop(&mut self) {
        for slot in 1..=self.nodes {
            let node = self.node_mut(slot);
            if node.active {
                unsafe { node.value.assume_init_drop() };
            }
        }
    }
}

impl<T: Debug, B, A: Allocator> Debug for Trie<T, B, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, B, A: Allocator> IntoIterator for &'a Trie<T, B, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the elements of a [`Trie`] in pool order.
///
/// This `struct` is created by [`Trie::iter`].
pub struct Iter<'a, T> {
    nodes: &'a [Node<T>],
    index: usize,
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

        let nodes = self.nodes;
        while let Some(node) = nodes.get(self.index) {
            self.index += 1;
            if node.active {
                self.remaining -= 1;
                return Some(unsafe { node.value.assume_init_ref() });
            }
        }
        None
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
            nodes: self.nodes,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<T: Debug> Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.clone()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::testing::Switch;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;
    use std::vec::Vec;

    /// Keys pairs by their first component only.
    struct ByKey;

    impl BitView<(u8, char)> for ByKey {
        fn bit_len(&self, element: &(u8, char)) -> usize {
            BinaryBits.bit_len(&element.0)
        }

        fn bit(&self, element: &(u8, char), index: usize) -> bool {
            BinaryBits.bit(&element.0, index)
        }
    }

    fn sorted<T: Copy + Ord, B, A: Allocator>(trie: &Trie<T, B, A>) -> Vec<T> {
        let mut out: Vec<T> = trie.iter().copied().collect();
        out.sort();
        out
    }

    #[test]
    fn add_search_remove() {
        let mut trie = Trie::new().unwrap();
        trie.add_unique(0b0000_0101u8).unwrap();
        assert_eq!(trie.search(&0b0000_0101), Ok(&0b0000_0101));
        trie.check_invariants();

        assert_eq!(trie.remove(0b0000_0101).unwrap(), 0b0000_0101);
        assert_eq!(trie.search(&0b0000_0101), Err(Error::NotFound));
        assert_eq!(trie.remove(0b0000_0101).unwrap_err().into_parts(), (Error::NotFound, 0b0000_0101));
        assert!(trie.is_empty());
        trie.check_invariants();
    }

    #[test]
    fn prefix_keys_share_paths() {
        let mut trie = Trie::new().unwrap();
        // 1 has the empty key and lives in the root; 0 has eight zero bits
        for x in [1u8, 2, 3, 4, 5, 8, 0, 255, 128] {
            trie.add_unique(x).unwrap();
            trie.check_invariants();
        }
        assert_eq!(trie.len(), 9);
        for x in [1u8, 2, 3, 4, 5, 8, 0, 255, 128] {
            assert_eq!(trie.search(&x), Ok(&x));
        }
        for x in [6u8, 7, 9, 16, 127, 129] {
            assert_eq!(trie.search(&x), Err(Error::NotFound));
        }

        for x in [2u8, 1, 128, 4] {
            assert_eq!(trie.remove(x).unwrap(), x);
            trie.check_invariants();
        }
        assert_eq!(sorted(&trie), [0, 3, 5, 8, 255]);
    }

    #[test]
    fn root_may_keep_fewer_children() {
        let mut trie = Trie::new().unwrap();
        trie.add_unique(2u8).unwrap();
        trie.add_unique(3).unwrap();

        assert_eq!(trie.remove(3).unwrap(), 3);
        trie.check_invariants();
        let root = trie.node(ROOT);
        assert!(!root.active);
        assert_eq!((root.left, root.right != 0), (0, true));

        assert_eq!(trie.remove(2).unwrap(), 2);
        trie.check_invariants();
        assert_eq!((trie.node(ROOT).left, trie.node(ROOT).right), (0, 0));
        assert_eq!(trie.nodes, 1);
    }

    #[test]
    fn unique_keeps_and_replace_swaps() {
        let mut trie = Trie::with_view(ByKey).unwrap();
        trie.add_unique((9, 'a')).unwrap();
        trie.add_unique((12, 'b')).unwrap();

        let dup = trie.add_unique((9, 'z')).unwrap_err();
        assert_eq!(dup.kind(), Error::AlreadyExists);
        assert_eq!(dup.existing(), Some(&(9, 'a')));
        assert_eq!(dup.into_parts(), (Error::AlreadyExists, (9, 'z')));
        assert_eq!(trie.search(&(9, '?')), Ok(&(9, 'a')));
        assert_eq!(trie.len(), 2);

        assert_eq!(trie.add_replace((9, 'z')).unwrap(), Some((9, 'a')));
        assert_eq!(trie.search(&(9, '?')), Ok(&(9, 'z')));
        assert_eq!(trie.add_replace((3, 'c')).unwrap(), None);
        assert_eq!(trie.len(), 3);
        trie.check_invariants();
    }

    #[test]
    fn random_operations_match_a_set() {
        let mut rng = SmallRng::seed_from_u64(0xB175);
        let mut trie = Trie::new().unwrap();
        let mut model = BTreeSet::new();

        for _ in 0..5000 {
            let x = rng.gen_range(0..512u16);
            if rng.gen_bool(0.55) {
                let fresh = model.insert(x);
                match trie.add_unique(x) {
                    Ok(()) => assert!(fresh),
                    Err(dup) => {
                        assert!(!fresh);
                        assert_eq!(dup.kind(), Error::AlreadyExists);
                    }
                }
            } else {
                let present = model.remove(&x);
                match trie.remove(x) {
                    Ok(removed) => {
                        assert!(present);
                        assert_eq!(removed, x);
                    }
                    Err(miss) => {
                        assert!(!present);
                        assert_eq!(miss.kind(), Error::NotFound);
                    }
                }
            }

            trie.check_invariants();
            assert_eq!(trie.len(), model.len());
        }

        assert_eq!(sorted(&trie), model.iter().copied().collect::<Vec<_>>());
        for x in 0..512u16 {
            assert_eq!(trie.search(&x).is_ok(), model.contains(&x));
        }
    }

    #[test]
    fn denied_growth_leaves_trie_unchanged() {
        let switch = Switch::default();
        let mut trie = Trie::new_in(&switch).unwrap();
        trie.add_unique(6u8).unwrap();
        assert_eq!(trie.capacity(), 2);

        switch.deny();
        let failure = trie.add_unique(5).unwrap_err();
        assert_eq!(failure.into_parts(), (Error::AllocationFailure, 5));
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.capacity(), 2);
        trie.check_invariants();

        // the root needs no new node
        trie.add_unique(1).unwrap();
        assert_eq!(trie.search(&1), Ok(&1));
    }

    #[test]
    fn denied_shrink_rolls_back() {
        let switch = Switch::default();
        let mut trie = Trie::new_in(&switch).unwrap();
        for x in 0..32u8 {
            trie.add_unique(x).unwrap();
        }
        let capacity = trie.capacity();

        switch.deny();
        let mut denied = None;
        for x in 0..32u8 {
            let before = trie.len();
            match trie.remove(x) {
                Ok(removed) => assert_eq!(removed, x),
                Err(failure) => {
                    assert_eq!(failure.into_parts(), (Error::AllocationFailure, x));
                    assert_eq!(trie.len(), before);
                    assert_eq!(trie.search(&x), Ok(&x));
                    denied = Some(x);
                    break;
                }
            }
            trie.check_invariants();
        }
        let x = denied.unwrap();
        assert_eq!(trie.capacity(), capacity);
        trie.check_invariants();

        switch.allow();
        assert_eq!(trie.remove(x).unwrap(), x);
        assert!(trie.capacity() < capacity);
        trie.check_invariants();
    }

    #[test]
    fn iterator_covers_every_element() {
        let mut trie = Trie::new().unwrap();
        for x in [40u32, 7, 1, 0, 99, 1024] {
            trie.add_unique(x).unwrap();
        }

        let mut iter = trie.iter();
        assert_eq!(iter.len(), 6);
        let mut seen = Vec::new();
        while let Ok(x) = iter.try_next() {
            seen.push(*x);
        }
        assert_eq!(iter.try_next(), Err(Error::Stop));
        seen.sort();
        assert_eq!(seen, [0, 1, 7, 40, 99, 1024]);
    }

    #[test]
    fn drops_every_element() {
        use std::rc::Rc;

        struct ByTag;
        impl BitView<(u8, Rc<()>)> for ByTag {
            fn bit_len(&self, element: &(u8, Rc<()>)) -> usize {
                BinaryBits.bit_len(&element.0)
            }
            fn bit(&self, element: &(u8, Rc<()>), index: usize) -> bool {
                BinaryBits.bit(&element.0, index)
            }
        }

        let token = Rc::new(());
        {
            let mut trie = Trie::with_view(ByTag).unwrap();
            for tag in 0..20 {
                trie.add_unique((tag, Rc::clone(&token))).unwrap();
            }
            drop(trie.add_replace((3, Rc::clone(&token))).unwrap());
            drop(trie.remove((4, Rc::clone(&token))).unwrap());
            assert_eq!(Rc::strong_count(&token), 20);
        }
        assert_eq!(Rc::strong_count(&token), 1);
    }
}
