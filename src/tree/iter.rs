use core::fmt::{self, Debug, Formatter};
use core::iter::FusedIterator;

use super::{Node, ROOT};
use crate::error::Error;

/// An ascending in-order iterator over the elements of a [`Tree`](super::Tree).
///
/// This `struct` is created by [`Tree::iter`](super::Tree::iter). It walks
/// the tree through parent links, so it needs no stack of its own.
pub struct Iter<'a, T> {
    nodes: &'a [Node<T>],
    cursor: usize,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(nodes: &'a [Node<T>]) -> Self {
        let mut iter = Iter {
            nodes,
            cursor: 0,
            remaining: nodes.len(),
        };
        if !nodes.is_empty() {
            iter.cursor = iter.leftmost(ROOT);
        }
        iter
    }

    #[inline(always)]
    fn node(&self, slot: usize) -> &'a Node<T> {
        &self.nodes[slot - 1]
    }

    fn leftmost(&self, mut slot: usize) -> usize {
        while self.node(slot).left != 0 {
            slot = self.node(slot).left;
        }
        slot
    }

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

        let current = self.node(self.cursor);
        self.cursor = if current.right != 0 {
            self.leftmost(current.right)
        } else {
            // ascend until we leave a left subtree
            let mut child = self.cursor;
            let mut parent = current.parent;
            while parent != 0 && self.node(parent).right == child {
                child = parent;
                parent = self.node(parent).parent;
            }
            parent
        };

        self.remaining -= 1;
        Some(&current.value)
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
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<T: Debug> Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
