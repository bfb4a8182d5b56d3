#![no_std]
#![warn(missing_docs)]

//! Growable containers with injectable allocation.
//!
//! Three containers share one discipline: a single owned buffer obtained
//! from an [`Allocator`], doubled when full and quartered when sparse, and
//! a closed set of [`Error`] outcomes instead of panics on allocation
//! failure.
//!
//! * [`Sequence`] is a ring-buffer deque addressable by position.
//! * [`Tree`] is an order-statistic AVL tree, addressable by key and rank.
//! * [`Trie`] is a path-compressed binary trie over a [`BitView`] of its
//!   elements.
//!
//! All positions and ranks are 1-based.

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod allocator;
pub mod arena;
pub mod bits;
pub mod error;
pub mod order;
pub mod sequence;
mod storage;
pub mod tree;
pub mod trie;

pub use crate::allocator::{Allocator, Global};
pub use crate::arena::Arena;
pub use crate::bits::{BinaryBits, BitView};
pub use crate::error::{Error, Failure, Rejected};
pub use crate::order::{Binary, BinaryOrder, Compare};
pub use crate::sequence::Sequence;
pub use crate::tree::Tree;
pub use crate::trie::Trie;
