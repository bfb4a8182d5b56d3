//! Property-based checks of the container contracts.

use proptest::prelude::*;
use sheaf::{Error, Sequence, Tree, Trie};
use std::cmp::Ordering;
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone)]
enum SeqOp {
    AddFirst(i32),
    AddLast(i32),
    AddAt(usize, i32),
    RemoveFirst,
    RemoveLast,
    RemoveAt(usize),
    SetAt(usize, i32),
}

fn seq_ops() -> impl Strategy<Value = Vec<SeqOp>> {
    prop::collection::vec(
        prop_oneof![
            any::<i32>().prop_map(SeqOp::AddFirst),
            any::<i32>().prop_map(SeqOp::AddLast),
            (any::<usize>(), any::<i32>()).prop_map(|(i, x)| SeqOp::AddAt(i, x)),
            Just(SeqOp::RemoveFirst),
            Just(SeqOp::RemoveLast),
            any::<usize>().prop_map(SeqOp::RemoveAt),
            (any::<usize>(), any::<i32>()).prop_map(|(i, x)| SeqOp::SetAt(i, x)),
        ],
        0..400,
    )
}

proptest! {
    #[test]
    fn prop_sequence_tracks_deque(ops in seq_ops()) {
        let mut seq = Sequence::new().unwrap();
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                SeqOp::AddFirst(x) => {
                    seq.add_first(x).unwrap();
                    model.push_front(x);
                }
                SeqOp::AddLast(x) => {
                    seq.add_last(x).unwrap();
                    model.push_back(x);
                }
                SeqOp::AddAt(i, x) => {
                    let index = i % (model.len() + 1) + 1;
                    seq.add_at(index, x).unwrap();
                    model.insert(index - 1, x);
                }
                SeqOp::RemoveFirst if !model.is_empty() => {
                    prop_assert_eq!(Some(seq.remove_first().unwrap()), model.pop_front());
                }
                SeqOp::RemoveLast if !model.is_empty() => {
                    prop_assert_eq!(Some(seq.remove_last().unwrap()), model.pop_back());
                }
                SeqOp::RemoveAt(i) if !model.is_empty() => {
                    let index = i % model.len() + 1;
                    prop_assert_eq!(Some(seq.remove_at(index).unwrap()), model.remove(index - 1));
                }
                SeqOp::SetAt(i, x) if !model.is_empty() => {
                    let index = i % model.len() + 1;
                    let old = std::mem::replace(&mut model[index - 1], x);
                    prop_assert_eq!(seq.set_at(index, x), old);
                }
                _ => {}
            }

            prop_assert!(seq.capacity() >= 1);
            prop_assert!(seq.len() <= seq.capacity());
            prop_assert_eq!(seq.len(), model.len());
        }

        for (i, x) in model.iter().enumerate() {
            prop_assert_eq!(seq.get_at(i + 1), Some(x));
        }
        prop_assert_eq!(seq.iter().len(), model.len());
    }

    #[test]
    fn prop_tree_iterates_sorted_multiset(values in prop::collection::vec(any::<u32>(), 0..500)) {
        let mut tree = Tree::new().unwrap();
        for &x in &values {
            tree.add_right(x).unwrap();
        }

        let mut sorted = values.clone();
        sorted.sort();
        prop_assert_eq!(tree.len(), values.len());
        prop_assert_eq!(tree.iter().copied().collect::<Vec<_>>(), sorted.clone());
        for (i, x) in sorted.iter().enumerate() {
            prop_assert_eq!(tree.get_at(i + 1), Some(x));
        }
    }

    #[test]
    fn prop_tree_duplicates_leave_in_order(ids in 1usize..40) {
        let by_key = |a: &(u8, usize), b: &(u8, usize)| -> Ordering { a.0.cmp(&b.0) };
        let mut tree = Tree::with_compare(by_key).unwrap();
        for id in 0..ids {
            tree.add_right((5, id)).unwrap();
            tree.add_right(([0u8, 3, 9][id % 3], usize::MAX)).unwrap();
        }

        let mut low = 0;
        let mut high = ids;
        while low < high {
            let (_, left) = tree.remove_left((5, 0)).unwrap();
            prop_assert_eq!(left, low);
            low += 1;
            if low < high {
                let (_, right) = tree.remove_right((5, 0)).unwrap();
                high -= 1;
                prop_assert_eq!(right, high);
            }
        }
        prop_assert_eq!(tree.search_left(&(5, 0)).err(), Some(Error::NotFound));
    }

    #[test]
    fn prop_trie_is_a_set(
        values in prop::collection::vec(any::<u16>(), 0..400),
        removals in prop::collection::vec(any::<u16>(), 0..400),
    ) {
        let mut trie = Trie::new().unwrap();
        let mut model = BTreeSet::new();

        for &x in &values {
            let fresh = model.insert(x);
            prop_assert_eq!(trie.add_unique(x).is_ok(), fresh);
        }
        for &x in &removals {
            let present = model.remove(&x);
            prop_assert_eq!(trie.remove(x).is_ok(), present);
        }

        prop_assert_eq!(trie.len(), model.len());
        prop_assert!(trie.capacity() <= 4 * (2 * model.len() + 1));
        let mut seen: Vec<u16> = trie.iter().copied().collect();
        seen.sort();
        prop_assert_eq!(seen, model.iter().copied().collect::<Vec<_>>());
        for &x in &values {
            prop_assert_eq!(trie.search(&x).is_ok(), model.contains(&x));
        }
    }
}
