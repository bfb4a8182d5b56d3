use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::{rngs::SmallRng, seq::SliceRandom, RngCore, SeedableRng};
use std::collections::{BTreeMap, VecDeque};

use sheaf::{Sequence, Tree, Trie};

const SEED: u64 = 0x5432_1012_3454_3210;
const SIZES: [usize; 4] = [16, 64, 256, 1024];

fn random_keys(n: usize) -> Vec<u32> {
    let mut rng = SmallRng::seed_from_u64(SEED);
    (0..n).map(|_| rng.next_u32()).collect()
}

fn sequence_ends(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequence_ends");
    for n in SIZES {
        group.bench_with_input(BenchmarkId::new("sheaf", n), &n, |b, &n| {
            b.iter(|| {
                let mut seq = Sequence::new().unwrap();
                for i in 0..n {
                    if i % 2 == 0 {
                        seq.add_last(i).unwrap();
                    } else {
                        seq.add_first(i).unwrap();
                    }
                }
                while !seq.is_empty() {
                    black_box(seq.remove_first().unwrap());
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("std_vec_deque", n), &n, |b, &n| {
            b.iter(|| {
                let mut seq = VecDeque::new();
                for i in 0..n {
                    if i % 2 == 0 {
                        seq.push_back(i);
                    } else {
                        seq.push_front(i);
                    }
                }
                while let Some(x) = seq.pop_front() {
                    black_box(x);
                }
            })
        });
    }
    group.finish();
}

fn sequence_middle(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequence_middle");
    for n in SIZES {
        group.bench_with_input(BenchmarkId::new("sheaf", n), &n, |b, &n| {
            b.iter(|| {
                let mut seq = Sequence::new().unwrap();
                for i in 0..n {
                    seq.add_at(seq.len() / 2 + 1, i).unwrap();
                }
                while !seq.is_empty() {
                    black_box(seq.remove_at(seq.len() / 2 + 1).unwrap());
                }
            })
        });
    }
    group.finish();
}

fn tree_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_inserts");
    for n in SIZES {
        let keys = random_keys(n);
        group.bench_with_input(BenchmarkId::new("sheaf", n), &keys, |b, keys| {
            b.iter(|| {
                let mut tree = Tree::with_capacity(keys.len()).unwrap();
                for &k in keys {
                    tree.add_right(k).unwrap();
                }
                tree
            })
        });
        group.bench_with_input(BenchmarkId::new("std_btree_map", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map = BTreeMap::new();
                for &k in keys {
                    *map.entry(k).or_insert(0u32) += 1;
                }
                map
            })
        });
    }
    group.finish();
}

fn tree_rank_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_rank_lookups");
    for n in SIZES {
        let mut tree = Tree::new().unwrap();
        for k in random_keys(n) {
            tree.add_right(k).unwrap();
        }
        let mut rng = SmallRng::seed_from_u64(SEED);
        group.bench_with_input(BenchmarkId::new("sheaf", n), &n, |b, &n| {
            b.iter(|| {
                let rank = rng.next_u32() as usize % n + 1;
                black_box(tree.get_at(rank))
            })
        });
    }
    group.finish();
}

fn tree_removals(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_removals");
    for n in SIZES {
        let mut keys = random_keys(n);
        let mut rng = SmallRng::seed_from_u64(SEED);
        group.bench_with_input(BenchmarkId::new("sheaf", n), &n, |b, _| {
            b.iter_batched(
                || {
                    let mut tree = Tree::new().unwrap();
                    for &k in &keys {
                        tree.add_right(k).unwrap();
                    }
                    keys.shuffle(&mut rng);
                    (tree, keys.clone())
                },
                |(mut tree, order)| {
                    for k in order {
                        black_box(tree.remove_left(k).unwrap());
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn trie_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_operations");
    for n in SIZES {
        let keys = random_keys(n);
        group.bench_with_input(BenchmarkId::new("insert", n), &keys, |b, keys| {
            b.iter(|| {
                let mut trie = Trie::new().unwrap();
                for &k in keys {
                    let _ = trie.add_unique(k);
                }
                trie
            })
        });

        let mut trie = Trie::new().unwrap();
        for &k in &keys {
            let _ = trie.add_unique(k);
        }
        let mut rng = SmallRng::seed_from_u64(SEED);
        group.bench_with_input(BenchmarkId::new("search", n), &keys, |b, keys| {
            b.iter(|| {
                let k = keys[rng.next_u32() as usize % keys.len()];
                black_box(trie.search(&k).is_ok())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    sequence_ends,
    sequence_middle,
    tree_inserts,
    tree_rank_lookups,
    tree_removals,
    trie_operations
);
criterion_main!(benches);
