//! One benchmark per hot operation: insert, predecessor/successor, and
//! remove, each run against a pre-populated set so the measured cost is
//! the steady-state `O(log w)` query/mutation rather than warm-up.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use fast_trie_set::OrderedIntSet;

const WIDTH: usize = 32;
const PRELOAD: u64 = 1 << 16;

fn preloaded_set() -> OrderedIntSet {
    let mut set = OrderedIntSet::new(WIDTH).unwrap();
    for k in (0..PRELOAD).map(|i| i.wrapping_mul(2_654_435_761) % (1u64 << WIDTH)) {
        set.insert(k).unwrap();
    }
    set
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_into_65536", |b| {
        b.iter_batched(
            preloaded_set,
            |mut set| {
                for k in 0..1024u64 {
                    set.insert(k.wrapping_mul(48_271) % (1u64 << WIDTH)).unwrap();
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_predecessor_successor(c: &mut Criterion) {
    let set = preloaded_set();
    c.bench_function("predecessor_successor_on_65536", |b| {
        b.iter(|| {
            for k in 0..1024u64 {
                let q = k.wrapping_mul(48_271) % (1u64 << WIDTH);
                let _ = set.predecessor(q).unwrap();
                let _ = set.successor(q).unwrap();
            }
        });
    });
}

fn bench_remove(c: &mut Criterion) {
    c.bench_function("remove_from_65536", |b| {
        b.iter_batched(
            preloaded_set,
            |mut set| {
                for k in (0..1024u64).map(|i| i.wrapping_mul(2_654_435_761) % (1u64 << WIDTH)) {
                    let _ = set.remove(k);
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_insert, bench_predecessor_successor, bench_remove);
criterion_main!(benches);
