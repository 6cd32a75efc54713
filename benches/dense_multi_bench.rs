use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dense_hashmap::{DenseMultiMap, DenseMultiSet};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

// 100k insertions over 10k distinct keys, ten values per key on average.
fn bench_insert_duplicates_100k(c: &mut Criterion) {
    c.bench_function("multi::insert_100k_over_10k_keys", |b| {
        b.iter_batched(
            DenseMultiMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    let _ = m.insert(key(x % 10_000), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_count_hit_10k(c: &mut Criterion) {
    c.bench_function("multi::count_hit_10k_on_10k_keys", |b| {
        let mut m = DenseMultiMap::new();
        for (i, x) in lcg(7).take(100_000).enumerate() {
            let _ = m.insert(key(x % 10_000), i as u64).unwrap();
        }
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                key(s % 10_000)
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.count(k.as_str()));
            }
        })
    });
}

fn bench_erase_all_5k_keys(c: &mut Criterion) {
    c.bench_function("multi::erase_all_5k_of_10k_keys", |b| {
        b.iter_batched(
            || {
                let mut m = DenseMultiMap::new();
                for (i, x) in lcg(5).take(100_000).enumerate() {
                    let _ = m.insert(key(x % 10_000), i as u64).unwrap();
                }
                let victims: Vec<String> = (0..5_000u64).map(key).collect();
                (m, victims)
            },
            |(mut m, victims)| {
                for k in &victims {
                    let _ = m.erase_all(k.as_str());
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

// Cursor erase of a non-last list member: the fast path that never
// touches the bucket table.
fn bench_cursor_erase_list_member(c: &mut Criterion) {
    c.bench_function("multi::cursor_erase_10k_list_members", |b| {
        b.iter_batched(
            || {
                let mut m = DenseMultiMap::new();
                for (i, x) in lcg(13).take(100_000).enumerate() {
                    let _ = m.insert(key(x % 10_000), i as u64).unwrap();
                }
                let targets: Vec<String> = (0..10_000u64).map(key).collect();
                (m, targets)
            },
            |(mut m, targets)| {
                for k in &targets {
                    let c = m.find(k.as_str());
                    let _ = m.erase_at(&c);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter_flattened_100k(c: &mut Criterion) {
    c.bench_function("multi::iter_flattened_100k", |b| {
        let mut m = DenseMultiMap::new();
        for (i, x) in lcg(999).take(100_000).enumerate() {
            let _ = m.insert(key(x % 10_000), i as u64).unwrap();
        }
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_multiset_insert_count(c: &mut Criterion) {
    c.bench_function("multiset::insert_100k_over_10k_keys", |b| {
        b.iter_batched(
            DenseMultiSet::<u64>::new,
            |mut s| {
                for x in lcg(21).take(100_000) {
                    let _ = s.insert(x % 10_000).unwrap();
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_multi;
    config = bench_config();
    targets = bench_insert_duplicates_100k,
              bench_count_hit_10k,
              bench_erase_all_5k_keys,
              bench_cursor_erase_list_member,
              bench_iter_flattened_100k,
              bench_multiset_insert_count
}
criterion_main!(benches_multi);
