use alloc::format;
use core::hash::BuildHasher;
use core::hint::black_box;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use fib_hash::HashMap as FibHashMap;
use hashbrown::HashMap as HashbrownHashMap;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use siphasher::sip::SipHasher;
use std::collections::HashMap as StdHashMap;

extern crate alloc;

/// Fixed-key SipHash builder so every contender hashes identically.
#[derive(Clone, Default)]
struct SipHashBuilder;

impl BuildHasher for SipHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new_with_keys(0x5ad5_b1f9, 0x91c8_7c15)
    }
}

trait BenchKey: Clone + core::hash::Hash + Eq {
    fn new(seed: u64) -> Self;
}

impl BenchKey for u64 {
    fn new(seed: u64) -> Self {
        black_box(seed)
    }
}

impl BenchKey for String {
    fn new(seed: u64) -> Self {
        black_box(format!("key_{seed:016X}"))
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 12),
    (1 << 14),
    (1 << 16),
    (1 << 18),
];

fn random_keys<K: BenchKey>(count: usize) -> Vec<K> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| K::new(rng.try_next_u64().unwrap()))
        .collect()
}

fn bench_insert_random<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("insert_random_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("fib_hash/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut map = FibHashMap::with_hasher(SipHashBuilder);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.insert(key, i));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("std/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut map = StdHashMap::with_hasher(SipHashBuilder);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.insert(key, i));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut map = HashbrownHashMap::with_hasher(SipHashBuilder);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.insert(key, i));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_insert_random_preallocated<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "insert_random_preallocated_{}",
        core::any::type_name::<K>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("fib_hash/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut map = FibHashMap::with_hasher(SipHashBuilder);
                    map.reserve(keys.len());
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.insert(key, i));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("std/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut map = StdHashMap::with_capacity_and_hasher(keys.len(), SipHashBuilder);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.insert(key, i));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut map =
                        HashbrownHashMap::with_capacity_and_hasher(keys.len(), SipHashBuilder);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(map.insert(key, i));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_hit_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);

        let fib: FibHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let std_map: StdHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let hashbrown: HashbrownHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        let mut probes = keys.clone();
        probes.shuffle(&mut SmallRng::from_os_rng());

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("fib_hash/{size}"), |b| {
            b.iter(|| {
                for key in &probes {
                    black_box(fib.get(key));
                }
            })
        });
        group.bench_function(format!("std/{size}"), |b| {
            b.iter(|| {
                for key in &probes {
                    black_box(std_map.get(key));
                }
            })
        });
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for key in &probes {
                    black_box(hashbrown.get(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_find_miss<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_miss_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);
        let misses = random_keys::<K>(*size);

        let fib: FibHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let std_map: StdHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let hashbrown: HashbrownHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("fib_hash/{size}"), |b| {
            b.iter(|| {
                for key in &misses {
                    black_box(fib.get(key));
                }
            })
        });
        group.bench_function(format!("std/{size}"), |b| {
            b.iter(|| {
                for key in &misses {
                    black_box(std_map.get(key));
                }
            })
        });
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for key in &misses {
                    black_box(hashbrown.get(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_remove<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("remove_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);
        let mut removal_order = keys.clone();
        removal_order.shuffle(&mut SmallRng::from_os_rng());

        let fib: FibHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let std_map: StdHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let hashbrown: HashbrownHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("fib_hash/{size}"), |b| {
            b.iter_batched(
                || fib.clone(),
                |mut map| {
                    for key in &removal_order {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("std/{size}"), |b| {
            b.iter_batched(
                || std_map.clone(),
                |mut map| {
                    for key in &removal_order {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || hashbrown.clone(),
                |mut map| {
                    for key in &removal_order {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_iteration<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("iteration_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);

        let fib: FibHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let std_map: StdHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        let hashbrown: HashbrownHashMap<K, usize, SipHashBuilder> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("fib_hash/{size}"), |b| {
            b.iter(|| {
                let mut total = 0usize;
                for (_, v) in fib.iter() {
                    total = total.wrapping_add(*v);
                }
                black_box(total)
            })
        });
        group.bench_function(format!("std/{size}"), |b| {
            b.iter(|| {
                let mut total = 0usize;
                for (_, v) in std_map.iter() {
                    total = total.wrapping_add(*v);
                }
                black_box(total)
            })
        });
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                let mut total = 0usize;
                for (_, v) in hashbrown.iter() {
                    total = total.wrapping_add(*v);
                }
                black_box(total)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<u64, 4>,
    bench_insert_random::<String, 3>,
    bench_insert_random_preallocated::<u64, 4>,
    bench_insert_random_preallocated::<String, 3>,
    bench_find_hit::<u64, 4>,
    bench_find_hit::<String, 3>,
    bench_find_miss::<u64, 4>,
    bench_find_miss::<String, 3>,
    bench_remove::<u64, 4>,
    bench_remove::<String, 3>,
    bench_iteration::<u64, 4>,
    bench_iteration::<String, 3>,
);

criterion_main!(benches);
