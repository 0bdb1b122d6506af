//! Basic benchmarks for the `claim_pool` package.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use claim_pool::{ClaimPool, ShardKey, ShardedPool};
use criterion::{Criterion, criterion_group, criterion_main};
use new_zealand::nz;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

type TestItem = [u8; 64];

const CONTENDING_THREADS: usize = 4;

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("cp_claim");

    let pool = ClaimPool::new(nz!(64), || [0_u8; 64]);

    group.bench_function("handle_claim_release", |b| {
        b.iter(|| {
            let handle = pool.get_handle();
            black_box(handle.value());
            black_box(handle.release())
        });
    });

    group.bench_function("pooled_claim_drop", |b| {
        b.iter(|| {
            drop(black_box(pool.get()));
        });
    });

    group.bench_function("retain_release", |b| {
        let handle = pool.get_handle();

        b.iter(|| {
            handle.retain();
            black_box(handle.release())
        });

        assert!(handle.release());
    });

    group.finish();

    let mut group = c.benchmark_group("cp_sharded");

    let sharded = ShardedPool::builder()
        .capacity(nz!(64))
        .shard_count(nz!(4))
        .build(|| [0_u8; 64]);

    group.bench_function("claim_release", |b| {
        b.iter(|| {
            let handle = sharded.get_in(ShardKey::new(0));
            black_box(handle.value());
            black_box(handle.release_in(ShardKey::new(0)))
        });
    });

    group.finish();

    let mut group = c.benchmark_group("cp_contended");

    group.bench_function("handle_claim_release", |b| {
        b.iter_custom(|iters| contended(&pool, iters));
    });

    group.finish();
}

/// Runs `iters` claim and release cycles on each of several threads at once and returns the
/// mean time each thread took.
fn contended(pool: &ClaimPool<TestItem>, iters: u64) -> Duration {
    let barrier = Barrier::new(CONTENDING_THREADS);

    let total: Duration = thread::scope(|s| {
        let threads = (0..CONTENDING_THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    let start = Instant::now();

                    for _ in 0..iters {
                        let handle = pool.get_handle();
                        black_box(handle.value());
                        black_box(handle.release());
                    }

                    start.elapsed()
                })
            })
            .collect::<Vec<_>>();

        threads
            .into_iter()
            .map(|thread| thread.join().expect("benchmark thread completed successfully"))
            .sum()
    });

    total
        .checked_div(u32::try_from(CONTENDING_THREADS).expect("thread count fits in u32"))
        .expect("thread count is nonzero")
}
