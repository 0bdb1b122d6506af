//! Example for `ShardedPool` with caller-assigned shard keys.
//!
//! Each worker uses its own shard, so values stay with the worker that last released them.

use std::thread;

use claim_pool::{ShardKey, ShardedPool};
use new_zealand::nz;

const WORKERS: usize = 4;

fn main() {
    let pool = ShardedPool::builder()
        .capacity(nz!(16))
        .shard_count(nz!(4))
        .build(|| String::with_capacity(256));

    println!(
        "Created sharded pool with {} shards of up to {} idle values",
        pool.shard_count(),
        pool.max_per_shard()
    );

    thread::scope(|s| {
        for worker in 0..WORKERS {
            let pool = &pool;

            s.spawn(move || {
                let key = ShardKey::new(worker);

                for _ in 0..100 {
                    let handle = pool.get_in(key);
                    assert!(handle.value().capacity() >= 256);
                    assert!(handle.release_in(key));
                }
            });
        }
    });

    println!("Idle values after the workers finished: {}", pool.idle_count());
}
