//! Scratch buffer example for `ClaimPool`.
//!
//! Several worker threads repeatedly claim a scratch buffer, fill it and verify it before
//! releasing it. The pool grows when the workers outnumber the buffers.

use std::thread;

use claim_pool::ClaimPool;
use new_zealand::nz;
use parking_lot::Mutex;

const WORKERS: u8 = 8;
const ROUNDS: usize = 1_000;

fn main() {
    let pool = ClaimPool::new(nz!(4), || Mutex::new(vec![0_u8; 4096]));

    println!(
        "Created pool with {} buffers (generation {})",
        pool.capacity(),
        pool.generation()
    );

    thread::scope(|s| {
        for worker in 0..WORKERS {
            let pool = &pool;

            s.spawn(move || {
                for _ in 0..ROUNDS {
                    // Released automatically at the end of the iteration.
                    let buffer = pool.get();

                    // The pool does not reset values, so every user initializes what it reads.
                    let mut bytes = buffer.lock();
                    bytes.fill(worker);
                    assert!(bytes.iter().all(|&b| b == worker));
                }
            });
        }
    });

    println!(
        "{WORKERS} workers completed {ROUNDS} rounds each; pool is now at generation {} with {} buffers",
        pool.generation(),
        pool.capacity()
    );
}
