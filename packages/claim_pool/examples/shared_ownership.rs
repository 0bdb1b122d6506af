//! Shared ownership example for `ClaimPool`.
//!
//! Shows the explicit retain/release protocol of `Handle` next to the automatic one of
//! `Pooled`, and how a value becomes claimable again once its last owner lets go.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use claim_pool::ClaimPool;
use new_zealand::nz;

fn main() {
    let pool = ClaimPool::new(nz!(1), || AtomicU64::new(0));

    // Explicit protocol: the claim is one owner, each retain adds another.
    let handle = pool.get_handle();
    handle.retain();

    println!("Claimed slot {} of generation {}", handle.index(), handle.generation());

    thread::scope(|s| {
        // Each thread acts as one owner and releases its own reference.
        for _ in 0..2 {
            let handle = handle.clone();

            s.spawn(move || {
                handle.value().fetch_add(1, Ordering::Relaxed);

                if handle.release() {
                    println!("This thread released the last reference");
                }
            });
        }
    });

    // Automatic protocol: cloning adds an owner, dropping removes one.
    let pooled = pool.get();
    println!("Value after the threads finished: {}", pooled.load(Ordering::Relaxed));

    let second_owner = pooled.clone();
    println!("Unique owner: {}", pooled.is_unique());

    drop(second_owner);
    println!("Unique owner after drop: {}", pooled.is_unique());

    // The single slot was reused the whole time, so the pool never had to grow.
    assert_eq!(pool.generation(), 1);
    println!("Pool is still at generation {}", pool.generation());
}
