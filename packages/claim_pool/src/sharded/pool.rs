use std::any::type_name;
use std::fmt;
use std::num::NonZero;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::metrics::{CLAIMS, SHARDED_ALLOCATIONS};
use crate::{ShardKey, ShardedHandle, ShardedPoolBuilder, Slot};

type FreeList<T> = Mutex<Vec<Arc<Slot<T>>>>;

/// State shared between a sharded pool and every handle it has issued.
pub(crate) struct ShardedCore<T> {
    /// Stacks of free values, each with at most `max_per_shard` entries.
    shards: Box<[FreeList<T>]>,

    max_per_shard: NonZero<usize>,

    factory: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> ShardedCore<T> {
    fn shard(&self, key: ShardKey) -> &FreeList<T> {
        let index = key
            .get()
            .checked_rem(self.shards.len())
            .expect("a sharded pool always has at least one shard");

        self.shards
            .get(index)
            .expect("index was reduced modulo the shard count")
    }

    /// Takes a free value from the shard, or constructs a new one if the shard has none.
    /// The returned slot is claimed by the caller.
    fn take(&self, key: ShardKey) -> Arc<Slot<T>> {
        // The guard is dropped at the end of the statement, so the factory runs unlocked.
        let recycled = self.shard(key).lock().pop();

        let slot = recycled.unwrap_or_else(|| {
            SHARDED_ALLOCATIONS.with(|event| event.observe_once());
            Arc::new(Slot::new((self.factory)()))
        });

        // Values on the free lists have no owners and nothing can add one without claiming.
        let claimed = slot.try_claim();
        assert!(claimed, "free value was already claimed");
        CLAIMS.with(|event| event.observe_once());

        slot
    }

    /// Returns a value whose last owner has released it to the shard, unless the shard is full,
    /// in which case the value is dropped.
    pub(crate) fn recycle(&self, slot: Arc<Slot<T>>, key: ShardKey) {
        let mut free = self.shard(key).lock();

        if free.len() < self.max_per_shard.get() {
            free.push(slot);
        }
    }

    fn idle_count(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }
}

/// A pool that keeps free values on per-worker stacks instead of in a shared slot array.
///
/// This is an alternative to [`ClaimPool`][crate::ClaimPool] for workloads where each worker
/// mostly reuses its own values and contention is low. Each shard is a short stack of free
/// values selected by a [`ShardKey`]:
///
/// * A claim pops a value from its shard, or constructs a new one if the shard is empty.
/// * When the last owner releases a value, it is pushed onto the releasing thread's shard if
///   that shard holds fewer than `capacity / shard_count` values. Otherwise it is dropped.
///
/// Values are constructed lazily, so a new pool holds no values at all.
///
/// Ownership works exactly as for [`Handle`][crate::Handle]: every claim holds one reference,
/// [`ShardedHandle::retain()`] adds one, [`ShardedHandle::release()`] removes one and releasing
/// more often than that panics.
///
/// # Examples
///
/// ```
/// use claim_pool::{ShardKey, ShardedPool};
/// use new_zealand::nz;
///
/// let pool = ShardedPool::builder()
///     .capacity(nz!(8))
///     .shard_count(nz!(2))
///     .build(|| vec![0_u8; 256]);
///
/// let buffer = pool.get_in(ShardKey::new(0));
/// assert_eq!(buffer.value().len(), 256);
/// assert!(buffer.release());
///
/// // The released value now waits on the releasing thread's shard for reuse.
/// assert_eq!(pool.idle_count(), 1);
/// ```
///
/// # Thread safety
///
/// The pool is thread-safe if `T` is thread-safe. Clones of the pool share the same shards.
pub struct ShardedPool<T> {
    core: Arc<ShardedCore<T>>,
}

impl<T> ShardedPool<T> {
    /// Creates a pool that keeps up to `capacity` free values, spread over one shard per
    /// processor available to the process.
    #[must_use]
    pub fn new<F>(capacity: NonZero<usize>, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::builder().capacity(capacity).build(factory)
    }

    /// Creates a builder for configuring and constructing a [`ShardedPool`].
    #[inline]
    pub fn builder() -> ShardedPoolBuilder<T> {
        ShardedPoolBuilder::new()
    }

    pub(crate) fn new_inner(
        shard_count: NonZero<usize>,
        max_per_shard: NonZero<usize>,
        factory: Box<dyn Fn() -> T + Send + Sync>,
    ) -> Self {
        let shards = (0..shard_count.get())
            .map(|_| Mutex::new(Vec::with_capacity(max_per_shard.get())))
            .collect();

        Self {
            core: Arc::new(ShardedCore {
                shards,
                max_per_shard,
                factory,
            }),
        }
    }

    /// Claims a value from the current thread's shard.
    #[must_use]
    pub fn get(&self) -> ShardedHandle<T> {
        self.get_in(ShardKey::current())
    }

    /// Claims a value from the shard selected by `key`.
    #[must_use]
    pub fn get_in(&self, key: ShardKey) -> ShardedHandle<T> {
        let slot = self.core.take(key);

        ShardedHandle::new(slot, Arc::clone(&self.core))
    }

    /// The number of shards.
    #[must_use]
    pub fn shard_count(&self) -> NonZero<usize> {
        NonZero::new(self.core.shards.len()).expect("a sharded pool always has at least one shard")
    }

    /// The maximum number of free values kept per shard.
    #[must_use]
    pub fn max_per_shard(&self) -> NonZero<usize> {
        self.core.max_per_shard
    }

    /// The number of free values currently waiting for reuse, across all shards.
    ///
    /// This takes every shard lock in turn, so the result may be stale by the time it is
    /// returned if other threads are using the pool.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.core.idle_count()
    }
}

impl<T> Clone for ShardedPool<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T> fmt::Debug for ShardedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("shard_count", &self.core.shards.len())
            .field("max_per_shard", &self.core.max_per_shard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(ShardedPool<u32>: Send, Sync, Clone, fmt::Debug);
    assert_not_impl_any!(ShardedPool<Cell<u32>>: Send, Sync);

    fn counting_pool(
        shard_count: NonZero<usize>,
        max_per_shard: NonZero<usize>,
    ) -> (ShardedPool<usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let pool = ShardedPool::new_inner(
            shard_count,
            max_per_shard,
            Box::new(move || calls_clone.fetch_add(1, Ordering::Relaxed)),
        );

        (pool, calls)
    }

    #[test]
    fn new_pool_is_empty() {
        let (pool, calls) = counting_pool(nz!(2), nz!(4));

        assert_eq!(pool.idle_count(), 0);
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn released_value_is_reused_in_same_shard() {
        let (pool, calls) = counting_pool(nz!(1), nz!(4));

        let first = pool.get_in(ShardKey::new(0));
        let first_value = *first.value();
        assert!(first.release());

        let second = pool.get_in(ShardKey::new(0));
        assert_eq!(*second.value(), first_value);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(second.release());
    }

    #[test]
    fn shard_cap_is_enforced() {
        let (pool, calls) = counting_pool(nz!(1), nz!(2));

        let handles = (0..5)
            .map(|_| pool.get_in(ShardKey::new(0)))
            .collect::<Vec<_>>();
        assert_eq!(calls.load(Ordering::Relaxed), 5);

        for handle in &handles {
            assert!(handle.release());
        }

        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn keys_wrap_around_shard_count() {
        let (pool, _calls) = counting_pool(nz!(3), nz!(1));

        // Key 4 maps to the same shard as key 1.
        let core = &pool.core;
        core.recycle(Arc::new(Slot::new(99)), ShardKey::new(4));

        let handle = pool.get_in(ShardKey::new(1));
        assert_eq!(*handle.value(), 99);
        assert!(handle.release());
    }

    #[test]
    fn retained_value_returns_only_after_last_release() {
        let (pool, _calls) = counting_pool(nz!(1), nz!(4));

        let handle = pool.get_in(ShardKey::new(0));
        handle.retain();

        assert!(!handle.release());
        assert_eq!(pool.idle_count(), 0);

        assert!(handle.release());
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn clones_share_shards() {
        let (pool, _calls) = counting_pool(nz!(1), nz!(4));
        let clone = pool.clone();

        assert!(pool.get_in(ShardKey::new(0)).release());

        assert_eq!(clone.idle_count(), 1);
    }
}
