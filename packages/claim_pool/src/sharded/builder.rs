use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;
use std::thread;

use new_zealand::nz;

use crate::ShardedPool;

/// Builder for creating an instance of [`ShardedPool`].
///
/// The capacity is mandatory. The shard count defaults to the number of processors available
/// to the process.
///
/// # Examples
///
/// ```
/// use claim_pool::ShardedPool;
/// use new_zealand::nz;
///
/// let pool = ShardedPool::builder()
///     .capacity(nz!(64))
///     .shard_count(nz!(4))
///     .build(|| [0_u8; 32]);
///
/// assert_eq!(pool.shard_count(), nz!(4));
/// assert_eq!(pool.max_per_shard(), nz!(16));
/// ```
#[must_use]
pub struct ShardedPoolBuilder<T> {
    capacity: Option<NonZero<usize>>,
    shard_count: Option<NonZero<usize>>,

    // Ties the builder to the value type without owning a `T`.
    _value: PhantomData<fn() -> T>,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> ShardedPoolBuilder<T> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            shard_count: None,
            _value: PhantomData,
            _not_sync: PhantomData,
        }
    }

    /// Sets the total number of free values the pool keeps for reuse, divided evenly among
    /// the shards. Every shard keeps at least one.
    #[inline]
    pub fn capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the number of shards.
    #[inline]
    pub fn shard_count(mut self, shard_count: NonZero<usize>) -> Self {
        self.shard_count = Some(shard_count);
        self
    }

    /// Builds the pool. Values are constructed by `factory` on demand.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity()`](Self::capacity).
    #[must_use]
    pub fn build<F>(self, factory: F) -> ShardedPool<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let capacity = self
            .capacity
            .expect("capacity must be set using .capacity() before building the pool");

        let shard_count = self
            .shard_count
            .unwrap_or_else(|| thread::available_parallelism().unwrap_or(nz!(1)));

        ShardedPool::new_inner(
            shard_count,
            max_per_shard(capacity, shard_count),
            Box::new(factory),
        )
    }
}

impl<T> fmt::Debug for ShardedPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedPoolBuilder")
            .field("capacity", &self.capacity)
            .field("shard_count", &self.shard_count)
            .finish_non_exhaustive()
    }
}

fn max_per_shard(capacity: NonZero<usize>, shard_count: NonZero<usize>) -> NonZero<usize> {
    capacity
        .get()
        .checked_div(shard_count.get())
        .and_then(NonZero::new)
        .unwrap_or(nz!(1))
}

#[cfg(test)]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(ShardedPoolBuilder<u32>: Send, fmt::Debug);
    assert_impl_all!(ShardedPoolBuilder<Cell<u32>>: Send, fmt::Debug);
    assert_not_impl_any!(ShardedPoolBuilder<u32>: Sync);

    #[test]
    fn capacity_is_split_among_shards() {
        assert_eq!(max_per_shard(nz!(16), nz!(4)), nz!(4));
        assert_eq!(max_per_shard(nz!(17), nz!(4)), nz!(4));
    }

    #[test]
    fn every_shard_keeps_at_least_one() {
        assert_eq!(max_per_shard(nz!(2), nz!(8)), nz!(1));
    }

    #[test]
    fn shard_count_defaults_to_available_processors() {
        let pool = ShardedPoolBuilder::new().capacity(nz!(8)).build(|| 0_u8);

        let expected = thread::available_parallelism().unwrap_or(nz!(1));
        assert_eq!(pool.shard_count(), expected);
    }

    #[test]
    #[should_panic]
    fn build_without_capacity_panics() {
        let _pool = ShardedPoolBuilder::new().shard_count(nz!(2)).build(|| 0_u8);
    }

    #[test]
    fn pool_builder_infers_value_type_from_factory() {
        let pool = ShardedPool::builder()
            .capacity(nz!(4))
            .shard_count(nz!(2))
            .build(|| vec![1_u8; 3]);

        let handle = pool.get();
        assert_eq!(handle.value().len(), 3);
        assert!(handle.release());
    }
}
