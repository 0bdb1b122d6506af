use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::pool::{DEFAULT_PROBE_LIMIT, Factory};
use crate::{BoxError, ClaimPool, GrowthPolicy, Result};

/// Builder for creating an instance of [`ClaimPool`].
///
/// The capacity is mandatory, whereas other settings are optional.
///
/// # Examples
///
/// ```
/// use claim_pool::{ClaimPool, GrowthPolicy};
/// use new_zealand::nz;
///
/// let pool = ClaimPool::builder()
///     .capacity(nz!(32))
///     .probe_limit(nz!(8))
///     .growth_policy(GrowthPolicy::Replace)
///     .build(|| vec![0_u8; 4096]);
///
/// assert_eq!(pool.capacity(), nz!(32));
/// assert_eq!(pool.probe_limit(), nz!(8));
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) and can be safely transferred between threads,
/// allowing pool configuration to happen on different threads than where the pool is used.
/// However, it is not thread-safe ([`Sync`]) as it contains mutable configuration state.
#[must_use]
pub struct ClaimPoolBuilder<T> {
    capacity: Option<NonZero<usize>>,
    probe_limit: NonZero<usize>,
    growth_policy: GrowthPolicy,

    // Ties the builder to the value type without owning a `T`.
    _value: PhantomData<fn() -> T>,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> ClaimPoolBuilder<T> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            probe_limit: DEFAULT_PROBE_LIMIT,
            growth_policy: GrowthPolicy::default(),
            _value: PhantomData,
            _not_sync: PhantomData,
        }
    }

    /// Sets the number of values in the initial generation.
    #[inline]
    pub fn capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets how many random slots a claim attempt probes before it treats the pool as
    /// saturated and grows it. Defaults to 16.
    ///
    /// Lower values make growth more eager, higher values make claims against a nearly full
    /// pool slower but grow it less often.
    #[inline]
    pub fn probe_limit(mut self, probe_limit: NonZero<usize>) -> Self {
        self.probe_limit = probe_limit;
        self
    }

    /// Sets the [growth policy][GrowthPolicy] of the pool.
    #[inline]
    pub fn growth_policy(mut self, policy: GrowthPolicy) -> Self {
        self.growth_policy = policy;
        self
    }

    /// Builds the pool, constructing its initial generation by calling `factory` once per slot.
    ///
    /// The factory is called again whenever the pool grows. It must not call back into the
    /// pool it builds values for.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity()`](Self::capacity).
    #[must_use]
    pub fn build<F>(self, factory: F) -> ClaimPool<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: Factory<T> = Box::new(move || Ok(factory()));

        self.build_inner(factory)
            .expect("an infallible factory cannot fail to construct values")
    }

    /// Builds the pool with a fallible factory, constructing its initial generation by calling
    /// `factory` once per slot.
    ///
    /// Claims from a pool built this way should use [`ClaimPool::try_get()`] or
    /// [`ClaimPool::try_get_handle()`], as growing the pool may fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Construction`][crate::Error::Construction] if the factory fails for any
    /// value of the initial generation.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity()`](Self::capacity).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// use claim_pool::ClaimPool;
    /// use new_zealand::nz;
    ///
    /// let pool = ClaimPool::builder()
    ///     .capacity(nz!(4))
    ///     .try_build(|| Ok::<_, io::Error>(String::with_capacity(128)))?;
    ///
    /// let value = pool.try_get()?;
    /// assert!(value.capacity() >= 128);
    /// # Ok::<(), claim_pool::Error>(())
    /// ```
    pub fn try_build<E, F>(self, factory: F) -> Result<ClaimPool<T>>
    where
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let factory: Factory<T> = Box::new(move || factory().map_err(Into::into));

        self.build_inner(factory)
    }

    fn build_inner(self, factory: Factory<T>) -> Result<ClaimPool<T>> {
        let capacity = self
            .capacity
            .expect("capacity must be set using .capacity() before building the pool");

        ClaimPool::new_inner(capacity, factory, self.probe_limit, self.growth_policy)
    }
}

impl<T> fmt::Debug for ClaimPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimPoolBuilder")
            .field("capacity", &self.capacity)
            .field("probe_limit", &self.probe_limit)
            .field("growth_policy", &self.growth_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::Error;

    assert_impl_all!(ClaimPoolBuilder<u32>: Send, fmt::Debug);
    assert_impl_all!(ClaimPoolBuilder<std::cell::Cell<u32>>: Send, fmt::Debug);
    assert_not_impl_any!(ClaimPoolBuilder<u32>: Sync);

    #[test]
    fn builder_new_creates_default_state() {
        let builder = ClaimPoolBuilder::<u64>::new();

        assert!(builder.capacity.is_none());
        assert_eq!(builder.probe_limit, nz!(16));
        assert_eq!(builder.growth_policy, GrowthPolicy::Replace);
    }

    #[test]
    fn settings_can_be_overridden() {
        let builder = ClaimPoolBuilder::<u64>::new()
            .capacity(nz!(1))
            .capacity(nz!(9))
            .probe_limit(nz!(2))
            .growth_policy(GrowthPolicy::Double);

        assert_eq!(builder.capacity, Some(nz!(9)));
        assert_eq!(builder.probe_limit, nz!(2));
        assert_eq!(builder.growth_policy, GrowthPolicy::Double);
    }

    #[test]
    fn build_applies_settings() {
        let pool = ClaimPoolBuilder::new()
            .capacity(nz!(3))
            .probe_limit(nz!(4))
            .growth_policy(GrowthPolicy::Double)
            .build(|| 0_u64);

        assert_eq!(pool.capacity(), nz!(3));
        assert_eq!(pool.probe_limit(), nz!(4));
        assert_eq!(pool.growth_policy(), GrowthPolicy::Double);
    }

    #[test]
    #[should_panic]
    fn build_without_capacity_panics() {
        let _pool = ClaimPoolBuilder::new().build(|| 0_u64);
    }

    #[test]
    fn try_build_propagates_factory_error() {
        let result = ClaimPoolBuilder::new()
            .capacity(nz!(2))
            .try_build(|| -> io::Result<u64> {
                Err(io::Error::new(io::ErrorKind::OutOfMemory, "nope"))
            });

        let Err(Error::Construction { source }) = result else {
            panic!("expected construction error");
        };
        assert_eq!(source.to_string(), "nope");
    }

    #[test]
    fn builder_can_move_between_threads() {
        let builder = ClaimPoolBuilder::new().capacity(nz!(2));

        let handle = std::thread::spawn(move || builder.build(|| 1_u8));
        let pool = handle.join().expect("thread completed successfully");

        assert_eq!(pool.capacity(), nz!(2));
    }

    #[test]
    fn pool_builder_infers_value_type_from_factory() {
        let pool = ClaimPool::builder()
            .capacity(nz!(2))
            .growth_policy(GrowthPolicy::Double)
            .build(|| String::from("scratch"));

        assert_eq!(pool.get().as_str(), "scratch");
    }

    #[test]
    fn pool_builder_infers_value_type_from_fallible_factory() {
        let pool = ClaimPool::builder()
            .capacity(nz!(2))
            .try_build(|| "17".parse::<u32>())
            .expect("factory succeeds");

        assert_eq!(*pool.get(), 17);
    }

    #[test]
    fn debug_does_not_require_debug_values() {
        struct Opaque;

        let builder = ClaimPool::<Opaque>::builder().capacity(nz!(3));

        let output = format!("{builder:?}");
        assert!(output.contains("ClaimPoolBuilder"));
        assert!(output.contains("capacity"));

        let pool = builder.build(|| Opaque);
        assert_eq!(pool.capacity(), nz!(3));
    }
}
