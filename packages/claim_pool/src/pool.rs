use std::any::type_name;
use std::fmt;
use std::num::NonZero;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::metrics::{CLAIM_PROBES, CLAIMS, GROWTHS, PROBE_EXHAUSTIONS};
use crate::{
    BoxError, ClaimPoolBuilder, Error, Generation, GrowthPolicy, Handle, Pooled, Result,
};

/// Constructs the value for one slot.
pub(crate) type Factory<T> = Box<dyn Fn() -> std::result::Result<T, BoxError> + Send + Sync>;

/// The number of random slots probed before a claim attempt gives up on the current
/// generation and grows the pool.
pub(crate) const DEFAULT_PROBE_LIMIT: NonZero<usize> = new_zealand::nz!(16);

/// A pool of reusable values that many threads can claim concurrently without locking.
///
/// All values are constructed up front by a factory function and then reused indefinitely.
/// A claim picks a free slot at random and marks it as claimed with a single atomic
/// operation, so unrelated callers never wait for each other. The claimed value can be shared
/// among several owners via reference counting and becomes available for claiming again once
/// the last owner has released it.
///
/// # Growth
///
/// If a claim attempt keeps hitting claimed slots, the pool assumes it has become saturated
/// and replaces its set of slots (a generation) with a freshly constructed one. Only one thread
/// performs the replacement even if many detect saturation at the same time. Values claimed
/// from the previous generation remain valid and are released normally; the previous
/// generation is freed once its last value is released.
///
/// The pool never shrinks back and does not bound its memory use. See [`GrowthPolicy`] for
/// how the size of new generations is chosen.
///
/// # Values
///
/// The pool does not reset values it hands out - a claimed value contains whatever its previous
/// owners left in it. Owners only receive shared references to values, so mutable scratch
/// state needs interior mutability (e.g. a mutex or atomics). Because a slot has exactly one
/// claimant at a time, such synchronization is uncontended.
///
/// # Examples
///
/// ```
/// use claim_pool::ClaimPool;
/// use new_zealand::nz;
/// use parking_lot::Mutex;
///
/// let pool = ClaimPool::new(nz!(8), || Mutex::new([0_u8; 1024]));
///
/// let buffer = pool.get();
/// buffer.lock()[0] = 42;
///
/// // Dropping the value returns it to the pool.
/// drop(buffer);
/// ```
///
/// # Thread safety
///
/// The pool is thread-safe if `T` is thread-safe. Share it between threads by reference
/// (e.g. scoped threads) or by wrapping it in an `Arc`.
pub struct ClaimPool<T> {
    /// The generation new claims are made against. Read on every claim, written only by growth.
    current: ArcSwap<Generation<T>>,

    factory: Factory<T>,

    /// Serializes generation replacement. Never taken on the claim fast path.
    growth_lock: Mutex<()>,

    probe_limit: NonZero<usize>,

    growth_policy: GrowthPolicy,
}

impl<T> ClaimPool<T> {
    /// Creates a pool with `capacity` values, each constructed by calling `factory`.
    ///
    /// Use [`ClaimPool::builder()`] to customize the pool further or to use a fallible factory.
    ///
    /// # Examples
    ///
    /// ```
    /// use claim_pool::ClaimPool;
    /// use new_zealand::nz;
    ///
    /// let pool = ClaimPool::new(nz!(4), Vec::<u8>::new);
    ///
    /// assert_eq!(pool.capacity(), nz!(4));
    /// assert_eq!(pool.generation(), 1);
    /// ```
    #[must_use]
    pub fn new<F>(capacity: NonZero<usize>, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::builder().capacity(capacity).build(factory)
    }

    /// Creates a builder for configuring and constructing a [`ClaimPool`].
    #[inline]
    pub fn builder() -> ClaimPoolBuilder<T> {
        ClaimPoolBuilder::new()
    }

    pub(crate) fn new_inner(
        capacity: NonZero<usize>,
        factory: Factory<T>,
        probe_limit: NonZero<usize>,
        growth_policy: GrowthPolicy,
    ) -> Result<Self> {
        let generation = Generation::try_new(1, capacity, &factory)
            .map_err(|source| Error::Construction { source })?;

        Ok(Self {
            current: ArcSwap::from_pointee(generation),
            factory,
            growth_lock: Mutex::new(()),
            probe_limit,
            growth_policy,
        })
    }

    /// Claims a value and returns it as a [`Pooled`], which releases it when dropped.
    ///
    /// # Panics
    ///
    /// Panics if the pool was built with a fallible factory and the factory fails while
    /// growing the pool. Use [`try_get()`](Self::try_get) to handle such failures.
    #[must_use]
    pub fn get(&self) -> Pooled<T> {
        Pooled::new(self.get_handle())
    }

    /// Claims a value and returns the bare ownership capability for it.
    ///
    /// The claim holds one reference that must be released via [`Handle::release()`].
    ///
    /// # Panics
    ///
    /// Panics if the pool was built with a fallible factory and the factory fails while
    /// growing the pool. Use [`try_get_handle()`](Self::try_get_handle) to handle such failures.
    #[must_use]
    pub fn get_handle(&self) -> Handle<T> {
        self.try_get_handle()
            .expect("factory failed while growing the pool - use try_get() for fallible factories")
    }

    /// Claims a value and returns it as a [`Pooled`], which releases it when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Construction`] if the pool had to grow and the factory failed. The
    /// pool remains usable and a later attempt may succeed.
    pub fn try_get(&self) -> Result<Pooled<T>> {
        self.try_get_handle().map(Pooled::new)
    }

    /// Claims a value and returns the bare ownership capability for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Construction`] if the pool had to grow and the factory failed. The
    /// pool remains usable and a later attempt may succeed.
    pub fn try_get_handle(&self) -> Result<Handle<T>> {
        loop {
            let generation = self.current.load();

            if let Some(claimed) = generation.claim(self.probe_limit) {
                CLAIMS.with(|event| event.observe_once());
                CLAIM_PROBES.with(|event| event.observe(claimed.probes));

                return Ok(Handle::new(Arc::clone(&generation), claimed.index));
            }

            PROBE_EXHAUSTIONS.with(|event| event.observe_once());

            self.grow(&generation)?;
        }
    }

    /// Replaces `observed` with a new generation, unless another thread already replaced it.
    fn grow(&self, observed: &Arc<Generation<T>>) -> Result<()> {
        let _guard = self.growth_lock.lock();

        let current = self.current.load();

        if !Arc::ptr_eq(&current, observed) {
            trace!(
                observed = observed.number(),
                current = current.number(),
                "generation already replaced by another thread"
            );
            return Ok(());
        }

        let number = current.number().wrapping_add(1);
        let capacity = self.growth_policy.next_capacity(current.capacity());

        let generation = Generation::try_new(number, capacity, &self.factory).map_err(|source| {
            warn!(generation = number, error = %source, "failed to construct new generation");
            Error::Construction { source }
        })?;

        self.current.store(Arc::new(generation));

        debug!(
            previous = current.number(),
            generation = number,
            capacity = capacity.get(),
            "published new generation"
        );
        GROWTHS.with(|event| event.observe(capacity.get()));

        Ok(())
    }

    /// The number of slots in the current generation.
    ///
    /// Slots of older generations that are still in use are not included.
    #[must_use]
    pub fn capacity(&self) -> NonZero<usize> {
        self.current.load().capacity()
    }

    /// The number of the current generation. The initial generation is number 1 and each
    /// growth event increments it by one.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.current.load().number()
    }

    /// The number of slots a claim attempt probes before growing the pool.
    #[must_use]
    pub fn probe_limit(&self) -> NonZero<usize> {
        self.probe_limit
    }

    /// The policy that determines the capacity of new generations.
    #[must_use]
    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth_policy
    }
}

impl<T> fmt::Debug for ClaimPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("current", &self.current.load_full())
            .field("probe_limit", &self.probe_limit)
            .field("growth_policy", &self.growth_policy)
            .finish_non_exhaustive()
    }
}
