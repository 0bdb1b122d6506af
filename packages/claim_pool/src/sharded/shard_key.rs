use std::cell::Cell;
use std::sync::atomic::{self, AtomicUsize};

/// Hands out shard keys to threads in the order they first ask for one.
static NEXT_THREAD_KEY: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static THREAD_KEY: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Selects the shard of a [`ShardedPool`][crate::ShardedPool] that an operation works with.
///
/// A key can be any number; pools reduce it modulo their shard count. Callers that already have
/// a natural notion of "which worker am I" (e.g. a worker index in a thread pool) can pass that
/// via [`ShardKey::new()`]. Everyone else can use [`ShardKey::current()`], which assigns each
/// thread its own key the first time it is requested.
///
/// # Examples
///
/// ```
/// use claim_pool::ShardKey;
///
/// let key = ShardKey::current();
/// assert_eq!(key, ShardKey::current());
///
/// let worker_3 = ShardKey::new(3);
/// assert_eq!(worker_3.get(), 3);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ShardKey(usize);

impl ShardKey {
    /// Creates a shard key from a caller-chosen number.
    #[must_use]
    #[inline]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// The shard key of the current thread.
    ///
    /// Threads receive keys round-robin in the order they first call this, so a pool whose
    /// shard count is at least the number of threads using it gives every thread its own shard.
    #[must_use]
    pub fn current() -> Self {
        THREAD_KEY.with(|key| {
            if let Some(value) = key.get() {
                return Self(value);
            }

            // Relaxed is enough: we only need each thread to get a distinct number.
            let value = NEXT_THREAD_KEY.fetch_add(1, atomic::Ordering::Relaxed);
            key.set(Some(value));
            Self(value)
        })
    }

    /// The number this key was created from.
    #[must_use]
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}
