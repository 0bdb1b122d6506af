use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use crate::Handle;

/// A claimed value of a [`ClaimPool`][crate::ClaimPool] that is released when dropped.
///
/// Each `Pooled` owns exactly one reference to its slot:
///
/// * Cloning retains the slot, creating another owner.
/// * Dropping releases the slot. When the last owner is dropped, the slot becomes free.
///
/// Use [`release()`](Self::release) to find out whether an owner was the last one, or
/// [`into_handle()`](Self::into_handle) to continue with the explicit ownership protocol of
/// [`Handle`].
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// use claim_pool::ClaimPool;
/// use new_zealand::nz;
///
/// let pool = ClaimPool::new(nz!(8), || AtomicU64::new(0));
///
/// let counter = pool.get();
/// counter.store(5, Ordering::Relaxed);
///
/// let shared = counter.clone();
/// assert_eq!(shared.load(Ordering::Relaxed), 5);
///
/// drop(counter);
/// assert!(shared.release());
/// ```
pub struct Pooled<T> {
    // Only `None` while being converted into a bare handle.
    handle: Option<Handle<T>>,
}

impl<T> Pooled<T> {
    #[must_use]
    pub(crate) fn new(handle: Handle<T>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    fn handle(&self) -> &Handle<T> {
        self.handle
            .as_ref()
            .expect("handle is only taken when the Pooled is being consumed")
    }

    /// Releases this owner's reference.
    ///
    /// Returns `true` if this was the last owner and the slot is now free.
    #[must_use = "the return value indicates whether the slot was freed"]
    pub fn release(self) -> bool {
        self.into_handle().release()
    }

    /// Converts into a bare [`Handle`] without releasing the reference held by this owner.
    ///
    /// The reference must then be released explicitly via [`Handle::release()`].
    #[must_use]
    pub fn into_handle(mut self) -> Handle<T> {
        self.handle
            .take()
            .expect("handle is only taken when the Pooled is being consumed")
    }

    /// The number of the pool generation the value belongs to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.handle().generation()
    }

    /// Whether this is the only owner of the value.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.handle().is_unique()
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.handle().value()
    }
}

impl<T> AsRef<T> for Pooled<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> Borrow<T> for Pooled<T> {
    fn borrow(&self) -> &T {
        self
    }
}

impl<T> Clone for Pooled<T> {
    fn clone(&self) -> Self {
        let handle = self.handle();
        handle.retain();

        Self::new(handle.clone())
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            _ = handle.release();
        }
    }
}

impl<T> From<Pooled<T>> for Handle<T> {
    fn from(value: Pooled<T>) -> Self {
        value.into_handle()
    }
}

impl<T> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::convert::Infallible;
    use std::sync::Arc;

    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::Generation;

    assert_impl_all!(Pooled<u32>: Send, Sync, Clone, fmt::Debug);
    assert_not_impl_any!(Pooled<Cell<u32>>: Send, Sync);
    assert_not_impl_any!(Pooled<u32>: Copy);

    fn claimed() -> (Arc<Generation<String>>, Pooled<String>) {
        let generation = Arc::new(
            Generation::try_new(1, nz!(1), || Ok::<_, Infallible>("scratch".to_string()))
                .unwrap(),
        );
        let claimed = generation.claim(nz!(1)).unwrap();
        let pooled = Pooled::new(Handle::new(Arc::clone(&generation), claimed.index));

        (generation, pooled)
    }

    #[test]
    fn derefs_to_value() {
        let (_generation, pooled) = claimed();

        assert_eq!(&*pooled, "scratch");
        assert_eq!(pooled.len(), 7);
        let borrowed: &String = pooled.borrow();
        assert_eq!(borrowed, "scratch");
    }

    #[test]
    fn drop_frees_slot() {
        let (generation, pooled) = claimed();
        assert_eq!(generation.claimed_count(), 1);

        drop(pooled);

        assert_eq!(generation.claimed_count(), 0);
    }

    #[test]
    fn clone_adds_owner() {
        let (generation, pooled) = claimed();
        let clone = pooled.clone();
        assert!(!pooled.is_unique());

        assert!(!pooled.release());
        assert!(clone.is_unique());
        assert_eq!(generation.claimed_count(), 1);

        assert!(clone.release());
        assert_eq!(generation.claimed_count(), 0);
    }

    #[test]
    fn into_handle_keeps_reference() {
        let (generation, pooled) = claimed();

        let handle = pooled.into_handle();
        assert_eq!(generation.claimed_count(), 1);

        assert!(handle.release());
        assert_eq!(generation.claimed_count(), 0);
    }

    #[test]
    fn generation_is_reported() {
        let (_generation, pooled) = claimed();
        assert_eq!(pooled.generation(), 1);
    }
}
