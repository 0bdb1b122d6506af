use std::fmt;
use std::sync::atomic::{self, AtomicUsize};

/// Refcounts beyond this are treated as a leak of ownership tokens rather than a real
/// number of concurrent owners.
const MAX_REFCOUNT: usize = isize::MAX.unsigned_abs();

const ERR_OVER_RELEASE: &str =
    "pooled slot released more times than it was claimed or retained";

const ERR_RETAIN_FREE: &str = "pooled slot retained after it was released";

const ERR_REFCOUNT_OVERFLOW: &str = "pooled slot refcount overflow";

/// One pooled value plus the count of owners currently holding it.
///
/// A refcount of zero means the slot is free. The only way out of zero is [`try_claim()`],
/// which performs the 0 -> 1 transition atomically. Everything else is an increment or
/// decrement of an already claimed slot.
///
/// [`try_claim()`]: Self::try_claim
pub(crate) struct Slot<T> {
    value: T,
    refcount: AtomicUsize,
}

impl<T> Slot<T> {
    #[must_use]
    pub(crate) fn new(value: T) -> Self {
        Self {
            value,
            refcount: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub(crate) fn value(&self) -> &T {
        &self.value
    }

    /// Attempts the 0 -> 1 transition. Returns `false` if the slot is already claimed.
    #[must_use]
    pub(crate) fn try_claim(&self) -> bool {
        // Acquire on success pairs with the Release in `release()`, so whatever the previous
        // owners did to the value is visible to the new claimant.
        self.refcount
            .compare_exchange(0, 1, atomic::Ordering::Acquire, atomic::Ordering::Relaxed)
            .is_ok()
    }

    /// Adds one owner to an already claimed slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is free, as only an existing owner may add another owner.
    pub(crate) fn retain(&self) {
        // Relaxed is enough: the new owner is created from an existing one, which already
        // has whatever visibility it needs.
        let result = self.refcount.fetch_update(
            atomic::Ordering::Relaxed,
            atomic::Ordering::Relaxed,
            |count| match count {
                0 => None,
                count if count >= MAX_REFCOUNT => None,
                count => count.checked_add(1),
            },
        );

        match result {
            Ok(_) => {}
            Err(0) => panic!("{ERR_RETAIN_FREE}"),
            Err(_) => panic!("{ERR_REFCOUNT_OVERFLOW}"),
        }
    }

    /// Removes one owner. Returns `true` if this was the last owner and the slot is now free.
    ///
    /// # Panics
    ///
    /// Panics if the slot is already free. This is a protocol violation on the caller side
    /// and the slot is left untouched.
    #[must_use]
    pub(crate) fn release(&self) -> bool {
        // Release ordering publishes our use of the value to the next claimant. We never
        // transition below zero, so a concurrent claim can never observe a bogus free state.
        let result = self.refcount.fetch_update(
            atomic::Ordering::Release,
            atomic::Ordering::Relaxed,
            |count| count.checked_sub(1),
        );

        match result {
            Ok(1) => {
                // Pairs with the Release of every other owner that released before us.
                atomic::fence(atomic::Ordering::Acquire);
                true
            }
            Ok(_) => false,
            Err(_) => panic!("{ERR_OVER_RELEASE}"),
        }
    }

    #[must_use]
    pub(crate) fn refcount(&self) -> usize {
        self.refcount.load(atomic::Ordering::Acquire)
    }
}

impl<T> fmt::Debug for Slot<T> {
    #[cfg_attr(test, mutants::skip)] // Diagnostic output only, not part of the contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("refcount", &self.refcount())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(Slot<u32>: Send, Sync);
    assert_not_impl_any!(Slot<std::cell::Cell<u32>>: Sync);

    #[test]
    fn new_slot_is_free() {
        let slot = Slot::new(42);

        assert_eq!(slot.refcount(), 0);
        assert_eq!(*slot.value(), 42);
    }

    #[test]
    fn claim_only_succeeds_once() {
        let slot = Slot::new(());

        assert!(slot.try_claim());
        assert!(!slot.try_claim());
        assert_eq!(slot.refcount(), 1);
    }

    #[test]
    fn release_of_sole_owner_frees_slot() {
        let slot = Slot::new(());
        assert!(slot.try_claim());

        assert!(slot.release());
        assert_eq!(slot.refcount(), 0);

        // Free again, so it can be claimed again.
        assert!(slot.try_claim());
    }

    #[test]
    fn retained_slot_needs_matching_releases() {
        let slot = Slot::new(());
        assert!(slot.try_claim());

        slot.retain();
        slot.retain();
        assert_eq!(slot.refcount(), 3);

        assert!(!slot.release());
        assert!(!slot.release());
        assert!(slot.release());
    }

    #[test]
    #[should_panic]
    fn release_of_free_slot_panics() {
        let slot = Slot::new(());
        _ = slot.release();
    }

    #[test]
    fn failed_release_leaves_slot_free() {
        let slot = Slot::new(());

        let result = catch_unwind(AssertUnwindSafe(|| slot.release()));

        assert!(result.is_err());
        assert_eq!(slot.refcount(), 0);
        assert!(slot.try_claim());
    }

    #[test]
    #[should_panic]
    fn retain_of_free_slot_panics() {
        let slot = Slot::new(());
        slot.retain();
    }
}
