use std::fmt;
use std::sync::Arc;

use crate::sharded::pool::ShardedCore;
use crate::{ShardKey, Slot};

/// The ownership capability for one value claimed from a [`ShardedPool`][crate::ShardedPool].
///
/// Follows the same explicit ownership protocol as [`Handle`][crate::Handle]. When the last
/// owner releases the value, it goes back to a shard of the pool for reuse.
///
/// Cloning a handle copies the capability without adding an owner.
pub struct ShardedHandle<T> {
    slot: Arc<Slot<T>>,
    core: Arc<ShardedCore<T>>,
}

impl<T> ShardedHandle<T> {
    #[must_use]
    pub(crate) fn new(slot: Arc<Slot<T>>, core: Arc<ShardedCore<T>>) -> Self {
        Self { slot, core }
    }

    /// Adds an owner to the value.
    ///
    /// Each call must be matched by one extra call to [`release()`](Self::release).
    ///
    /// # Panics
    ///
    /// Panics if the value has already been released by all of its owners.
    #[inline]
    pub fn retain(&self) {
        self.slot.retain();
    }

    /// Removes an owner from the value, returning it to the current thread's shard if this was
    /// the last owner.
    ///
    /// Returns `true` if this was the last owner.
    ///
    /// # Panics
    ///
    /// Panics if the value has already been released by all of its owners.
    #[must_use = "the return value indicates whether the value was returned to the pool"]
    pub fn release(&self) -> bool {
        self.release_in(ShardKey::current())
    }

    /// Removes an owner from the value, returning it to the shard selected by `key` if this
    /// was the last owner.
    ///
    /// Returns `true` if this was the last owner.
    ///
    /// # Panics
    ///
    /// Panics if the value has already been released by all of its owners.
    #[must_use = "the return value indicates whether the value was returned to the pool"]
    pub fn release_in(&self, key: ShardKey) -> bool {
        if !self.slot.release() {
            return false;
        }

        self.core.recycle(Arc::clone(&self.slot), key);
        true
    }

    /// Borrows the pooled value.
    #[must_use]
    #[inline]
    pub fn value(&self) -> &T {
        self.slot.value()
    }

    /// Whether the value currently has exactly one owner.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.slot.refcount() == 1
    }
}

impl<T> Clone for ShardedHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            core: Arc::clone(&self.core),
        }
    }
}

impl<T> fmt::Debug for ShardedHandle<T> {
    #[cfg_attr(test, mutants::skip)] // Diagnostic output only, not part of the contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedHandle")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
