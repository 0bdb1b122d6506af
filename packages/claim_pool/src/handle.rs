use std::fmt;
use std::sync::Arc;

use crate::{Generation, Slot};

/// The ownership capability for one claimed slot of a [`ClaimPool`][crate::ClaimPool].
///
/// This is the low-level form of a claim, bound to one slot in one specific generation of the
/// pool. It does not release anything on drop; ownership is tracked by explicit calls:
///
/// * Every claim holds one reference.
/// * [`retain()`](Self::retain) adds an owner.
/// * [`release()`](Self::release) removes an owner and reports whether it was the last one.
///
/// Sharing a value among N owners therefore takes N - 1 calls to `retain()` and exactly N calls
/// to `release()` in total. Releasing once more than that is a protocol violation and panics.
///
/// Cloning a handle copies the capability, so the clone can be handed to another owner. It does
/// not add an owner by itself - call `retain()` for that.
///
/// A handle keeps its generation alive and stays fully functional after the pool has grown
/// and moved on to a newer generation.
///
/// For automatic release on drop, use [`Pooled`][crate::Pooled] instead.
///
/// # Examples
///
/// ```
/// use claim_pool::ClaimPool;
/// use new_zealand::nz;
///
/// let pool = ClaimPool::new(nz!(4), || 42);
///
/// let handle = pool.get_handle();
/// assert_eq!(*handle.value(), 42);
///
/// // Share the value with one more owner.
/// handle.retain();
/// let other_owner = handle.clone();
///
/// assert!(!other_owner.release());
///
/// // The last release frees the slot for future claims.
/// assert!(handle.release());
/// ```
///
/// # Thread safety
///
/// The handle is thread-safe if `T` is thread-safe.
pub struct Handle<T> {
    generation: Arc<Generation<T>>,
    index: usize,
}

impl<T> Handle<T> {
    #[must_use]
    pub(crate) fn new(generation: Arc<Generation<T>>, index: usize) -> Self {
        Self { generation, index }
    }

    fn slot(&self) -> &Slot<T> {
        self.generation.slot(self.index)
    }

    /// Adds an owner to the claimed slot.
    ///
    /// Each call must be matched by one extra call to [`release()`](Self::release).
    ///
    /// # Panics
    ///
    /// Panics if the slot has already been released by all of its owners.
    #[inline]
    pub fn retain(&self) {
        self.slot().retain();
    }

    /// Removes an owner from the claimed slot.
    ///
    /// Returns `true` if this was the last owner, in which case the slot is free and may be
    /// handed out by a future claim. Returns `false` if other owners remain.
    ///
    /// # Panics
    ///
    /// Panics if the slot has already been released by all of its owners. This means the
    /// ownership protocol has been violated somewhere and continuing could hand the same
    /// value to two unrelated claimants.
    #[inline]
    #[must_use = "the return value indicates whether the slot was freed"]
    pub fn release(&self) -> bool {
        self.slot().release()
    }

    /// Borrows the pooled value.
    ///
    /// The value is never reset by the pool, so it contains whatever the previous owners left
    /// behind. Mutation requires interior mutability in `T`, which is uncontended as long as
    /// the ownership protocol is followed.
    #[must_use]
    #[inline]
    pub fn value(&self) -> &T {
        self.slot().value()
    }

    /// The number of the generation this handle is bound to.
    #[must_use]
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.number()
    }

    /// The index of the slot this handle is bound to, within its generation.
    #[must_use]
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the slot currently has exactly one owner.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.slot().refcount() == 1
    }

    /// Whether both handles are bound to the same slot of the same generation.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.generation, &other.generation) && self.index == other.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            generation: Arc::clone(&self.generation),
            index: self.index,
        }
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("generation", &self.generation.number())
            .field("index", &self.index)
            .field("refcount", &self.slot().refcount())
            .finish()
    }
}
