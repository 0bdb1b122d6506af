use std::fmt;
use std::num::NonZero;

use crate::{Slot, random_index};

/// A fixed set of slots created together. This is the unit of growth.
///
/// The slot layout never changes after construction; only the slot refcounts do. Handles and
/// the pool share a generation via `Arc`, so it lives until the pool has moved on to a newer
/// generation and the last handle into it is gone.
pub(crate) struct Generation<T> {
    /// Sequence number for diagnostics. The first generation of a pool is number 1.
    number: u64,

    slots: Box<[Slot<T>]>,
}

/// Result of a successful probe sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Claimed {
    pub(crate) index: usize,

    /// How many probes it took, including the successful one.
    pub(crate) probes: usize,
}

impl<T> Generation<T> {
    /// Builds a generation by calling `factory` once per slot, in slot order.
    ///
    /// Stops at the first factory error, discarding the values built so far.
    pub(crate) fn try_new<E>(
        number: u64,
        capacity: NonZero<usize>,
        mut factory: impl FnMut() -> Result<T, E>,
    ) -> Result<Self, E> {
        let slots = (0..capacity.get())
            .map(|_| factory().map(Slot::new))
            .collect::<Result<Box<[_]>, E>>()?;

        Ok(Self { number, slots })
    }

    #[must_use]
    pub(crate) fn number(&self) -> u64 {
        self.number
    }

    #[must_use]
    pub(crate) fn capacity(&self) -> NonZero<usize> {
        NonZero::new(self.slots.len()).expect("a generation always has at least one slot")
    }

    /// # Panics
    ///
    /// Panics if the index is out of bounds. Indexes only ever come from our own probing,
    /// so this indicates a bug in the pool.
    #[must_use]
    pub(crate) fn slot(&self, index: usize) -> &Slot<T> {
        self.slots
            .get(index)
            .expect("slot index is always within the generation that produced it")
    }

    /// Probes up to `probe_limit` random slots, claiming the first free one found.
    ///
    /// Returns `None` if every probe hit a claimed slot, which the pool treats as a signal
    /// that the generation is saturated.
    #[must_use]
    pub(crate) fn claim(&self, probe_limit: NonZero<usize>) -> Option<Claimed> {
        let capacity = self.capacity();

        (1..=probe_limit.get()).find_map(|probes| {
            let index = random_index(capacity);

            self.slot(index)
                .try_claim()
                .then_some(Claimed { index, probes })
        })
    }

    #[cfg(test)]
    pub(crate) fn claimed_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.refcount() > 0).count()
    }
}

impl<T> fmt::Debug for Generation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("number", &self.number)
            .field("capacity", &self.slots.len())
            .finish_non_exhaustive()
    }
}
