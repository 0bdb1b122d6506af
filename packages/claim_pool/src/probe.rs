use std::cell::RefCell;
use std::num::NonZero;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

thread_local! {
    // Seeded once per thread from the thread-local cryptographic generator, after which every
    // probe is a handful of arithmetic instructions with no shared state.
    static PROBE_RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_rng(&mut rand::rng()));
}

/// Returns a uniformly distributed index in `[0, len)`.
#[must_use]
#[inline]
pub(crate) fn random_index(len: NonZero<usize>) -> usize {
    PROBE_RNG.with_borrow_mut(|rng| rng.random_range(0..len.get()))
}
