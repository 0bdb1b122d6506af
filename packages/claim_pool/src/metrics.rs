//! Metrics for the pools.
//!
//! The events are per-thread instances, so recording them never contends with other threads.

use nm::{Event, Magnitude};

/// Histogram buckets for the number of probes needed by a successful claim.
///
/// A lightly loaded pool almost always succeeds on the first probe. Higher values mean the
/// pool is running close to saturation.
const CLAIM_PROBES_BUCKETS: &[Magnitude] = &[1, 2, 3, 4, 6, 8, 12, 16, 32];

thread_local! {
    /// Successful claims, from any pool flavor.
    pub(crate) static CLAIMS: Event = Event::builder()
        .name("claim_pool_claims")
        .build();

    /// Probes needed per successful claim.
    pub(crate) static CLAIM_PROBES: Event = Event::builder()
        .name("claim_pool_claim_probes")
        .histogram(CLAIM_PROBES_BUCKETS)
        .build();

    /// Claim attempts where every probe hit a claimed slot.
    pub(crate) static PROBE_EXHAUSTIONS: Event = Event::builder()
        .name("claim_pool_probe_exhaustions")
        .build();

    /// Generations published by growth. The magnitude is the capacity of the new generation.
    pub(crate) static GROWTHS: Event = Event::builder()
        .name("claim_pool_growths")
        .build();

    /// Values constructed by a sharded pool because its shard had no free value to reuse.
    pub(crate) static SHARDED_ALLOCATIONS: Event = Event::builder()
        .name("claim_pool_sharded_allocations")
        .build();
}
