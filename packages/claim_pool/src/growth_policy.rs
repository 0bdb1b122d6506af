use std::num::NonZero;

use new_zealand::nz;

/// Determines the capacity of the generation that replaces a saturated one.
///
/// Growth always abandons the saturated generation as a whole: its free slots are not carried
/// over, and it is reclaimed once the last handle into it has been released. The policy only
/// decides how large the replacement is.
///
/// # Examples
///
/// ```
/// use claim_pool::{ClaimPool, GrowthPolicy};
/// use new_zealand::nz;
///
/// let pool = ClaimPool::builder()
///     .capacity(nz!(4))
///     .growth_policy(GrowthPolicy::Double)
///     .build(|| [0_u8; 64]);
///
/// assert_eq!(pool.growth_policy(), GrowthPolicy::Double);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum GrowthPolicy {
    /// The new generation has the same capacity as the one it replaces. This is the default.
    ///
    /// Under sustained contention the pool accumulates one live generation per growth event
    /// until the handles into the older ones are released, sizing itself to peak demand.
    #[default]
    Replace,

    /// The new generation has twice the capacity of the one it replaces.
    ///
    /// This reaches a capacity matching peak demand in fewer growth events, at the cost of
    /// keeping larger generations around afterwards.
    Double,
}

impl GrowthPolicy {
    #[must_use]
    pub(crate) fn next_capacity(self, current: NonZero<usize>) -> NonZero<usize> {
        match self {
            Self::Replace => current,
            Self::Double => current.saturating_mul(nz!(2)),
        }
    }
}
