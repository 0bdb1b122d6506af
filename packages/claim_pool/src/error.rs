use thiserror::Error;

/// A boxed error returned by a fallible value factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when constructing pooled values.
///
/// Only pools built with a fallible factory via
/// [`ClaimPoolBuilder::try_build()`][crate::ClaimPoolBuilder::try_build] can produce errors.
/// Misuse of the ownership protocol is never reported as an error; it panics.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The factory failed while constructing the values of a new generation.
    ///
    /// When this happens during growth, the pool keeps using its current generation and
    /// none of the values built before the failure are ever handed out.
    #[error("factory failed to construct a pooled value")]
    Construction {
        /// The error returned by the factory.
        source: BoxError,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
