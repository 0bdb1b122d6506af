//! A lock-free pool of reusable values, shared among owners via explicit reference counting.
//!
//! This crate provides [`ClaimPool`], a pool of expensively constructed values (e.g. scratch
//! buffers) that many threads can claim concurrently. Values are constructed up front and then
//! reused indefinitely, so claiming a value never allocates in the common case.
//!
//! # Key features
//!
//! - **Lock-free claims**: A claim probes a few random slots and takes the first free one with
//!   a single atomic operation. No lock is ever taken on the claim path.
//! - **Shared ownership**: A claimed value can be shared among multiple owners. It becomes free
//!   for future claims when the last owner releases it.
//! - **Contention-driven growth**: When claims keep hitting claimed slots, the pool constructs a
//!   new set of values. Many threads detecting contention at once still cause only one growth.
//! - **Fatal protocol violations**: Releasing a value more often than it was claimed and
//!   retained panics instead of silently handing the value to two claimants.
//! - **Sharded variant**: [`ShardedPool`] keeps free values on per-worker stacks, which suits
//!   workloads where each worker mostly reuses its own values.
//!
//! # Handle types
//!
//! ## [`Pooled<T>`] - automatic release
//!
//! Returned by [`ClaimPool::get()`]. Each `Pooled` is one owner: cloning adds an owner and
//! dropping releases one.
//!
//! ## [`Handle<T>`] - explicit ownership protocol
//!
//! Returned by [`ClaimPool::get_handle()`]. Owners are tracked by explicit calls to
//! [`Handle::retain()`] and [`Handle::release()`]. Nothing happens on drop.
//!
//! # Examples
//!
//! ## Scratch buffers
//!
//! ```rust
//! use claim_pool::ClaimPool;
//! use new_zealand::nz;
//! use parking_lot::Mutex;
//!
//! let pool = ClaimPool::new(nz!(8), || Mutex::new(vec![0_u8; 4096]));
//!
//! std::thread::scope(|s| {
//!     for worker in 0..4_u8 {
//!         let pool = &pool;
//!
//!         s.spawn(move || {
//!             let buffer = pool.get();
//!
//!             // The pool does not reset values, so we initialize what we use.
//!             let mut bytes = buffer.lock();
//!             bytes.fill(worker);
//!             assert!(bytes.iter().all(|&b| b == worker));
//!         });
//!     }
//! });
//! ```
//!
//! ## Sharing a value with explicit retain and release
//!
//! ```rust
//! use claim_pool::ClaimPool;
//! use new_zealand::nz;
//!
//! let pool = ClaimPool::new(nz!(1), || 42);
//!
//! let handle = pool.get_handle();
//!
//! // Three owners in total: the claim plus two retains.
//! handle.retain();
//! handle.retain();
//!
//! assert!(!handle.release());
//! assert!(!handle.release());
//! assert!(handle.release()); // Last owner - the slot is free again.
//! ```
//!
//! # Metrics
//!
//! The pools report claims, probe counts and growth events via the [`nm`] metrics crate under
//! event names starting with `claim_pool_`.

mod builder;
mod error;
mod generation;
mod growth_policy;
mod handle;
mod metrics;
mod pool;
mod pooled;
mod probe;
mod sharded;
mod slot;

pub use builder::*;
pub use error::*;
pub(crate) use generation::*;
pub use growth_policy::*;
pub use handle::*;
pub use pool::ClaimPool;
pub use pooled::*;
pub(crate) use probe::*;
pub use sharded::*;
pub(crate) use slot::*;
