//! Free-list pool with per-worker shards.

mod builder;
mod handle;
mod pool;
mod shard_key;

pub use builder::*;
pub use handle::*;
pub use pool::ShardedPool;
pub use shard_key::*;
