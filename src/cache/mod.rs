//! Path cache
//!
//! Rendered responses are cached per path (e.g. `/users`) and per query key.
//! Every path has a generation number. Revalidating a path bumps it and drops
//! every entry stored under it, and a write tagged with an older generation is
//! refused. A reader that started before a mutation therefore cannot put its
//! stale page back after the revalidation.

mod memory;
mod redis_cache;

use async_trait::async_trait;

use crate::error::Failure;

pub use memory::MemoryPathCache;
pub use redis_cache::RedisPathCache;

/// Cache of serialized responses grouped by path
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PathCache: Send + Sync {
    /// Current generation of `path`; read it before computing a value to store
    async fn generation(&self, path: &str) -> Result<u64, Failure>;

    /// Cached entry for `key` under `path`
    async fn get(&self, path: &str, key: &str) -> Result<Option<String>, Failure>;

    /// Store `value` for `key` under `path`.
    ///
    /// Returns `false` without storing when `path` was revalidated since
    /// `generation` was read.
    async fn put(&self, path: &str, key: &str, value: String, generation: u64)
        -> Result<bool, Failure>;

    /// Drop everything cached under `path` and start a new generation
    async fn revalidate(&self, path: &str) -> Result<(), Failure>;
}
