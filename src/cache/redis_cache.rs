//! Redis-backed path cache
//!
//! Each path is one Redis hash plus a generation counter. Revalidation bumps
//! the counter and deletes the hash in one transaction; writes go through a
//! script that checks the counter first and refreshes the hash's expiry.

use std::sync::LazyLock;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Script};

use super::PathCache;
use crate::{constants::CACHE_TTL_SECS, error::Failure};

const KEY_PREFIX: &str = "path_cache:";
const GENERATION_PREFIX: &str = "path_cache_gen:";

/// KEYS: generation, hash. ARGV: expected generation, field, value, ttl.
static PUT_IF_CURRENT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        local current = redis.call('GET', KEYS[1]) or '0'
        if current ~= ARGV[1] then
            return 0
        end
        redis.call('HSET', KEYS[2], ARGV[2], ARGV[3])
        redis.call('EXPIRE', KEYS[2], ARGV[4])
        return 1
        ",
    )
});

/// Path cache shared between instances through Redis
#[derive(Clone)]
pub struct RedisPathCache {
    conn: ConnectionManager,
}

impl RedisPathCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn hash_key(path: &str) -> String {
        format!("{KEY_PREFIX}{path}")
    }

    fn generation_key(path: &str) -> String {
        format!("{GENERATION_PREFIX}{path}")
    }
}

#[async_trait]
impl PathCache for RedisPathCache {
    async fn generation(&self, path: &str) -> Result<u64, Failure> {
        let mut conn = self.conn.clone();
        let generation: Option<u64> = conn.get(Self::generation_key(path)).await?;
        Ok(generation.unwrap_or(0))
    }

    async fn get(&self, path: &str, key: &str) -> Result<Option<String>, Failure> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(Self::hash_key(path), key).await?;
        Ok(value)
    }

    async fn put(
        &self,
        path: &str,
        key: &str,
        value: String,
        generation: u64,
    ) -> Result<bool, Failure> {
        let mut conn = self.conn.clone();
        let stored: i64 = PUT_IF_CURRENT
            .key(Self::generation_key(path))
            .key(Self::hash_key(path))
            .arg(generation)
            .arg(key)
            .arg(value)
            .arg(CACHE_TTL_SECS)
            .invoke_async(&mut conn)
            .await?;

        if stored == 0 {
            tracing::debug!(path, key, generation, "Skipped caching a superseded entry");
        }
        Ok(stored == 1)
    }

    async fn revalidate(&self, path: &str) -> Result<(), Failure> {
        let mut conn = self.conn.clone();
        let () = redis::pipe()
            .atomic()
            .incr(Self::generation_key(path), 1)
            .ignore()
            .del(Self::hash_key(path))
            .ignore()
            .query_async(&mut conn)
            .await?;
        tracing::debug!(path, "Revalidated cached path");
        Ok(())
    }
}
