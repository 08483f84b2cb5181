//! In-process path cache
//!
//! Entries live in a bounded `moka` cache with a time-to-live, keyed by path,
//! generation and query key. Entries of an old generation are unreachable as
//! soon as the generation moves on.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use moka::future::Cache;
use tokio::sync::RwLock;

use super::PathCache;
use crate::{
    constants::{CACHE_MAX_ENTRIES, CACHE_TTL_SECS},
    error::Failure,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    path: String,
    generation: u64,
    key: String,
}

/// Path cache kept in process memory
pub struct MemoryPathCache {
    entries: Cache<EntryKey, String>,
    generations: RwLock<HashMap<String, u64>>,
}

impl MemoryPathCache {
    pub fn new() -> Self {
        Self::with_limits(CACHE_MAX_ENTRIES, Duration::from_secs(CACHE_TTL_SECS))
    }

    /// Cache holding at most `max_entries`, each for at most `ttl`
    pub fn with_limits(max_entries: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self {
            entries,
            generations: RwLock::new(HashMap::new()),
        }
    }

    fn entry_key(path: &str, generation: u64, key: &str) -> EntryKey {
        EntryKey {
            path: path.to_string(),
            generation,
            key: key.to_string(),
        }
    }
}

impl Default for MemoryPathCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PathCache for MemoryPathCache {
    async fn generation(&self, path: &str) -> Result<u64, Failure> {
        Ok(self.generations.read().await.get(path).copied().unwrap_or(0))
    }

    async fn get(&self, path: &str, key: &str) -> Result<Option<String>, Failure> {
        let generation = self.generation(path).await?;
        Ok(self.entries.get(&Self::entry_key(path, generation, key)).await)
    }

    async fn put(
        &self,
        path: &str,
        key: &str,
        value: String,
        generation: u64,
    ) -> Result<bool, Failure> {
        // Held across the insert so a revalidation cannot slip in between
        let generations = self.generations.read().await;
        if generations.get(path).copied().unwrap_or(0) != generation {
            return Ok(false);
        }

        self.entries
            .insert(Self::entry_key(path, generation, key), value)
            .await;
        Ok(true)
    }

    async fn revalidate(&self, path: &str) -> Result<(), Failure> {
        let mut generations = self.generations.write().await;
        let current = generations.entry(path.to_string()).or_insert(0);
        *current += 1;
        let current = *current;

        let path = path.to_string();
        self.entries
            .invalidate_entries_if(move |entry, _| entry.path == path && entry.generation < current)
            .map_err(anyhow::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = MemoryPathCache::new();
        assert!(cache.put("/users", "page=1", "cached".to_string(), 0).await.unwrap());

        assert_eq!(
            cache.get("/users", "page=1").await.unwrap().as_deref(),
            Some("cached")
        );
        assert!(cache.get("/users", "page=2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revalidate_drops_only_that_path() {
        let cache = MemoryPathCache::new();
        cache.put("/users", "a", "1".to_string(), 0).await.unwrap();
        cache.put("/other", "a", "2".to_string(), 0).await.unwrap();

        cache.revalidate("/users").await.unwrap();

        assert!(cache.get("/users", "a").await.unwrap().is_none());
        assert!(cache.get("/other", "a").await.unwrap().is_some());
        assert_eq!(cache.generation("/users").await.unwrap(), 1);
        assert_eq!(cache.generation("/other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_from_before_revalidation_is_refused() {
        let cache = MemoryPathCache::new();
        let generation = cache.generation("/users").await.unwrap();

        cache.revalidate("/users").await.unwrap();

        let stored = cache
            .put("/users", "page=1", "stale".to_string(), generation)
            .await
            .unwrap();
        assert!(!stored);
        assert!(cache.get("/users", "page=1").await.unwrap().is_none());

        let generation = cache.generation("/users").await.unwrap();
        assert!(cache.put("/users", "page=1", "fresh".to_string(), generation).await.unwrap());
        assert_eq!(
            cache.get("/users", "page=1").await.unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn test_entry_count_stays_within_capacity() {
        let cache = MemoryPathCache::with_limits(5, Duration::from_secs(60));

        for i in 0..50 {
            cache
                .put("/users", &format!("page={i}"), "x".to_string(), 0)
                .await
                .unwrap();
        }
        cache.entries.run_pending_tasks().await;

        assert!(cache.entries.entry_count() <= 5);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MemoryPathCache::with_limits(10, Duration::from_millis(50));
        cache.put("/users", "a", "1".to_string(), 0).await.unwrap();
        assert!(cache.get("/users", "a").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get("/users", "a").await.unwrap().is_none());
    }
}
