use moka::future::Cache as MokaCache;
use tracing::debug;

use super::{CacheEntry, CacheStore};
use crate::error::CacheResult;
use crate::key::CacheKey;

/// In-process store backed by Moka. Entries are bounded by count and do not expire.
#[derive(Clone)]
pub struct MemoryStore {
    cache: MokaCache<CacheKey, CacheEntry>,
}

impl MemoryStore {
    pub const DEFAULT_CAPACITY: u64 = 10_000;

    pub fn new(max_entries: u64) -> Self {
        debug!(max_entries, "Memory store created");
        Self {
            cache: MokaCache::builder().max_capacity(max_entries).build(),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        Ok(self.cache.get(key).await)
    }

    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> CacheResult<()> {
        self.cache.insert(key.clone(), entry.clone()).await;
        Ok(())
    }
}
