use std::{
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};

use moka::{
    Expiry,
    sync::Cache,
};

use crate::types::Block;

/// Storage for historical blocks, keyed by canonical identifier.
///
/// Implementations own their eviction policy and must be safe to share
/// between request tasks.
pub trait BlockCache: std::fmt::Debug + Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<Block>>;

    /// Stores `value` under `key`. A `ttl` of `None` keeps the entry until
    /// the implementation decides to evict it.
    fn set(&self, key: String, value: Arc<Block>, ttl: Option<Duration>);
}

pub type SharedBlockCache = Arc<dyn BlockCache>;

/// Configuration for the in-process block cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of blocks kept before the least recently used ones are
    /// evicted.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 1024 }
    }
}

#[derive(Clone, Debug)]
struct CachedBlock {
    block: Arc<Block>,
    ttl: Option<Duration>,
}

/// Reads the per-entry lifetime off the cached value.
struct PerEntryTtl;

impl Expiry<String, CachedBlock> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedBlock,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedBlock,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Bounded [`BlockCache`] backed by moka.
#[derive(Clone)]
pub struct MokaBlockCache {
    blocks: Cache<String, CachedBlock>,
}

impl MokaBlockCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            blocks: Cache::builder()
                .max_capacity(config.max_entries)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.blocks.entry_count()
    }

    /// Applies pending evictions. Mostly useful to make `entry_count` exact.
    pub fn run_pending_tasks(&self) {
        self.blocks.run_pending_tasks();
    }
}

impl std::fmt::Debug for MokaBlockCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBlockCache")
            .field("entries", &self.blocks.entry_count())
            .finish()
    }
}

impl BlockCache for MokaBlockCache {
    fn get(&self, key: &str) -> Option<Arc<Block>> {
        self.blocks.get(key).map(|entry| entry.block)
    }

    fn set(&self, key: String, value: Arc<Block>, ttl: Option<Duration>) {
        self.blocks.insert(key, CachedBlock { block: value, ttl });
    }
}
