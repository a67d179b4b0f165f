use std::sync::Arc;

use tracing::{
    debug,
    warn,
};

use crate::{
    cache::SharedBlockCache,
    error::Result,
    identifier::BlockIdentifier,
    recency::RecencyTracker,
    transport::RpcTransport,
    types::Block,
    updates::{
        PostFetchUpdate,
        UpdateSender,
    },
};

/// Blocks at least this far behind the known head are treated as settled and
/// may be served from the cache.
pub const FRESHNESS_THRESHOLD: u64 = 20;

/// How a request for a given identifier is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRoute {
    /// Fetch upstream and feed the block number back into the tracker.
    /// The cache is neither read nor written.
    Bypass,
    /// Serve from the cache, fetching and caching on a miss.
    Cacheable,
}

/// Decides per request whether the cache may be consulted.
#[derive(Clone, Debug)]
pub struct CacheGate {
    transport: RpcTransport,
    tracker: RecencyTracker,
    cache: SharedBlockCache,
    updates: UpdateSender,
}

impl CacheGate {
    pub fn new(
        transport: RpcTransport,
        tracker: RecencyTracker,
        cache: SharedBlockCache,
        updates: UpdateSender,
    ) -> Self {
        Self {
            transport,
            tracker,
            cache,
            updates,
        }
    }

    pub fn tracker(&self) -> &RecencyTracker {
        &self.tracker
    }

    pub fn transport(&self) -> &RpcTransport {
        &self.transport
    }

    /// `latest` always bypasses the cache. A number is cacheable once it is
    /// more than [`FRESHNESS_THRESHOLD`] blocks behind the known head.
    pub fn route(&self, identifier: &BlockIdentifier) -> CacheRoute {
        match identifier {
            BlockIdentifier::Latest => CacheRoute::Bypass,
            BlockIdentifier::Number(number) => {
                let age = self.tracker.age_of(*number);
                debug!(block_number = *number, age, "computed block age");
                if age > FRESHNESS_THRESHOLD {
                    CacheRoute::Cacheable
                } else {
                    CacheRoute::Bypass
                }
            }
        }
    }

    pub async fn get_or_fetch(&self, identifier: &BlockIdentifier) -> Result<Arc<Block>> {
        match self.route(identifier) {
            CacheRoute::Cacheable => self.get_cacheable(identifier).await,
            CacheRoute::Bypass => {
                debug!(%identifier, "block too recent to cache, requesting node");
                metrics::counter!("block_proxy_cache_bypass_total").increment(1);
                let block = Arc::new(self.transport.fetch_block(identifier).await?);
                self.submit_recency(&block);
                Ok(block)
            }
        }
    }

    async fn get_cacheable(&self, identifier: &BlockIdentifier) -> Result<Arc<Block>> {
        let key = identifier.canonical();
        debug!(identifier = %key, "checking cache for block");

        if let Some(block) = self.cache.get(&key) {
            debug!(identifier = %key, "block found in cache");
            metrics::counter!("block_proxy_cache_hit_total").increment(1);
            return Ok(block);
        }

        debug!(identifier = %key, "block not found in cache, requesting node");
        metrics::counter!("block_proxy_cache_miss_total").increment(1);
        let block = Arc::new(self.transport.fetch_block(identifier).await?);
        self.updates.submit(PostFetchUpdate::Cache {
            key,
            block: block.clone(),
        });
        Ok(block)
    }

    fn submit_recency(&self, block: &Block) {
        match block.number_u64() {
            Some(number) => {
                self.updates.submit(PostFetchUpdate::Recency(number));
            }
            None => {
                warn!(
                    number = %block.header.number,
                    hash = %block.hash(),
                    "block carries a malformed number, not updating recency"
                );
            }
        }
    }
}
