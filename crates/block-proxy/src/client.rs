use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{
    debug,
    info,
};

use crate::{
    cache::SharedBlockCache,
    error::{
        BlockClientError,
        Result,
    },
    gate::CacheGate,
    identifier::{
        LATEST_TAG,
        normalize,
    },
    recency::RecencyTracker,
    transport::RpcTransport,
    types::{
        Block,
        Transaction,
    },
    updates::{
        listen_for_updates,
        update_channel,
    },
};

fn default_update_queue_size() -> usize {
    1024
}

/// Tuning knobs for [`BlockClient::connect`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Capacity of the queue feeding the post-fetch update worker.
    pub update_queue_size: usize,
    /// Stops the update worker when cancelled.
    pub cancel_token: CancellationToken,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            update_queue_size: default_update_queue_size(),
            cancel_token: CancellationToken::new(),
        }
    }
}

/// Resolves blocks through the cache gate and looks up their transactions.
///
/// Cheap to clone; clones share the tracker, the cache and the update queue.
#[derive(Clone, Debug)]
pub struct BlockClient {
    gate: Arc<CacheGate>,
    cancel_token: CancellationToken,
}

impl BlockClient {
    /// Spawns the update worker and resolves `latest` once to seed the
    /// recency tracker. The client is only returned if that first fetch
    /// succeeds.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn connect(
        transport: RpcTransport,
        cache: SharedBlockCache,
        options: ClientOptions,
    ) -> Result<Self> {
        let tracker = RecencyTracker::default();
        let (updates, rx) = update_channel(options.update_queue_size);

        tokio::spawn(listen_for_updates(
            rx,
            tracker.clone(),
            cache.clone(),
            options.cancel_token.clone(),
        ));

        let client = Self {
            gate: Arc::new(CacheGate::new(transport, tracker, cache, updates)),
            cancel_token: options.cancel_token,
        };

        let latest = client
            .get_block_by(LATEST_TAG)
            .await
            .map_err(|err| BlockClientError::ClientInit(Box::new(err)))?;
        let number = latest.number_u64().ok_or_else(|| {
            BlockClientError::ClientInit(Box::new(BlockClientError::MalformedBlockNumber(
                latest.header.number.clone(),
            )))
        })?;
        client.gate.tracker().update(number);

        info!(
            upstream = %client.gate.transport().url(),
            latest_block = number,
            "block client ready"
        );
        Ok(client)
    }

    pub fn tracker(&self) -> &RecencyTracker {
        self.gate.tracker()
    }

    /// Stops the background update worker. Requests keep working, but the
    /// tracker and cache are no longer updated.
    ///
    /// Only the token handed in through [`ClientOptions`] is cancelled; pass a
    /// child token to keep its parent alive.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Resolves a block by a raw identifier: `latest`, a decimal number or a
    /// `0x`-prefixed hex number.
    pub async fn get_block_by(&self, raw: &str) -> Result<Arc<Block>> {
        let identifier = normalize(raw)?;
        self.gate.get_or_fetch(&identifier).await
    }

    /// Finds the first transaction in `block` whose hash equals `hash`.
    pub fn get_transaction_by_hash<'a>(
        &self,
        block: &'a Block,
        hash: &str,
    ) -> Result<&'a Transaction> {
        debug!(block_number = %block.header.number, hash, "searching transaction by hash");
        block
            .transactions
            .iter()
            .find(|tx| tx.hash == hash)
            .ok_or_else(|| BlockClientError::TransactionHashNotFound {
                block_hash: block.header.hash.clone(),
                hash: hash.to_string(),
            })
    }

    /// Finds the transaction at position `index` in `block`.
    ///
    /// The position is matched against each transaction's `transactionIndex`
    /// rather than used as a slice offset, so blocks whose transactions are not
    /// sorted still resolve correctly.
    pub fn get_transaction_by_index<'a>(
        &self,
        block: &'a Block,
        index: u64,
    ) -> Result<&'a Transaction> {
        debug!(block_number = %block.header.number, index, "searching transaction by index");
        let not_found = || BlockClientError::TransactionIndexNotFound {
            block_hash: block.header.hash.clone(),
            index,
        };

        if index >= block.transactions.len() as u64 {
            return Err(not_found());
        }

        let wanted = format!("{index:#x}");
        block
            .transactions
            .iter()
            .find(|tx| tx.transaction_index == wanted)
            .ok_or_else(not_found)
    }
}
