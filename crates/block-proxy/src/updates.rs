//! Post-fetch side effects.
//!
//! Request tasks never wait for the recency tracker or the cache to be
//! written. They push a [`PostFetchUpdate`] onto a bounded queue instead and a
//! single background task applies it. A full or closed queue drops the update
//! with a warning; the request that produced it is unaffected.

use std::sync::Arc;

use tokio::sync::mpsc::{
    self,
    error::TrySendError,
};
use tokio_util::sync::CancellationToken;
use tracing::{
    debug,
    trace,
    warn,
};

use crate::{
    cache::{
        BlockCache,
        SharedBlockCache,
    },
    recency::RecencyTracker,
    types::Block,
};

#[derive(Debug, Clone)]
pub enum PostFetchUpdate {
    /// Raise the recency mark to this block number.
    Recency(u64),
    /// Store a historical block under its canonical identifier.
    Cache { key: String, block: Arc<Block> },
}

impl PostFetchUpdate {
    fn kind(&self) -> &'static str {
        match self {
            Self::Recency(_) => "recency",
            Self::Cache { .. } => "cache",
        }
    }
}

/// Handle used by request tasks to enqueue updates without blocking.
#[derive(Debug, Clone)]
pub struct UpdateSender {
    tx: mpsc::Sender<PostFetchUpdate>,
}

impl UpdateSender {
    /// Enqueues `update`. Returns `false` if it had to be dropped.
    pub fn submit(&self, update: PostFetchUpdate) -> bool {
        match self.tx.try_send(update) {
            Ok(()) => true,
            Err(TrySendError::Full(update)) => {
                warn!(kind = update.kind(), "update queue full, dropping update");
                metrics::counter!("block_proxy_update_dropped_total", "reason" => "full")
                    .increment(1);
                false
            }
            Err(TrySendError::Closed(update)) => {
                warn!(kind = update.kind(), "update worker stopped, dropping update");
                metrics::counter!("block_proxy_update_dropped_total", "reason" => "closed")
                    .increment(1);
                false
            }
        }
    }
}

/// Creates the bounded queue between request tasks and the update worker.
pub fn update_channel(capacity: usize) -> (UpdateSender, mpsc::Receiver<PostFetchUpdate>) {
    let (tx, rx) = mpsc::channel(capacity);
    (UpdateSender { tx }, rx)
}

/// Applies queued updates until every sender is gone or `cancel_token` fires.
pub async fn listen_for_updates(
    mut rx: mpsc::Receiver<PostFetchUpdate>,
    tracker: RecencyTracker,
    cache: SharedBlockCache,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                debug!("update worker received cancellation signal, shutting down...");
                break;
            }
            update = rx.recv() => {
                let Some(update) = update else {
                    debug!("all update senders dropped, shutting down update worker");
                    break;
                };
                apply(update, &tracker, cache.as_ref());
            }
        }
    }
}

fn apply(update: PostFetchUpdate, tracker: &RecencyTracker, cache: &dyn BlockCache) {
    match update {
        PostFetchUpdate::Recency(number) => {
            if tracker.update(number) {
                debug!(block_number = number, "updated latest known block number");
            } else {
                trace!(
                    block_number = number,
                    latest = tracker.read(),
                    "ignoring stale block number"
                );
            }
        }
        PostFetchUpdate::Cache { key, block } => {
            debug!(identifier = %key, "caching block");
            // Entries live until the cache evicts them for capacity.
            cache.set(key, block, None);
        }
    }
}
