use std::sync::Arc;

use parking_lot::RwLock;

/// Best known chain head, shared between all requesters.
///
/// Updates are monotonic: a late response for an older block can never move
/// the mark backwards.
#[derive(Clone, Debug, Default)]
pub struct RecencyTracker {
    latest: Arc<RwLock<u64>>,
}

impl RecencyTracker {
    pub fn new(latest: u64) -> Self {
        Self {
            latest: Arc::new(RwLock::new(latest)),
        }
    }

    pub fn read(&self) -> u64 {
        *self.latest.read()
    }

    /// Raises the mark to `number`. Returns `true` if the mark moved.
    pub fn update(&self, number: u64) -> bool {
        let mut latest = self.latest.write();
        if number <= *latest {
            return false;
        }
        *latest = number;
        // Set under the lock so concurrent advances publish in order.
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("block_proxy_latest_block").set(number as f64);
        true
    }

    /// Distance between the known head and `number`, zero when `number` is at
    /// or ahead of the head.
    pub fn age_of(&self, number: u64) -> u64 {
        self.read().saturating_sub(number)
    }
}
