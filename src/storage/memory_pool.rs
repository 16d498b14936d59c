use crate::core::Transaction;
use std::sync::RwLock;

/// Pending transactions awaiting inclusion, kept in arrival order.
///
/// Arrival order matters: selection sorts by fee with a stable sort, so two
/// transactions with equal fees are taken first-come-first-served and the
/// result is deterministic. Entries leave the pool only when the block
/// containing them commits; there is no expiry.
pub struct Mempool {
    inner: RwLock<Vec<Transaction>>,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

impl Mempool {
    pub fn new() -> Mempool {
        Mempool {
            inner: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, tx: Transaction) {
        match self.inner.write() {
            Ok(mut pool) => pool.push(tx),
            Err(_) => {
                log::error!("Failed to acquire write lock on mempool");
            }
        }
    }

    /// Bulk insert used when restoring persisted state.
    pub fn extend(&self, txs: Vec<Transaction>) {
        match self.inner.write() {
            Ok(mut pool) => pool.extend(txs),
            Err(_) => {
                log::error!("Failed to acquire write lock on mempool");
            }
        }
    }

    /// Drop the entries that were committed in a block.
    pub fn remove_ids(&self, ids: &[String]) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.retain(|tx| !ids.iter().any(|id| id == tx.get_id()));
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on mempool");
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut pool) => pool.clear(),
            Err(_) => {
                log::error!("Failed to acquire write lock on mempool");
            }
        }
    }

    /// Copy of the pool in arrival order.
    pub fn snapshot(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.clone(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                Vec::new()
            }
        }
    }

    /// Pick up to `max_count` transactions for the next block, highest fee
    /// first. Does not mutate the pool.
    pub fn select(&self, max_count: usize) -> Vec<Transaction> {
        let mut candidates = self.snapshot();
        candidates.sort_by(|a, b| b.get_fee().cmp(&a.get_fee()));
        candidates.truncate(max_count);
        candidates
    }
}
