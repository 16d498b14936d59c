// Transactions are immutable value records: once created nothing rewrites
// them, and the fee is the only key the block builder orders them by.

use crate::error::Result;
use crate::utils::{current_timestamp, sha256_hex};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sender string carried by coinbase transactions
pub const COINBASE_SENDER: &str = "COINBASE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: String,
    from: String,
    to: String,
    /// Amount in satoshis
    amount: u64,
    /// Fee in satoshis; the sole ordering key for block inclusion
    fee: u64,
    /// Creation time, milliseconds since the Unix epoch
    timestamp: i64,
    /// Present only when a signed transfer is replayed from elsewhere;
    /// the engine itself never signs (simulated wallet)
    signature: Option<String>,
}

impl Transaction {
    /// Create a pending transfer destined for the mempool.
    pub fn new(from: &str, to: &str, amount: u64, fee: u64) -> Result<Transaction> {
        Ok(Transaction {
            id: format!("tx_{}", Uuid::new_v4().simple()),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            fee,
            timestamp: current_timestamp()?,
            signature: None,
        })
    }

    /// Create the reward transaction a miner includes for itself.
    pub fn new_coinbase(block_index: u64, miner: &str, reward: u64) -> Result<Transaction> {
        Ok(Transaction {
            id: format!("coinbase_{}_{}", block_index, Uuid::new_v4().simple()),
            from: COINBASE_SENDER.to_string(),
            to: miner.to_string(),
            amount: reward,
            fee: 0,
            timestamp: current_timestamp()?,
            signature: None,
        })
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_from(&self) -> &str {
        &self.from
    }

    pub fn get_to(&self) -> &str {
        &self.to
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_coinbase(&self) -> bool {
        self.from == COINBASE_SENDER
    }

    /// Canonical byte serialization hashed into Merkle leaves.
    ///
    /// Field order is fixed; changing it would change every Merkle root and
    /// invalidate persisted chains.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        format!(
            "{}:{}:{}:{}:{}:{}",
            self.id, self.from, self.to, self.amount, self.fee, self.timestamp
        )
        .into_bytes()
    }

    /// Hex digest of the canonical serialization.
    pub fn hash_hex(&self) -> String {
        sha256_hex(&self.canonical_bytes())
    }

    /// Build a transaction with a fixed id and timestamp (tests only).
    #[cfg(test)]
    pub fn fixed(id: &str, from: &str, to: &str, amount: u64, fee: u64, timestamp: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            fee,
            timestamp,
            signature: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coinbase_shape() {
        let tx = Transaction::new_coinbase(42, "miner-address", 1_000).unwrap();
        assert!(tx.is_coinbase());
        assert_eq!(tx.get_from(), COINBASE_SENDER);
        assert_eq!(tx.get_to(), "miner-address");
        assert_eq!(tx.get_amount(), 1_000);
        assert_eq!(tx.get_fee(), 0);
        assert!(tx.get_id().starts_with("coinbase_42_"));
    }

    #[test]
    fn test_regular_transaction_is_not_coinbase() {
        let tx = Transaction::new("alice", "bob", 500, 9).unwrap();
        assert!(!tx.is_coinbase());
        assert!(tx.get_id().starts_with("tx_"));
        assert!(tx.get_signature().is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Transaction::new("alice", "bob", 1, 1).unwrap();
        let b = Transaction::new("alice", "bob", 1, 1).unwrap();
        assert_ne!(a.get_id(), b.get_id());
    }

    #[test]
    fn test_canonical_hash_depends_on_content() {
        let a = Transaction::fixed("t1", "alice", "bob", 10, 2, 1_000);
        let same = Transaction::fixed("t1", "alice", "bob", 10, 2, 1_000);
        let other = Transaction::fixed("t1", "alice", "bob", 11, 2, 1_000);

        assert_eq!(a.hash_hex(), same.hash_hex());
        assert_ne!(a.hash_hex(), other.hash_hex());
        assert_eq!(a.hash_hex().len(), 64);
    }
}
