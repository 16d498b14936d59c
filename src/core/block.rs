use crate::core::{merkle, Transaction};
use crate::error::Result;
use crate::utils::{current_timestamp, sha256_hex};
use serde::{Deserialize, Serialize};

/// `previous_hash` carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Miner string carried by the genesis block
pub const GENESIS_MINER: &str = "GENESIS";

// The genesis timestamp is pinned so a reset chain is byte-identical across
// runs; the value is the Bitcoin genesis moment in milliseconds.
const GENESIS_TIMESTAMP_MS: i64 = 1_231_006_505_000;

// Block size model: fixed header plus a flat per-transaction estimate.
const HEADER_SIZE_BYTES: u64 = 80;
const TRANSACTION_SIZE_BYTES: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    index: u64,
    timestamp: i64,
    transactions: Vec<Transaction>,
    nonce: u64,
    hash: String,
    previous_hash: String,
    difficulty: u32,
    miner: String,
    merkle_root: String,
    size: u64,
    reward: u64,
}

impl Block {
    /// Build an unsealed candidate for the nonce search.
    ///
    /// `hash` and `nonce` stay empty/zero until [`Block::seal`]; the Merkle
    /// root and size are fixed here, so the transaction set cannot change
    /// mid-round.
    pub fn candidate(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        difficulty: u32,
        miner: String,
        reward: u64,
    ) -> Result<Block> {
        let merkle_root = merkle::merkle_root(&transactions);
        let size = HEADER_SIZE_BYTES + TRANSACTION_SIZE_BYTES * transactions.len() as u64;

        Ok(Block {
            index,
            timestamp: current_timestamp()?,
            transactions,
            nonce: 0,
            hash: String::new(),
            previous_hash,
            difficulty,
            miner,
            merkle_root,
            size,
            reward,
        })
    }

    /// The hard-coded genesis block.
    ///
    /// Its hash is a placeholder (all zeros), not a real digest of its
    /// header; validation treats index 0 specially for that reason.
    pub fn genesis(difficulty: u32) -> Block {
        Block {
            index: 0,
            timestamp: GENESIS_TIMESTAMP_MS,
            transactions: Vec::new(),
            nonce: 0,
            hash: "0".repeat(64),
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            difficulty,
            miner: GENESIS_MINER.to_string(),
            merkle_root: merkle::empty_root(),
            size: HEADER_SIZE_BYTES,
            reward: 0,
        }
    }

    /// Canonical header bytes for a given nonce.
    ///
    /// Field order is part of the chain format: index, timestamp, Merkle
    /// root, nonce, previous hash, difficulty. Integers are big-endian.
    pub fn header_bytes(&self, nonce: u64) -> Vec<u8> {
        let mut data = Vec::with_capacity(96 + self.previous_hash.len());
        data.extend(self.index.to_be_bytes());
        data.extend(self.timestamp.to_be_bytes());
        data.extend(self.merkle_root.as_bytes());
        data.extend(nonce.to_be_bytes());
        data.extend(self.previous_hash.as_bytes());
        data.extend(self.difficulty.to_be_bytes());
        data
    }

    /// Digest of the header with the block's own stored nonce.
    pub fn compute_hash(&self) -> String {
        sha256_hex(&self.header_bytes(self.nonce))
    }

    /// Fill in the winning nonce and hash after a successful search.
    pub fn seal(&mut self, nonce: u64, hash: String) {
        self.nonce = nonce;
        self.hash = hash;
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn get_miner(&self) -> &str {
        self.miner.as_str()
    }

    pub fn get_merkle_root(&self) -> &str {
        self.merkle_root.as_str()
    }

    pub fn get_size(&self) -> u64 {
        self.size
    }

    pub fn get_reward(&self) -> u64 {
        self.reward
    }

    /// Re-derive the Merkle root from the stored transactions.
    pub fn verify_merkle_root(&self) -> bool {
        merkle::verify_root(&self.transactions, &self.merkle_root)
    }

    /// Build a fully-specified block, bypassing the candidate flow (tests only).
    #[cfg(test)]
    #[allow(clippy::too_many_arguments)]
    pub fn fixed(
        index: u64,
        timestamp: i64,
        transactions: Vec<Transaction>,
        nonce: u64,
        hash: String,
        previous_hash: String,
        difficulty: u32,
        reward: u64,
    ) -> Block {
        let merkle_root = merkle::merkle_root(&transactions);
        let size = HEADER_SIZE_BYTES + TRANSACTION_SIZE_BYTES * transactions.len() as u64;
        Block {
            index,
            timestamp,
            transactions,
            nonce,
            hash,
            previous_hash,
            difficulty,
            miner: "test-miner".to_string(),
            merkle_root,
            size,
            reward,
        }
    }
}
