//! # Hashrig - A Simulated Proof-of-Work Mining Engine
//!
//! This crate is a single-process mining simulator with a real ledger core:
//! the chain, the hashes and the difficulty control are genuine, only the
//! network is missing.
//!
//! ## What It Does
//! - **Append-only chain**: blocks linked by hash, validated before commit
//! - **Nonce search**: batch SHA-256 search against a leading-zero target,
//!   with cooperative cancellation and progress snapshots
//! - **Difficulty retargeting**: coarse hysteresis controller over the last
//!   ten block timestamps, bounded to [1, 10]
//! - **Halving rewards**: the subsidy halves every 210 000 blocks
//! - **Fee-ordered mempool**: pending transactions selected highest-fee-first
//! - **Hardware inventory**: purchasable rigs that accrue passive payouts
//! - **Full persistence**: the entire engine state round-trips through one
//!   record, revalidated on load
//!
//! ## How The Code Is Organized
//! - `core/`: blocks, transactions, Merkle aggregation, the proof-of-work
//!   search, difficulty and rewards, and the chain owner
//! - `engine/`: the mining loop state machine and every public operation
//! - `storage/`: the mempool and the persistence gateway (sled or in-memory)
//! - `wallet/`: simulated base58check addressing (no key custody)
//! - `config/`: the explicit engine configuration, hardware catalog included
//! - `utils/`: digests, encodings, timestamps, serialization helpers
//! - `cli/`: the command-line driver's argument definitions
//!
//! ## Where To Start Reading
//! 1. `engine/mod.rs` for the loop and the public surface
//! 2. `core/ledger.rs` for what makes a block acceptable
//! 3. `storage/state_store.rs` for how state survives restarts

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{EngineConfig, HardwareItem};
pub use core::{
    subsidy, Block, DifficultyController, Ledger, ProofOfWork, Transaction, BASE_REWARD,
    HALVING_INTERVAL, SATOSHIS_PER_COIN,
};
pub use engine::{EngineEvent, MiningEngine, MiningStats, WorkerSnapshot};
pub use error::{EngineError, Result};
pub use storage::{MemoryStateStore, Mempool, PersistedState, SledStateStore, StateStore};
pub use utils::{current_timestamp, sha256_digest, sha256_hex};
pub use wallet::{new_wallet_address, validate_address};
