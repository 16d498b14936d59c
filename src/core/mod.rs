//! Core ledger functionality
//!
//! Blocks, transactions, Merkle aggregation, the proof-of-work search,
//! difficulty retargeting, the reward schedule and the chain owner.

pub mod block;
pub mod difficulty;
pub mod ledger;
pub mod merkle;
pub mod proof_of_work;
pub mod reward;
pub mod transaction;

pub use block::Block;
pub use difficulty::DifficultyController;
pub use ledger::Ledger;
pub use proof_of_work::ProofOfWork;
pub use reward::{subsidy, BASE_REWARD, DEFAULT_TRANSACTION_FEE, HALVING_INTERVAL, SATOSHIS_PER_COIN};
pub use transaction::{Transaction, COINBASE_SENDER};
