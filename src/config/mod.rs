//! Engine configuration
//!
//! All tunables live in an explicit [`EngineConfig`] passed to the engine at
//! construction. There is no global configuration object: two engines in one
//! process can run with different parameters (the tests rely on this).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::reward::{BASE_REWARD, DEFAULT_TRANSACTION_FEE, HALVING_INTERVAL, SATOSHIS_PER_COIN};

/// A purchasable piece of mining hardware.
///
/// `hashrate × owned` of every item, summed over the inventory, is the
/// engine's virtual hashrate: passive throughput that pays out on a fixed
/// tick whether or not the search loop is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct HardwareItem {
    pub id: String,
    pub name: String,
    /// Hashes per second contributed by one unit
    pub hashrate: u64,
    /// Power draw of one unit, in watts
    pub power_watts: u64,
    /// Purchase price in satoshis
    pub cost: u64,
    /// Units currently owned
    pub owned: u64,
}

impl HardwareItem {
    fn catalog(id: &str, name: &str, hashrate: u64, power_watts: u64, cost: u64) -> HardwareItem {
        HardwareItem {
            id: id.to_string(),
            name: name.to_string(),
            hashrate,
            power_watts,
            cost,
            owned: 0,
        }
    }
}

static DEFAULT_CATALOG: Lazy<Vec<HardwareItem>> = Lazy::new(|| {
    vec![
        HardwareItem::catalog(
            "gpu_rtx3080",
            "RTX 3080 GPU",
            100_000_000,
            320,
            SATOSHIS_PER_COIN / 200,
        ),
        HardwareItem::catalog(
            "asic_s19",
            "Antminer S19 Pro",
            110_000_000_000,
            3_250,
            SATOSHIS_PER_COIN / 20,
        ),
        HardwareItem::catalog(
            "quantum_v1",
            "Q-Bit Processor",
            5_000_000_000_000,
            5_000,
            SATOSHIS_PER_COIN / 2,
        ),
        HardwareItem::catalog(
            "neural_cluster",
            "Neural Cluster",
            100_000_000_000_000,
            15_000,
            5 * SATOSHIS_PER_COIN,
        ),
    ]
});

/// Immutable engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Block subsidy before any halving, in satoshis
    pub base_reward: u64,
    /// Number of blocks between reward halvings
    pub halving_interval: u64,
    /// Target spacing between blocks, in milliseconds
    pub target_block_interval_ms: u64,
    /// Difficulty the genesis chain starts at
    pub initial_difficulty: u32,
    /// Lower difficulty bound
    pub min_difficulty: u32,
    /// Upper difficulty bound
    pub max_difficulty: u32,
    /// Number of trailing blocks the retarget looks at
    pub retarget_window: usize,
    /// Maximum transactions selected into one block (coinbase excluded)
    pub mempool_cap: usize,
    /// Nonces tried between progress snapshots / stop-flag checks
    pub progress_batch: u64,
    /// Logical workers the measured hashrate is split across in snapshots
    pub worker_count: usize,
    /// Virtual hashes that earn one satoshi per second of passive payout
    pub payout_hash_per_satoshi: u64,
    /// Minimum interval between passive payouts, in milliseconds
    pub payout_tick_ms: u64,
    /// Fee attached to withdrawal transactions, in satoshis
    pub withdrawal_fee: u64,
    /// Purchasable hardware, with `owned` counts at zero
    pub hardware_catalog: Vec<HardwareItem>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_reward: BASE_REWARD,
            halving_interval: HALVING_INTERVAL,
            target_block_interval_ms: 600_000,
            initial_difficulty: 4,
            min_difficulty: 1,
            max_difficulty: 10,
            retarget_window: 10,
            mempool_cap: 2_000,
            progress_batch: 1_000,
            worker_count: 4,
            payout_hash_per_satoshi: 100_000_000,
            payout_tick_ms: 1_000,
            withdrawal_fee: 5 * DEFAULT_TRANSACTION_FEE,
            hardware_catalog: DEFAULT_CATALOG.clone(),
        }
    }
}

impl EngineConfig {
    /// Validate internal consistency. Called once at engine construction.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.min_difficulty == 0 || self.min_difficulty > self.max_difficulty {
            return Err(crate::error::EngineError::Config(format!(
                "Difficulty bounds [{}, {}] are invalid",
                self.min_difficulty, self.max_difficulty
            )));
        }
        // 64 hex characters in a SHA-256 digest
        if self.max_difficulty > 64 {
            return Err(crate::error::EngineError::Config(format!(
                "Maximum difficulty {} exceeds the digest width",
                self.max_difficulty
            )));
        }
        if !(self.min_difficulty..=self.max_difficulty).contains(&self.initial_difficulty) {
            return Err(crate::error::EngineError::Config(format!(
                "Initial difficulty {} is outside [{}, {}]",
                self.initial_difficulty, self.min_difficulty, self.max_difficulty
            )));
        }
        if self.retarget_window < 2 {
            return Err(crate::error::EngineError::Config(
                "Retarget window must cover at least 2 blocks".to_string(),
            ));
        }
        if self.progress_batch == 0 {
            return Err(crate::error::EngineError::Config(
                "Progress batch must be positive".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(crate::error::EngineError::Config(
                "Worker count must be positive".to_string(),
            ));
        }
        if self.payout_hash_per_satoshi == 0 || self.payout_tick_ms == 0 {
            return Err(crate::error::EngineError::Config(
                "Payout rate and tick must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
