use serde::{Deserialize, Serialize};

/// Snapshot of the engine's derived counters.
///
/// Everything here is recomputable from the chain and the engine's counters;
/// the engine republishes copies, never shared references, so callers cannot
/// mutate engine state through a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct MiningStats {
    /// Measured search throughput plus virtual hashrate, hashes per second
    pub hashrate: u64,
    /// Passive throughput from owned hardware
    pub virtual_hashrate: u64,
    /// Cumulative hashes tried since construction/reset
    pub total_hashes: u64,
    pub blocks_found: u64,
    pub rejected_blocks: u64,
    /// Spendable balance in satoshis
    pub balance: u64,
    /// Difficulty the next round will search at
    pub difficulty: u32,
    /// Expected seconds to the next block at the current search rate
    pub estimated_secs: u64,
    pub power_draw_watts: u64,
    /// Hashes per watt
    pub efficiency: f64,
    /// Total units of hardware owned
    pub hardware_count: u64,
    /// When the current mining session started, ms since the epoch
    pub started_at_ms: i64,
}

impl MiningStats {
    pub fn fresh(difficulty: u32, started_at_ms: i64) -> MiningStats {
        MiningStats {
            hashrate: 0,
            virtual_hashrate: 0,
            total_hashes: 0,
            blocks_found: 0,
            rejected_blocks: 0,
            balance: 0,
            difficulty,
            estimated_secs: 0,
            power_draw_watts: 0,
            efficiency: 0.0,
            hardware_count: 0,
            started_at_ms,
        }
    }

    /// `16^difficulty / hashrate`, the expected seconds until a hash with the
    /// required prefix turns up at the given search rate.
    pub fn estimate_secs(difficulty: u32, hashrate: u64) -> u64 {
        if hashrate == 0 {
            return 0;
        }
        let search_space: u128 = 1u128 << (4 * difficulty.min(31));
        u64::try_from(search_space / hashrate as u128).unwrap_or(u64::MAX)
    }
}

/// Per-worker share of the measured hashrate, published with each progress
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub id: usize,
    pub hashrate: u64,
    /// Progress batches attributed to this worker
    pub shares: u64,
}
