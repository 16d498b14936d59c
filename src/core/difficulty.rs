use crate::config::EngineConfig;
use crate::core::Block;
use log::info;

/// Difficulty retargeting over the trailing block window.
///
/// Coarse, hysteresis-style controller: it only reacts when the observed
/// window is faster than half or slower than double the target span, and
/// then only by a single step. The wide dead band keeps the difficulty from
/// oscillating when block times hover near the target.
pub struct DifficultyController;

impl DifficultyController {
    /// Next difficulty given the committed chain and the current value.
    ///
    /// Pure function: no adjustment happens until the chain holds at least
    /// `retarget_window + 1` blocks, after which the timestamps of the last
    /// `retarget_window` blocks drive the decision. The result always stays
    /// within the configured bounds.
    pub fn evaluate(chain: &[Block], current: u32, config: &EngineConfig) -> u32 {
        let window = config.retarget_window;
        if chain.len() < window + 1 {
            return current.clamp(config.min_difficulty, config.max_difficulty);
        }

        let recent = &chain[chain.len() - window..];
        let first = recent[0].get_timestamp();
        let last = recent[window - 1].get_timestamp();
        // Clock skew can make this negative; treat it as "too fast"
        let time_span = (last - first).max(0) as u128;
        let expected = config.target_block_interval_ms as u128 * window as u128;

        let next = if time_span < expected / 2 {
            current.saturating_add(1)
        } else if time_span > expected * 2 {
            current.saturating_sub(1)
        } else {
            current
        };

        let next = next.clamp(config.min_difficulty, config.max_difficulty);
        if next != current {
            info!(
                "Difficulty retarget at height {}: {current} -> {next} (span {time_span}ms, expected {expected}ms)",
                chain.len() - 1
            );
        }
        next
    }
}
