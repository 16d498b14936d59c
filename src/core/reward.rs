//! Monetary constants and the block subsidy schedule.
//!
//! All amounts in the engine are integer satoshis. The subsidy halves every
//! `halving_interval` blocks, implemented as a right shift so the value is
//! exact at every halving and reaches zero once fully shifted out.

/// Number of satoshis in one coin
pub const SATOSHIS_PER_COIN: u64 = 100_000_000;

/// Initial block subsidy in satoshis (6.25 coins)
pub const BASE_REWARD: u64 = 625 * SATOSHIS_PER_COIN / 100;

/// Blocks between subsidy halvings
pub const HALVING_INTERVAL: u64 = 210_000;

/// Default fee for mempool transactions, in satoshis
pub const DEFAULT_TRANSACTION_FEE: u64 = 10_000;

/// Block subsidy for the block at `index`.
///
/// Pure function of the index; the engine passes its configured
/// `base_reward`/`halving_interval` so tests can use small intervals.
pub fn subsidy(index: u64, base_reward: u64, halving_interval: u64) -> u64 {
    let halvings = index / halving_interval;
    if halvings >= u64::BITS as u64 {
        return 0;
    }
    base_reward >> halvings
}

/// Format a satoshi amount as a decimal coin string.
pub fn format_coins(satoshis: u64) -> String {
    format!(
        "{}.{:08}",
        satoshis / SATOSHIS_PER_COIN,
        satoshis % SATOSHIS_PER_COIN
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsidy_halving_schedule() {
        assert_eq!(subsidy(0, BASE_REWARD, HALVING_INTERVAL), BASE_REWARD);
        assert_eq!(
            subsidy(HALVING_INTERVAL, BASE_REWARD, HALVING_INTERVAL),
            BASE_REWARD / 2
        );
        assert_eq!(
            subsidy(2 * HALVING_INTERVAL, BASE_REWARD, HALVING_INTERVAL),
            BASE_REWARD / 4
        );
        // Just below the boundary the subsidy is unchanged
        assert_eq!(
            subsidy(HALVING_INTERVAL - 1, BASE_REWARD, HALVING_INTERVAL),
            BASE_REWARD
        );
    }

    #[test]
    fn test_subsidy_eventually_reaches_zero() {
        assert_eq!(subsidy(64 * HALVING_INTERVAL, BASE_REWARD, HALVING_INTERVAL), 0);
        assert_eq!(subsidy(u64::MAX, BASE_REWARD, 1), 0);
    }

    #[test]
    fn test_format_coins() {
        assert_eq!(format_coins(BASE_REWARD), "6.25000000");
        assert_eq!(format_coins(SATOSHIS_PER_COIN), "1.00000000");
        assert_eq!(format_coins(1_000), "0.00001000");
    }
}
