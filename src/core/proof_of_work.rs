use crate::core::Block;
use crate::utils::sha256_digest;
use data_encoding::HEXLOWER;
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;

// Each hex character of the digest carries 4 bits, so requiring `difficulty`
// leading zero characters is the same as hash < 2^(256 - 4*difficulty).
const BITS_PER_HEX_CHAR: u32 = 4;

/// Nonce search for one candidate block.
pub struct ProofOfWork {
    target: BigInt,
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> ProofOfWork {
        let mut target = BigInt::from(1);
        target.shl_assign(256 - BITS_PER_HEX_CHAR * difficulty);
        ProofOfWork { target, difficulty }
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Numeric form of the prefix rule.
    pub fn meets_target(&self, hash: &[u8]) -> bool {
        let hash_int = BigInt::from_bytes_be(Sign::Plus, hash);
        hash_int < self.target
    }

    /// String form of the prefix rule, used when re-checking sealed blocks.
    pub fn has_required_prefix(hash_hex: &str, difficulty: u32) -> bool {
        hash_hex.len() == 64
            && hash_hex
                .chars()
                .take(difficulty as usize)
                .all(|c| c == '0')
    }

    /// Search nonces `1, 2, 3, …` until the header digest meets the target.
    ///
    /// Every `batch` attempts the search yields to `on_batch` with the number
    /// of hashes tried so far; returning `false` from the callback abandons
    /// the round and the function returns `None`. This is the loop's only
    /// suspension point, and the only place cancellation is observed.
    pub fn search<F>(&self, block: &Block, batch: u64, mut on_batch: F) -> Option<(u64, String)>
    where
        F: FnMut(u64) -> bool,
    {
        let mut nonce: u64 = 0;
        loop {
            nonce += 1;
            let hash = sha256_digest(&block.header_bytes(nonce));
            if self.meets_target(&hash) {
                return Some((nonce, HEXLOWER.encode(&hash)));
            }

            if nonce % batch == 0 && !on_batch(nonce) {
                return None;
            }
        }
    }
}
