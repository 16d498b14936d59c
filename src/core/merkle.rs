use crate::core::Transaction;
use crate::utils::sha256_hex;

/// Width of a hex-encoded SHA-256 digest
const DIGEST_HEX_LEN: usize = 64;

/// Canonical root for a block with no transactions.
pub fn empty_root() -> String {
    "0".repeat(DIGEST_HEX_LEN)
}

/// Merkle root over an ordered transaction list.
///
/// Each transaction's canonical serialization is hashed individually, then
/// adjacent pairs are hashed together level by level until one digest
/// remains. A level of odd length duplicates its last element. The pairing
/// and duplication rules are load-bearing: they determine the root value and
/// therefore block validity, so they must not change.
pub fn merkle_root(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return empty_root();
    }

    let mut level: Vec<String> = transactions.iter().map(|tx| tx.hash_hex()).collect();

    while level.len() > 1 {
        let mut next_level = Vec::with_capacity((level.len() + 1) / 2);
        let mut i = 0;

        while i < level.len() {
            let left = &level[i];
            let right = if i + 1 < level.len() {
                &level[i + 1]
            } else {
                // Odd number of nodes: duplicate the last one
                &level[i]
            };

            next_level.push(sha256_hex(format!("{left}{right}").as_bytes()));
            i += 2;
        }

        level = next_level;
    }

    level.swap_remove(0)
}

/// Check that a block's stored root matches its transactions.
pub fn verify_root(transactions: &[Transaction], expected_root: &str) -> bool {
    merkle_root(transactions) == expected_root
}
