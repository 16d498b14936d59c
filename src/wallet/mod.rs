//! Simulated wallet addressing
//!
//! Addresses look like real base58check addresses and validate with a
//! checksum round-trip, but there is no key custody behind them: the engine
//! never signs anything, it only needs a stable identity to credit rewards
//! to. The derivation pipeline is random seed -> SHA-256 -> RIPEMD-160 ->
//! version byte + checksum -> Base58.

use crate::utils::{base58_decode, base58_encode, ripemd160_digest, sha256_digest};
use rand::RngCore;

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECKSUM_LEN: usize = 4;

/// Mint a fresh address from random entropy.
pub fn new_wallet_address() -> String {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    address_from_seed(&seed)
}

/// Deterministic derivation from a seed; exposed so tests can pin addresses.
pub fn address_from_seed(seed: &[u8]) -> String {
    let digest = ripemd160_digest(&sha256_digest(seed));
    let mut payload: Vec<u8> = Vec::with_capacity(1 + digest.len() + ADDRESS_CHECKSUM_LEN);
    payload.push(VERSION);
    payload.extend(digest);
    let checksum = checksum(&payload);
    payload.extend(checksum);
    base58_encode(&payload)
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first = sha256_digest(payload);
    let second = sha256_digest(&first);
    second[0..ADDRESS_CHECKSUM_LEN].to_vec()
}

/// Checksum round-trip validation of an address string.
pub fn validate_address(address: &str) -> bool {
    let payload = match base58_decode(address) {
        Ok(payload) => payload,
        Err(_) => return false,
    };

    if payload.len() < ADDRESS_CHECKSUM_LEN + 1 {
        return false;
    }

    let actual_checksum = &payload[payload.len() - ADDRESS_CHECKSUM_LEN..];
    let target_checksum = checksum(&payload[..payload.len() - ADDRESS_CHECKSUM_LEN]);
    actual_checksum == target_checksum.as_slice()
}
