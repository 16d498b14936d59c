//! Utility functions
//!
//! Cryptographic digests, address encoding helpers, timestamps and the
//! bincode serialization wrappers used by the persistence layer.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ripemd160_digest, sha256_digest, sha256_hex,
};
pub use serialization::{deserialize, serialize};
