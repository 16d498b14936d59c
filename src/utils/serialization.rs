// Thin wrappers around the bincode 2.x API so callers deal with one error type
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Encode a value with bincode's standard configuration.
pub fn serialize<T: Serialize + bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| EngineError::Serialization(format!("Serialization failed: {e}")))
}

/// Decode a value with bincode's standard configuration.
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de> + bincode::Decode<()>,
{
    let config = bincode::config::standard();
    let (data, _) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| EngineError::Serialization(format!("Deserialization failed: {e}")))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
    struct Record {
        index: u64,
        hash: String,
        fees: Vec<u64>,
    }

    #[test]
    fn test_round_trip() {
        let original = Record {
            index: 7,
            hash: "00ab".to_string(),
            fees: vec![9, 5, 1],
        };

        let bytes = serialize(&original).expect("encode should work");
        let restored: Record = deserialize(&bytes).expect("decode should work");
        assert_eq!(original, restored);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let garbage = vec![0xde, 0xad, 0xbe, 0xef];
        let result: Result<Record> = deserialize(&garbage);
        assert!(result.is_err());
    }
}
