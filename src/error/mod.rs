//! Error handling for the mining engine
//!
//! Every fallible operation in the crate returns [`Result`] with an
//! [`EngineError`] describing what went wrong.

use std::fmt;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error types for engine operations
#[derive(Debug, Clone)]
pub enum EngineError {
    /// Persistent store errors (sled)
    Storage(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Block validation errors
    InvalidBlock(String),
    /// Transaction construction errors
    Transaction(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// Invalid wallet address format
    InvalidAddress(String),
    /// Insufficient balance for a purchase or withdrawal
    InsufficientFunds { required: u64, available: u64 },
    /// Mining loop errors
    Mining(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Storage(msg) => write!(f, "Storage error: {msg}"),
            EngineError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            EngineError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            EngineError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            EngineError::Config(msg) => write!(f, "Configuration error: {msg}"),
            EngineError::Io(msg) => write!(f, "I/O error: {msg}"),
            EngineError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            EngineError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            EngineError::Mining(msg) => write!(f, "Mining error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<sled::Error> for EngineError {
    fn from(err: sled::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for EngineError {
    fn from(err: bincode::error::EncodeError) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for EngineError {
    fn from(err: bincode::error::DecodeError) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
