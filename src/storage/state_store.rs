// Durability lives entirely behind the StateStore trait: the engine saves
// one record after every state-changing operation and loads it once at
// construction. Core logic never touches sled directly, so tests swap in the
// in-memory store.

use crate::config::HardwareItem;
use crate::core::{Block, Transaction};
use crate::engine::MiningStats;
use crate::error::{EngineError, Result};
use crate::utils::{deserialize, serialize};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::RwLock;

const STATE_TREE: &str = "engine";
const STATE_KEY: &str = "state";

/// The full engine state as one serializable record.
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct PersistedState {
    pub chain: Vec<Block>,
    pub stats: MiningStats,
    pub wallet_address: String,
    pub mempool: Vec<Transaction>,
    pub difficulty: u32,
    pub inventory: Vec<HardwareItem>,
}

/// Save/load capability the engine depends on.
pub trait StateStore: Send + Sync {
    fn save(&self, state: &PersistedState) -> Result<()>;

    /// `Ok(None)` when no prior state exists; that is not an error.
    fn load(&self) -> Result<Option<PersistedState>>;
}

/// Sled-backed store: one tree, one key, bincode-encoded record.
pub struct SledStateStore {
    db: Db,
}

impl SledStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SledStateStore> {
        let db = sled::open(path.as_ref())
            .map_err(|e| EngineError::Storage(format!("Failed to open database: {e}")))?;
        Ok(SledStateStore { db })
    }
}

impl StateStore for SledStateStore {
    fn save(&self, state: &PersistedState) -> Result<()> {
        let tree = self
            .db
            .open_tree(STATE_TREE)
            .map_err(|e| EngineError::Storage(format!("Failed to open state tree: {e}")))?;
        let bytes = serialize(state)?;
        tree.insert(STATE_KEY, bytes)
            .map_err(|e| EngineError::Storage(format!("Failed to write state: {e}")))?;
        tree.flush()
            .map_err(|e| EngineError::Storage(format!("Failed to flush state: {e}")))?;
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedState>> {
        let tree = self
            .db
            .open_tree(STATE_TREE)
            .map_err(|e| EngineError::Storage(format!("Failed to open state tree: {e}")))?;
        let bytes = tree
            .get(STATE_KEY)
            .map_err(|e| EngineError::Storage(format!("Failed to read state: {e}")))?;

        match bytes {
            Some(bytes) => Ok(Some(deserialize(bytes.as_ref())?)),
            None => Ok(None),
        }
    }
}

/// In-memory store for tests and ephemeral engines.
///
/// Still round-trips through the bincode codec so tests exercise the same
/// encode/decode path as the sled store.
#[derive(Default)]
pub struct MemoryStateStore {
    inner: RwLock<Option<Vec<u8>>>,
}

impl MemoryStateStore {
    pub fn new() -> MemoryStateStore {
        MemoryStateStore {
            inner: RwLock::new(None),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn save(&self, state: &PersistedState) -> Result<()> {
        let bytes = serialize(state)?;
        let mut slot = self
            .inner
            .write()
            .map_err(|_| EngineError::Storage("Memory store lock poisoned".to_string()))?;
        *slot = Some(bytes);
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedState>> {
        let slot = self
            .inner
            .read()
            .map_err(|_| EngineError::Storage("Memory store lock poisoned".to_string()))?;
        match slot.as_ref() {
            Some(bytes) => Ok(Some(deserialize(bytes)?)),
            None => Ok(None),
        }
    }
}
