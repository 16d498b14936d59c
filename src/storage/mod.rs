//! Storage: the pending-transaction pool and the persistence gateway.

pub mod memory_pool;
pub mod state_store;

pub use memory_pool::Mempool;
pub use state_store::{MemoryStateStore, PersistedState, SledStateStore, StateStore};
