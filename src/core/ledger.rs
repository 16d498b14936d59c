// The ledger is the single owner of the committed chain. Blocks enter only
// through `append` after passing validation, and nothing edits them in place;
// a reset throws the whole chain away and rebuilds from genesis.

use crate::core::block::GENESIS_PREVIOUS_HASH;
use crate::core::{Block, ProofOfWork};
use crate::error::{EngineError, Result};
use log::warn;

pub struct Ledger {
    blocks: Vec<Block>,
}

impl Ledger {
    /// Fresh chain holding only the genesis block.
    pub fn new(initial_difficulty: u32) -> Ledger {
        Ledger {
            blocks: vec![Block::genesis(initial_difficulty)],
        }
    }

    /// Rebuild a ledger from a restored chain.
    ///
    /// The caller is expected to have run [`Ledger::is_valid_chain`] first;
    /// this only refuses chains that are structurally unusable.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Ledger> {
        if blocks.is_empty() {
            return Err(EngineError::InvalidBlock(
                "Restored chain has no genesis block".to_string(),
            ));
        }
        Ok(Ledger { blocks })
    }

    pub fn tip(&self) -> &Block {
        self.blocks
            .last()
            .expect("Ledger always holds at least the genesis block")
    }

    /// Index of the tip block.
    pub fn height(&self) -> u64 {
        self.tip().get_index()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    /// Deep copy of the chain for snapshot consumers.
    pub fn to_vec(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    /// Re-check a sealed block against this chain, in order, stopping at the
    /// first failure: difficulty prefix, then digest re-derivation, then
    /// linkage to the previous block.
    pub fn validate_candidate(&self, block: &Block) -> Result<()> {
        if !ProofOfWork::has_required_prefix(block.get_hash(), block.get_difficulty()) {
            return Err(EngineError::InvalidBlock(format!(
                "Hash {} lacks {} leading zeros",
                block.get_hash(),
                block.get_difficulty()
            )));
        }

        if block.compute_hash() != block.get_hash() {
            return Err(EngineError::InvalidBlock(
                "Stored hash does not match the recomputed header digest".to_string(),
            ));
        }

        if block.get_index() > 0 {
            let expected_index = self.tip().get_index() + 1;
            if block.get_index() != expected_index {
                return Err(EngineError::InvalidBlock(format!(
                    "Index {} does not extend tip (expected {expected_index})",
                    block.get_index()
                )));
            }
            if block.get_previous_hash() != self.tip().get_hash() {
                return Err(EngineError::InvalidBlock(format!(
                    "Previous hash {} does not match tip {}",
                    block.get_previous_hash(),
                    self.tip().get_hash()
                )));
            }
        }

        Ok(())
    }

    /// Validate and append a sealed block.
    pub fn append(&mut self, block: Block) -> Result<()> {
        self.validate_candidate(&block)?;
        self.blocks.push(block);
        Ok(())
    }

    /// Whole-chain integrity walk, used when restoring persisted state.
    ///
    /// Genesis is checked structurally (its hash is a placeholder, not a
    /// header digest); every later block gets the full prefix, digest,
    /// linkage, index and Merkle checks.
    pub fn is_valid_chain(blocks: &[Block]) -> bool {
        let genesis = match blocks.first() {
            Some(block) => block,
            None => return false,
        };
        if genesis.get_index() != 0 || genesis.get_previous_hash() != GENESIS_PREVIOUS_HASH {
            warn!("Restored chain has a malformed genesis block");
            return false;
        }

        for i in 1..blocks.len() {
            let current = &blocks[i];
            let previous = &blocks[i - 1];

            if current.get_index() != previous.get_index() + 1 {
                warn!("Restored chain breaks index continuity at position {i}");
                return false;
            }
            if current.get_previous_hash() != previous.get_hash() {
                warn!("Restored chain breaks linkage at height {}", current.get_index());
                return false;
            }
            if !ProofOfWork::has_required_prefix(current.get_hash(), current.get_difficulty()) {
                warn!(
                    "Restored block {} fails the difficulty prefix",
                    current.get_index()
                );
                return false;
            }
            if current.compute_hash() != current.get_hash() {
                warn!("Restored block {} fails digest re-derivation", current.get_index());
                return false;
            }
            if !current.verify_merkle_root() {
                warn!("Restored block {} fails Merkle verification", current.get_index());
                return false;
            }
        }

        true
    }
}
