//! In-memory [`ChainStore`] used by tests and ephemeral nodes. Write failures
//! can be injected to exercise the chain's error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::chain::ChainStore;
use crate::error::{LedgerError, Result};
use crate::Block;

#[derive(Default)]
pub struct MemoryStore {
    blocks: RwLock<HashMap<String, Vec<u8>>>,
    tip: RwLock<Option<String>>,
    fail_blocks: AtomicBool,
    fail_tip: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save_block` fail.
    pub fn fail_block_writes(&self, fail: bool) {
        self.fail_blocks.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `save_tip` fail.
    pub fn fail_tip_writes(&self, fail: bool) {
        self.fail_tip.store(fail, Ordering::SeqCst);
    }

    pub fn block_count(&self) -> usize {
        self.blocks.read().map(|b| b.len()).unwrap_or_default()
    }
}

impl ChainStore for MemoryStore {
    fn exists(&self) -> Result<bool> {
        Ok(self.load_tip()?.is_some())
    }

    fn load_tip(&self) -> Result<Option<String>> {
        let tip = self.tip.read().map_err(|e| LedgerError::storage("tip", e))?;
        Ok(tip.clone())
    }

    fn save_block(&self, block: &Block) -> Result<()> {
        if self.fail_blocks.load(Ordering::SeqCst) {
            return Err(LedgerError::storage(&block.hash, "injected block write failure"));
        }
        let bytes = block.serialize()?;
        self.blocks
            .write()
            .map_err(|e| LedgerError::storage(&block.hash, e))?
            .insert(block.hash.clone(), bytes);
        Ok(())
    }

    fn save_tip(&self, hash: &str) -> Result<()> {
        if self.fail_tip.load(Ordering::SeqCst) {
            return Err(LedgerError::storage("tip", "injected tip write failure"));
        }
        *self.tip.write().map_err(|e| LedgerError::storage("tip", e))? = Some(hash.to_string());
        Ok(())
    }

    fn load_block(&self, hash: &str) -> Result<Block> {
        let blocks = self.blocks.read().map_err(|e| LedgerError::storage(hash, e))?;
        let bytes = blocks
            .get(hash)
            .ok_or_else(|| LedgerError::BlockNotFound(hash.to_string()))?;
        Block::deserialize(bytes).map_err(|e| LedgerError::storage(hash, e))
    }
}
