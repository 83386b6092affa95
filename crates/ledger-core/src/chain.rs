use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::GENESIS_PAYLOAD;
use crate::error::Result;
use crate::iterator::ChainIterator;
use crate::Block;

/// Persistence the chain needs from a backend. Blocks are addressed by their
/// hash; the tip is a single pointer.
/// This lives in `ledger-core` to avoid a circular dependency.
pub trait ChainStore: Send + Sync {
    /// Whether a chain has been initialized in this store before.
    fn exists(&self) -> Result<bool>;
    fn load_tip(&self) -> Result<Option<String>>;
    fn save_block(&self, block: &Block) -> Result<()>;
    fn save_tip(&self, hash: &str) -> Result<()>;
    /// Fails with [`crate::LedgerError::BlockNotFound`] when nothing is stored under `hash`.
    fn load_block(&self, hash: &str) -> Result<Block>;
}

/// Append-only chain over a [`ChainStore`]. Owns the tip; appends take
/// `&mut self` so only one can be in flight per instance.
pub struct Blockchain<S: ChainStore> {
    difficulty: u32,
    tip: String,
    store: Arc<S>,
}

impl<S: ChainStore> Blockchain<S> {
    /// Adopts the persisted tip if the store already holds a chain, otherwise
    /// mines and persists a genesis block.
    pub fn new(difficulty: u32, store: Arc<S>) -> Result<Self> {
        if store.exists()? {
            match store.load_tip()? {
                Some(tip) => {
                    debug!(%tip, "adopting persisted chain tip");
                    return Ok(Self {
                        difficulty,
                        tip,
                        store,
                    });
                }
                None => warn!("chain marked as existing but no tip is stored, creating genesis"),
            }
        }

        let genesis = genesis_block(difficulty);
        store.save_block(&genesis)?;
        store.save_tip(&genesis.hash)?;
        info!(hash = %genesis.hash, nonce = genesis.nonce, "created genesis block");

        Ok(Self {
            difficulty,
            tip: genesis.hash,
            store,
        })
    }

    /// Mines a block on top of the current tip and persists it.
    ///
    /// The block is written before the tip pointer. If the tip write fails the
    /// error is returned and the in-memory tip is left alone, so the new block
    /// sits in storage unreachable from the tip.
    pub fn add_block(
        &mut self,
        payload: impl Into<String>,
        producer: impl Into<String>,
    ) -> Result<Block> {
        let prev = self.store.load_block(&self.tip)?;
        let block = Block::new(
            prev.index + 1,
            payload,
            prev.hash,
            self.difficulty,
            producer,
        )
        .mine();

        self.store.save_block(&block)?;
        self.store.save_tip(&block.hash)?;
        self.tip = block.hash.clone();

        info!(
            index = block.index,
            nonce = block.nonce,
            hash = %block.hash,
            "mined block"
        );
        Ok(block)
    }

    pub fn tip(&self) -> &str {
        &self.tip
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn last_block(&self) -> Result<Block> {
        self.store.load_block(&self.tip)
    }

    /// Walks the chain from the current tip back to genesis.
    pub fn iter(&self) -> ChainIterator<S> {
        ChainIterator::new(self.store.clone(), self.tip.clone())
    }
}

/// A mined genesis block: index 0, empty prev-hash and producer.
pub fn genesis_block(difficulty: u32) -> Block {
    Block::new(0, GENESIS_PAYLOAD, "", difficulty, "").mine()
}
