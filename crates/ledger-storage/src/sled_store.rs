use ledger_core::{Block, ChainStore, LedgerError, Result};
use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, info};

const TREE_BLOCKS: &str = "blocks";
const KEY_TIP: &[u8] = b"tip";

/// sled-backed chain storage. Blocks live in their own tree keyed by hash,
/// the tip pointer sits in the default tree.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
  blocks: Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let key = path.display().to_string();
    let db = sled::open(path).map_err(|e| LedgerError::storage(&key, e))?;
    let blocks = db
      .open_tree(TREE_BLOCKS)
      .map_err(|e| LedgerError::storage(TREE_BLOCKS, e))?;
    info!(path = %key, "sled store opened");
    Ok(Self { db, blocks })
  }

  /// Flushes pending writes. The handle stays usable.
  pub fn close(&self) -> Result<()> {
    self
      .db
      .flush()
      .map_err(|e| LedgerError::storage("flush", e))?;
    Ok(())
  }

  /// Removes every block and the tip.
  pub fn clear(&self) -> Result<()> {
    self
      .blocks
      .clear()
      .map_err(|e| LedgerError::storage(TREE_BLOCKS, e))?;
    self
      .db
      .remove(KEY_TIP)
      .map_err(|e| LedgerError::storage("tip", e))?;
    self.close()
  }

  pub fn block_count(&self) -> usize {
    self.blocks.len()
  }
}

impl ChainStore for SledStore {
  fn exists(&self) -> Result<bool> {
    self
      .db
      .contains_key(KEY_TIP)
      .map_err(|e| LedgerError::storage("tip", e))
  }

  fn load_tip(&self) -> Result<Option<String>> {
    let tip = self
      .db
      .get(KEY_TIP)
      .map_err(|e| LedgerError::storage("tip", e))?;
    tip
      .map(|v| String::from_utf8(v.to_vec()).map_err(|e| LedgerError::storage("tip", e)))
      .transpose()
  }

  fn save_block(&self, block: &Block) -> Result<()> {
    let bytes = block.serialize()?;
    self
      .blocks
      .insert(block.hash.as_bytes(), bytes)
      .map_err(|e| LedgerError::storage(&block.hash, e))?;
    self
      .blocks
      .flush()
      .map_err(|e| LedgerError::storage(&block.hash, e))?;
    debug!(index = block.index, hash = %block.hash, "block stored");
    Ok(())
  }

  fn save_tip(&self, hash: &str) -> Result<()> {
    self
      .db
      .insert(KEY_TIP, hash.as_bytes())
      .map_err(|e| LedgerError::storage("tip", e))?;
    self.close()?;
    debug!(%hash, "tip stored");
    Ok(())
  }

  fn load_block(&self, hash: &str) -> Result<Block> {
    let bytes = self
      .blocks
      .get(hash.as_bytes())
      .map_err(|e| LedgerError::storage(hash, e))?
      .ok_or_else(|| LedgerError::BlockNotFound(hash.to_string()))?;
    Block::deserialize(&bytes).map_err(|e| LedgerError::storage(hash, e))
  }
}
