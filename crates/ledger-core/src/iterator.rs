use std::sync::Arc;

use crate::chain::ChainStore;
use crate::error::{LedgerError, Result};
use crate::Block;

/// Cursor that follows `prev_hash` links from a starting hash back to genesis.
///
/// A single iterator is not meant to be shared between threads; independent
/// iterators over the same store are fine.
pub struct ChainIterator<S: ChainStore> {
    store: Arc<S>,
    current: String,
    failed: bool,
}

impl<S: ChainStore> ChainIterator<S> {
    pub fn new(store: Arc<S>, start: impl Into<String>) -> Self {
        Self {
            store,
            current: start.into(),
            failed: false,
        }
    }

    /// Fetches the block under the cursor and moves the cursor to its
    /// predecessor. Past genesis the cursor is empty and every call fails
    /// with [`LedgerError::BlockNotFound`].
    pub fn next_block(&mut self) -> Result<Block> {
        if self.current.is_empty() {
            return Err(LedgerError::BlockNotFound(String::new()));
        }
        let block = self.store.load_block(&self.current)?;
        self.current = block.prev_hash.clone();
        Ok(block)
    }

    pub fn current_hash(&self) -> &str {
        &self.current
    }
}

/// Yields `Ok` blocks newest first and ends after genesis. A lookup error is
/// yielded once, then the iterator is exhausted.
impl<S: ChainStore> Iterator for ChainIterator<S> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.current.is_empty() {
            return None;
        }
        let next = self.next_block();
        if next.is_err() {
            self.failed = true;
        }
        Some(next)
    }
}
