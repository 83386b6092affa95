//! Difficulty-gated nonce search. A hash is admissible when its first
//! `difficulty` hex digits are all `'0'`.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::Block;

/// Nonces examined per round by the parallel search.
const PARALLEL_BATCH: u64 = 1 << 16;

pub struct ProofOfWork<'a> {
    block: &'a Block,
    difficulty: u32,
}

impl<'a> ProofOfWork<'a> {
    pub fn new(block: &'a Block, difficulty: u32) -> Self {
        Self { block, difficulty }
    }

    /// Linear scan over `0, 1, 2, ...`. Returns the first admissible hash and
    /// its nonce.
    pub fn run(&self) -> (String, u64) {
        let mut nonce = 0u64;
        loop {
            let hash = self.block.hash_with_nonce(nonce);
            if is_valid_hash(&hash, self.difficulty) {
                debug!(index = self.block.index, nonce, "proof of work found");
                return (hash, nonce);
            }
            nonce = nonce.wrapping_add(1);
        }
    }

    /// Same result as [`run`](Self::run), searched batch by batch on the rayon
    /// pool. `find_first` keeps the answer the smallest admissible nonce.
    pub fn run_parallel(&self) -> (String, u64) {
        let mut start = 0u64;
        loop {
            let end = start.saturating_add(PARALLEL_BATCH);
            let found = (start..end).into_par_iter().find_first(|nonce| {
                is_valid_hash(&self.block.hash_with_nonce(*nonce), self.difficulty)
            });
            if let Some(nonce) = found {
                return (self.block.hash_with_nonce(nonce), nonce);
            }
            start = end;
        }
    }

    /// Linear scan that checks `cancel` before every attempt. Returns `None`
    /// once the flag is raised.
    pub fn run_cancellable(&self, cancel: &AtomicBool) -> Option<(String, u64)> {
        let mut nonce = 0u64;
        loop {
            if cancel.load(Ordering::Relaxed) {
                debug!(index = self.block.index, nonce, "proof of work cancelled");
                return None;
            }
            let hash = self.block.hash_with_nonce(nonce);
            if is_valid_hash(&hash, self.difficulty) {
                return Some((hash, nonce));
            }
            nonce = nonce.wrapping_add(1);
        }
    }
}

pub fn is_valid_hash(hash: &str, difficulty: u32) -> bool {
    let d = difficulty as usize;
    hash.len() >= d && hash.bytes().take(d).all(|b| b == b'0')
}

pub fn count_leading_zero_digits(hash: &str) -> usize {
    hash.bytes().take_while(|b| *b == b'0').count()
}

/// True when the stored hash is reproducible from the block's fields and
/// satisfies the block's recorded difficulty.
pub fn validate(block: &Block) -> bool {
    block.calculate_hash() == block.hash && is_valid_hash(&block.hash, block.difficulty)
}
