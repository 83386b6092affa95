use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::pow::ProofOfWork;

/// One admitted ledger entry together with its proof of work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Wall-clock creation time in nanoseconds since the Unix epoch.
    pub timestamp: u64,
    pub payload: String,
    /// Hash of the preceding block, empty for genesis.
    pub prev_hash: String,
    pub nonce: u64,
    /// Hex-encoded SHA-256 digest, filled in by mining.
    pub hash: String,
    pub difficulty: u32,
    pub producer: String,
}

impl Block {
    /// Builds an unmined block stamped with the current time.
    pub fn new(
        index: u64,
        payload: impl Into<String>,
        prev_hash: impl Into<String>,
        difficulty: u32,
        producer: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(index, now_nanos(), payload, prev_hash, difficulty, producer)
    }

    pub fn with_timestamp(
        index: u64,
        timestamp: u64,
        payload: impl Into<String>,
        prev_hash: impl Into<String>,
        difficulty: u32,
        producer: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp,
            payload: payload.into(),
            prev_hash: prev_hash.into(),
            nonce: 0,
            hash: String::new(),
            difficulty,
            producer: producer.into(),
        }
    }

    /// Runs the proof-of-work search at the block's own difficulty and fills
    /// in `nonce` and `hash`.
    pub fn mine(mut self) -> Self {
        let (hash, nonce) = ProofOfWork::new(&self, self.difficulty).run();
        self.hash = hash;
        self.nonce = nonce;
        self
    }

    /// The string that gets hashed for a given nonce. Field order is fixed:
    /// index, timestamp, payload, prev_hash, nonce, producer.
    pub fn hash_record(&self, nonce: u64) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.index, self.timestamp, self.payload, self.prev_hash, nonce, self.producer
        )
    }

    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.hash_record(nonce).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Recomputes the digest using the stored nonce.
    pub fn calculate_hash(&self) -> String {
        self.hash_with_nonce(self.nonce)
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_empty()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

pub(crate) fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
