//! Error type shared by the chain controller, the iterator and storage backends.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The storage backend could not complete a read or write.
    #[error("storage failure at `{key}`: {reason}")]
    StorageFailure { key: String, reason: String },

    /// No block is stored under the given hash. An empty hash means the
    /// iterator walked past genesis.
    #[error("block `{0}` not found")]
    BlockNotFound(String),

    #[error("block serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn storage(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        LedgerError::StorageFailure {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::BlockNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
