//! Single-node proof-of-work ledger: blocks linked by hash, admitted after a
//! nonce search, persisted through a [`chain::ChainStore`] and walked backwards
//! with a [`iterator::ChainIterator`].

pub mod block;
pub mod chain;
pub mod constants;
pub mod error;
pub mod iterator;
pub mod memory;
pub mod pow;

pub use block::Block;
pub use chain::{genesis_block, Blockchain, ChainStore};
pub use error::{LedgerError, Result};
pub use iterator::ChainIterator;
pub use memory::MemoryStore;
