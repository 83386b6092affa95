//! Encrypted message transactions: each output is sealed for its recipient
//! with RSA-OAEP, and a recipient opens what it receives with its private key.
//! Also generates P-256 node key pairs.

pub mod error;
pub mod keys;
pub mod transaction;

pub use error::{Result, TxError};
pub use keys::{NodeKeyPair, PemFileKeys, RecipientKeys};
pub use transaction::{MessageInput, MessageOutput, Transaction};
