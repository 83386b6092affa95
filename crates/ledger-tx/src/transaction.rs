//! A transaction carries opaque messages: outputs are encrypted for a named
//! recipient when the transaction is built, and inputs reference an earlier
//! transaction's output by id and index.

use rsa::{Oaep, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, TxError};
use crate::keys::RecipientKeys;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInput {
    pub transaction_id: String,
    pub output_index: u32,
    pub encrypted_data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageOutput {
    pub encrypted_data: Vec<u8>,
    pub recipient: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub inputs: Vec<MessageInput>,
    pub outputs: Vec<MessageOutput>,
}

impl Transaction {
    /// Assigns a fresh v4 id and seals every output for its recipient. The
    /// outputs passed in hold plaintext in `encrypted_data`.
    pub fn new(
        inputs: Vec<MessageInput>,
        outputs: Vec<MessageOutput>,
        keys: &impl RecipientKeys,
    ) -> Result<Self> {
        let mut tx = Self {
            id: Uuid::new_v4().to_string(),
            inputs,
            outputs,
        };
        tx.encrypt_messages(keys)?;
        Ok(tx)
    }

    /// Replaces each output's plaintext with its RSA-OAEP (SHA-256) ciphertext.
    /// Nothing is replaced unless every output encrypts.
    pub fn encrypt_messages(&mut self, keys: &impl RecipientKeys) -> Result<()> {
        let mut rng = rand::thread_rng();
        let mut sealed = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            let key = keys.public_key(&output.recipient)?;
            let data = key
                .encrypt(&mut rng, Oaep::new::<Sha256>(), &output.encrypted_data)
                .map_err(|e| TxError::Encrypt {
                    recipient: output.recipient.clone(),
                    reason: e.to_string(),
                })?;
            sealed.push(data);
        }
        for (output, data) in self.outputs.iter_mut().zip(sealed) {
            output.encrypted_data = data;
        }
        debug!(id = %self.id, outputs = self.outputs.len(), "transaction outputs encrypted");
        Ok(())
    }

    /// Opens every input with `key`. Nothing is replaced unless every input
    /// decrypts.
    pub fn decrypt_messages(&mut self, key: &RsaPrivateKey) -> Result<()> {
        let opened = self
            .inputs
            .iter()
            .map(|input| {
                key.decrypt(Oaep::new::<Sha256>(), &input.encrypted_data)
                    .map_err(|e| TxError::Decrypt {
                        id: self.id.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        for (input, data) in self.inputs.iter_mut().zip(opened) {
            input.encrypted_data = data;
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
