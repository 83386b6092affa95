use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("failed to read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid PEM data: {0}")]
    Pem(#[from] pem::PemError),

    #[error("invalid RSA key: {0}")]
    Key(String),

    #[error("no public key for recipient `{0}`")]
    UnknownRecipient(String),

    #[error("failed to encrypt message for recipient `{recipient}`: {reason}")]
    Encrypt { recipient: String, reason: String },

    #[error("failed to decrypt message in transaction `{id}`: {reason}")]
    Decrypt { id: String, reason: String },

    #[error("transaction serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TxError>;
