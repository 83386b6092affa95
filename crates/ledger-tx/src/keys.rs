use p256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use pem::Pem;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, TxError};

const RSA_PUBLIC_KEY_TAG: &str = "RSA PUBLIC KEY";

/// Resolves a recipient label to the RSA key its messages are sealed with.
pub trait RecipientKeys {
    fn public_key(&self, recipient: &str) -> Result<RsaPublicKey>;
}

/// Treats each recipient as the path of a PKCS#1 PEM public key file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PemFileKeys;

impl RecipientKeys for PemFileKeys {
    fn public_key(&self, recipient: &str) -> Result<RsaPublicKey> {
        load_public_key(recipient)
    }
}

impl RecipientKeys for HashMap<String, RsaPublicKey> {
    fn public_key(&self, recipient: &str) -> Result<RsaPublicKey> {
        self.get(recipient)
            .cloned()
            .ok_or_else(|| TxError::UnknownRecipient(recipient.to_string()))
    }
}

/// Returns the DER body of the first PEM block in `path`.
pub fn read_pem_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let raw = std::fs::read(path).map_err(|source| TxError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(pem::parse(raw)?.into_contents())
}

pub fn load_public_key(path: impl AsRef<Path>) -> Result<RsaPublicKey> {
    let der = read_pem_file(path)?;
    RsaPublicKey::from_pkcs1_der(&der).map_err(|e| TxError::Key(e.to_string()))
}

pub fn public_key_pem(key: &RsaPublicKey) -> Result<String> {
    let der = key.to_pkcs1_der().map_err(|e| TxError::Key(e.to_string()))?;
    Ok(pem::encode(&Pem::new(RSA_PUBLIC_KEY_TAG, der.as_bytes().to_vec())))
}

pub fn generate_rsa_key(bits: usize) -> Result<RsaPrivateKey> {
    RsaPrivateKey::new(&mut rand::thread_rng(), bits).map_err(|e| TxError::Key(e.to_string()))
}

/// P-256 key pair identifying a node or producer.
pub struct NodeKeyPair {
    secret: SecretKey,
}

impl NodeKeyPair {
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    /// Big-endian scalar, hex encoded.
    pub fn private_hex(&self) -> String {
        hex::encode(self.secret.to_bytes())
    }

    /// Uncompressed SEC1 point (`04 || X || Y`), hex encoded.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_key().to_encoded_point(false).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn node_key_pair_encodings() {
        let pair = NodeKeyPair::generate();
        assert_eq!(pair.private_hex().len(), 64);
        let public = pair.public_hex();
        assert_eq!(public.len(), 130);
        assert!(public.starts_with("04"));
        assert_ne!(pair.private_hex(), NodeKeyPair::generate().private_hex());
    }

    #[test]
    fn public_key_pem_file_round_trip() {
        let key = generate_rsa_key(1024).unwrap();
        let public = RsaPublicKey::from(&key);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(public_key_pem(&public).unwrap().as_bytes())
            .unwrap();

        assert_eq!(load_public_key(file.path()).unwrap(), public);
        let path = file.path().to_str().unwrap();
        assert_eq!(PemFileKeys.public_key(path).unwrap(), public);
    }

    #[test]
    fn missing_key_file_is_io_error() {
        let err = load_public_key("/no/such/recipient.pem").unwrap_err();
        assert!(matches!(err, TxError::Io { .. }));
    }

    #[test]
    fn non_pem_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not pem").unwrap();
        assert!(matches!(
            read_pem_file(file.path()),
            Err(TxError::Pem(_))
        ));
    }

    #[test]
    fn unknown_recipient_in_key_map() {
        let keys: HashMap<String, RsaPublicKey> = HashMap::new();
        assert!(matches!(
            keys.public_key("bob"),
            Err(TxError::UnknownRecipient(ref r)) if r == "bob"
        ));
    }
}
