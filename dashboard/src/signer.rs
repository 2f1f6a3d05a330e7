//! # Local Keypair Signer
//!
//! [`SignerCapability`] backed by a locally held keypair, for running the
//! data core without a host wallet. Supports Solana CLI keypair files
//! (JSON byte array), base58 secrets, and ephemeral keypairs generated
//! on connect.

use crate::service::{SignerCapability, SignerError};
use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::signature::{Keypair, Signer};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Where the keypair material comes from on connect.
enum KeypairSource {
    /// Solana CLI keypair file (JSON byte array) or base58 file.
    File(PathBuf),
    /// Base58 encoded secret key.
    Base58(String),
    /// Fresh random keypair, regenerated on every connect.
    Ephemeral,
}

/// Signer that loads and holds a keypair locally.
pub struct LocalKeypairSigner {
    source: KeypairSource,
    keypair: Mutex<Option<Keypair>>,
}

impl LocalKeypairSigner {
    /// Signer loading its keypair from a file on connect.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: KeypairSource::File(path.into()),
            keypair: Mutex::new(None),
        }
    }

    /// Signer loading its keypair from a base58 secret on connect.
    pub fn from_base58(secret: impl Into<String>) -> Self {
        Self {
            source: KeypairSource::Base58(secret.into()),
            keypair: Mutex::new(None),
        }
    }

    /// Signer generating a fresh keypair on every connect.
    pub fn ephemeral() -> Self {
        Self {
            source: KeypairSource::Ephemeral,
            keypair: Mutex::new(None),
        }
    }

    fn load(&self) -> Result<Keypair, SignerError> {
        match &self.source {
            KeypairSource::File(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    SignerError::Other(format!("failed to read keypair file: {}", e))
                })?;
                keypair_from_str(&contents)
            }
            KeypairSource::Base58(secret) => keypair_from_base58(secret),
            KeypairSource::Ephemeral => Ok(Keypair::new()),
        }
    }
}

#[async_trait]
impl SignerCapability for LocalKeypairSigner {
    async fn select(&self, _provider: &str) -> Result<(), SignerError> {
        // A local keypair is the only provider this signer knows.
        Ok(())
    }

    async fn connect(&self) -> Result<String, SignerError> {
        let keypair = self.load()?;
        let pubkey = keypair.pubkey().to_string();
        *self.keypair.lock() = Some(keypair);
        info!(account = %pubkey, "local keypair loaded");
        Ok(pubkey)
    }

    async fn disconnect(&self) {
        self.keypair.lock().take();
    }
}

/// Parse keypair material: JSON byte array or base58.
fn keypair_from_str(contents: &str) -> Result<Keypair, SignerError> {
    if contents.trim().starts_with('[') {
        let bytes: Vec<u8> = serde_json::from_str(contents)
            .map_err(|e| SignerError::Other(format!("invalid keypair JSON: {}", e)))?;
        keypair_from_bytes(&bytes)
    } else {
        keypair_from_base58(contents)
    }
}

fn keypair_from_base58(secret: &str) -> Result<Keypair, SignerError> {
    let bytes = bs58::decode(secret.trim())
        .into_vec()
        .map_err(|e| SignerError::Other(format!("invalid base58 secret: {}", e)))?;
    keypair_from_bytes(&bytes)
}

/// Accepts the 32-byte secret seed or the 64-byte Solana CLI format
/// (secret followed by public key); only the seed half is used.
fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair, SignerError> {
    if bytes.len() != 32 && bytes.len() != 64 {
        return Err(SignerError::Other(format!(
            "expected 32 or 64 key bytes, got {}",
            bytes.len()
        )));
    }
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&bytes[..32]);
    Ok(Keypair::new_from_array(seed))
}
