//! Encrypted per-identifier key storage.

use crate::core::{Error, Result};
use crate::identity::Identifier;
use crate::keystore::cipher;
use crate::storage::{keys_with_prefix, StorageBackend};
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Storage key prefix for sealed key entries.
pub const KEY_PREFIX: &str = "key:";

/// Password-protected store of signing keys, one entry per identifier.
///
/// Entries are `base64(salt || nonce || ciphertext)` strings. Operations on
/// different identifiers never interfere; concurrent saves for the same
/// identifier are last-write-wins.
#[derive(Clone)]
pub struct KeyStore {
    backend: Arc<dyn StorageBackend>,
    iterations: u32,
}

impl KeyStore {
    /// Create a key store over `backend` using `iterations` PBKDF2 rounds.
    pub fn new(backend: Arc<dyn StorageBackend>, iterations: u32) -> Self {
        Self {
            backend,
            iterations,
        }
    }

    fn storage_key(identifier: &Identifier) -> String {
        format!("{}{}", KEY_PREFIX, identifier)
    }

    /// Encrypt and persist `key_bytes` for `identifier`.
    pub async fn save(&self, identifier: &Identifier, key_bytes: &[u8], password: &str) -> Result<()> {
        let plaintext = Zeroizing::new(key_bytes.to_vec());
        let password = Zeroizing::new(password.to_string());
        let iterations = self.iterations;
        let sealed = tokio::task::spawn_blocking(move || {
            cipher::seal(&plaintext, &password, iterations)
        })
        .await
        .map_err(|e| Error::Storage(format!("key sealing task failed: {}", e)))??;
        let encoded = base64::engine::general_purpose::STANDARD.encode(sealed);
        self.backend
            .set(&Self::storage_key(identifier), &encoded)
            .await
            .map_err(|e| match e {
                Error::Storage(_) => e,
                other => Error::Storage(other.to_string()),
            })?;
        debug!(identifier = %identifier, "stored sealed key");
        Ok(())
    }

    /// Decrypt the key for `identifier`.
    ///
    /// Returns `Ok(None)` when nothing is stored, [`Error::Decryption`] when
    /// the password is wrong or the entry is corrupted.
    pub async fn load(
        &self,
        identifier: &Identifier,
        password: &str,
    ) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let Some(encoded) = self.backend.get(&Self::storage_key(identifier)).await? else {
            return Ok(None);
        };
        let sealed = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Decryption(format!("stored key is not valid base64: {}", e)))?;
        let password = Zeroizing::new(password.to_string());
        let iterations = self.iterations;
        let opened = tokio::task::spawn_blocking(move || cipher::open(&sealed, &password, iterations))
            .await
            .map_err(|e| Error::Decryption(format!("key decryption task failed: {}", e)))?;
        match opened {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                warn!(identifier = %identifier, "key decryption failed");
                Err(e)
            }
        }
    }

    /// Whether a key is stored for `identifier`. Does not decrypt.
    pub async fn has(&self, identifier: &Identifier) -> Result<bool> {
        Ok(self
            .backend
            .get(&Self::storage_key(identifier))
            .await?
            .is_some())
    }

    /// Remove the key for `identifier`, if any.
    pub async fn delete(&self, identifier: &Identifier) -> Result<()> {
        self.backend.delete(&Self::storage_key(identifier)).await?;
        debug!(identifier = %identifier, "deleted key");
        Ok(())
    }

    /// Every identifier with a stored key, sorted.
    pub async fn list_identifiers(&self) -> Result<Vec<Identifier>> {
        let raw = keys_with_prefix(self.backend.as_ref(), KEY_PREFIX).await?;
        Ok(raw
            .into_iter()
            .filter_map(|id| match Identifier::parse(&id) {
                Ok(identifier) => Some(identifier),
                Err(_) => {
                    warn!(entry = %id, "skipping key entry with malformed identifier");
                    None
                }
            })
            .collect())
    }
}
