//! Cryptographic utilities for identities.
//!
//! Provides Ed25519 signing/verification and SHA3-256 hashing.

use crate::core::{Error, Hash256, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::{Digest, Sha3_256};
use zeroize::Zeroizing;

/// Length of an Ed25519 secret seed.
pub const SECRET_KEY_SIZE: usize = 32;

/// Ed25519 key pair bound to one identity.
#[derive(Clone)]
pub struct CryptoSuite {
    signing_key: SigningKey,
}

impl CryptoSuite {
    /// Create a new CryptoSuite from 32 fresh random bytes.
    pub fn generate() -> Result<Self> {
        let mut seed = Zeroizing::new([0u8; SECRET_KEY_SIZE]);
        OsRng
            .try_fill_bytes(seed.as_mut_slice())
            .map_err(|e| Error::IdentityCreation(format!("random source unavailable: {}", e)))?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Create from existing secret key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; SECRET_KEY_SIZE] = bytes.try_into().map_err(|_| {
            Error::InvalidKeyFormat(format!(
                "expected {} key bytes, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            ))
        })?;
        let seed = Zeroizing::new(seed);
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Get the secret key bytes.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_SIZE]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Get the verifying (public) key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Get the verifying key bytes.
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key().to_bytes()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Verify a signature made by this key pair.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        verify(&self.verifying_key(), message, signature)
    }
}

impl std::fmt::Debug for CryptoSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoSuite")
            .field("public_key", &hex::encode(self.verifying_key_bytes()))
            .finish()
    }
}

/// Verify a signature with a public key.
pub fn verify(public_key: &VerifyingKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| Error::InvalidKeyFormat("Invalid signature length".into()))?;
    let sig = Signature::from_bytes(&sig_bytes);
    public_key.verify(message, &sig)?;
    Ok(())
}

/// Parse raw public key bytes.
pub fn verifying_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| Error::InvalidKeyFormat(format!("public key must be 32 bytes, got {}", bytes.len())))?;
    VerifyingKey::from_bytes(&arr).map_err(|e| Error::InvalidKeyFormat(e.to_string()))
}

/// Compute SHA3-256 hash of data.
pub fn sha3_256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    Hash256::new(hasher.finalize().into())
}
