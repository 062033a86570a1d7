//! Password-based sealing of key material.
//!
//! PBKDF2-HMAC-SHA256 turns the password into a 256-bit key, which then
//! drives ChaCha20-Poly1305. Sealed layout: `salt || nonce || ciphertext`,
//! where the ciphertext carries the 16-byte Poly1305 tag.

use crate::core::{Error, Result};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// ChaCha20-Poly1305 nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag length in bytes.
pub const TAG_SIZE: usize = 16;

const KEY_SIZE: usize = 32;

/// Fill `buf` from the OS random source.
pub fn random_bytes(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::Storage(format!("random source unavailable: {}", e)))
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, key.as_mut_slice());
    key
}

/// Encrypt `plaintext` under `password` with a fresh salt and nonce.
pub fn seal(plaintext: &[u8], password: &str, iterations: u32) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_SIZE];
    let mut nonce = [0u8; NONCE_SIZE];
    random_bytes(&mut salt)?;
    random_bytes(&mut nonce)?;

    let key = derive_key(password, &salt, iterations);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| Error::Storage("encryption failed".to_string()))?;

    let mut sealed = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a blob produced by [`seal`].
///
/// A wrong password and a tampered blob are indistinguishable and both
/// surface as [`Error::Decryption`].
pub fn open(sealed: &[u8], password: &str, iterations: u32) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(Error::Decryption(format!(
            "sealed data too short: {} bytes",
            sealed.len()
        )));
    }
    let (salt, rest) = sealed.split_at(SALT_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let key = derive_key(password, salt, iterations);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| Error::Decryption("wrong password or corrupted key data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITERATIONS: u32 = 100_000;

    #[test]
    fn test_seal_open() {
        let secret = [7u8; 32];
        let sealed = seal(&secret, "pw", ITERATIONS).unwrap();
        assert_eq!(sealed.len(), SALT_SIZE + NONCE_SIZE + 32 + TAG_SIZE);

        let opened = open(&sealed, "pw", ITERATIONS).unwrap();
        assert_eq!(opened.as_slice(), &secret);
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_call() {
        let a = seal(b"same", "pw", ITERATIONS).unwrap();
        let b = seal(b"same", "pw", ITERATIONS).unwrap();
        assert_ne!(a[..SALT_SIZE], b[..SALT_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_password() {
        let sealed = seal(b"secret", "right", ITERATIONS).unwrap();
        let result = open(&sealed, "wrong", ITERATIONS);
        assert!(matches!(result, Err(Error::Decryption(_))));
    }

    #[test]
    fn test_tampered_ciphertext() {
        let mut sealed = seal(b"secret", "pw", ITERATIONS).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(
            open(&sealed, "pw", ITERATIONS),
            Err(Error::Decryption(_))
        ));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            open(&[0u8; 10], "pw", ITERATIONS),
            Err(Error::Decryption(_))
        ));
    }
}
