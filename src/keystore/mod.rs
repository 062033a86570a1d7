//! Key Store
//!
//! Signing keys encrypted at rest under a password-derived key:
//! - `cipher`: PBKDF2 + ChaCha20-Poly1305 sealing
//! - `store`: per-identifier persistence over a storage backend

pub mod cipher;
pub mod store;

pub use store::KeyStore;
