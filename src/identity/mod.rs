//! Identity layer
//!
//! - DID identifiers and identity documents
//! - Ed25519 key pairs
//! - Identity creation and the local document registry

pub mod crypto;
pub mod did;
pub mod issuer;
pub mod registry;

pub use crypto::{sha3_256, verify, CryptoSuite};
pub use did::{Identifier, IdentityDocument, VerificationMethod};
pub use issuer::{CreatedIdentity, IdentityIssuer};
pub use registry::DocumentStore;
