//! Verifiable credentials
//!
//! - Credential data model and canonical signing input
//! - Issuance with real Ed25519 proofs
//! - Verification with optional ledger resolution
//! - Provenance chain verification

pub mod chain;
pub mod issuer;
pub mod model;
pub mod verifier;

pub use chain::{verify_chain, verify_chain_at, ChainLink, ChainVerification};
pub use issuer::{CredentialIssuer, IssueRequest, UNSIGNED_WARNING};
pub use model::{Claims, Credential, CredentialProof, Provenance};
pub use verifier::{CredentialVerifier, VerificationFailure, VerificationResult};
