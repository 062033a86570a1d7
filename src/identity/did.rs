//! Decentralized Identifier (DID) types.
//!
//! Identifiers follow `did:<method>:<method-specific-id>`. Identity documents
//! list the verification methods that may act for the identifier.

use crate::core::{now, Error, Hash256, Result, Timestamp};
use crate::identity::crypto::{sha3_256, verifying_key_from_bytes};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Hex characters of the public key digest used as the identifier suffix.
const SUFFIX_HEX_LEN: usize = 32;

/// Verification method type for Ed25519 keys.
pub const ED25519_METHOD_TYPE: &str = "Ed25519VerificationKey2020";

/// A DID naming an issuer, subject or product. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Parse and validate a DID string.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let (scheme, method, id) = (parts.next(), parts.next(), parts.next());
        match (scheme, method, id) {
            (Some("did"), Some(method), Some(id))
                if is_valid_method(method) && is_valid_method_id(id) =>
            {
                Ok(Self(s.to_string()))
            }
            _ => Err(Error::InvalidIdentifier(s.to_string())),
        }
    }

    /// Derive an identifier from a public key under `method`.
    pub fn from_public_key(method: &str, public_key: &[u8; 32]) -> Result<Self> {
        if !is_valid_method(method) {
            return Err(Error::InvalidIdentifier(format!("bad DID method {:?}", method)));
        }
        let digest: Hash256 = sha3_256(public_key);
        Ok(Self(format!("did:{}:{}", method, digest.short_hex(SUFFIX_HEX_LEN))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method, e.g. `dpp` in `did:dpp:abc`.
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// Everything after the method.
    pub fn method_specific_id(&self) -> &str {
        self.0.splitn(3, ':').nth(2).unwrap_or_default()
    }

    /// Fragment URL of the `index`-th key, e.g. `did:dpp:abc#key-1`.
    pub fn key_id(&self, index: u32) -> String {
        format!("{}#key-{}", self.0, index)
    }
}

fn is_valid_method(method: &str) -> bool {
    !method.is_empty()
        && method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn is_valid_method_id(id: &str) -> bool {
    !id.is_empty()
        && !id.ends_with(':')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '%'))
}

impl TryFrom<String> for Identifier {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A verification method in an identity document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: Identifier,
    #[serde(rename = "publicKeyBase64")]
    pub public_key_base64: String,
}

impl VerificationMethod {
    /// Ed25519 method for `controller`.
    pub fn ed25519(controller: &Identifier, index: u32, public_key: &[u8; 32]) -> Self {
        Self {
            id: controller.key_id(index),
            method_type: ED25519_METHOD_TYPE.to_string(),
            controller: controller.clone(),
            public_key_base64: base64::engine::general_purpose::STANDARD.encode(public_key),
        }
    }

    /// Decode the Ed25519 public key.
    pub fn verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.public_key_base64)
            .map_err(|e| Error::InvalidKeyFormat(e.to_string()))?;
        verifying_key_from_bytes(&bytes)
    }
}

/// Identity document: the public record of an identifier's keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDocument {
    /// The DID this document describes
    pub id: Identifier,
    /// Verification methods (public keys)
    pub verification_method: Vec<VerificationMethod>,
    /// Methods allowed to authenticate as the DID
    #[serde(default)]
    pub authentication: Vec<String>,
    /// Methods allowed to issue credentials
    #[serde(default)]
    pub assertion_method: Vec<String>,
    /// Document creation time
    pub created: Timestamp,
    /// Last update time
    pub updated: Timestamp,
}

impl IdentityDocument {
    /// Create a document with a single Ed25519 verification method.
    pub fn new(id: &Identifier, public_key: &[u8; 32]) -> Self {
        let created = now();
        let method = VerificationMethod::ed25519(id, 1, public_key);
        Self {
            id: id.clone(),
            authentication: vec![method.id.clone()],
            assertion_method: vec![method.id.clone()],
            verification_method: vec![method],
            created,
            updated: created,
        }
    }

    /// Check the document invariants.
    pub fn validate(&self) -> Result<()> {
        if self.verification_method.is_empty() {
            return Err(Error::Validation(format!(
                "document {} has no verification method",
                self.id
            )));
        }
        if let Some(foreign) = self
            .verification_method
            .iter()
            .find(|m| !m.id.starts_with(self.id.as_str()))
        {
            return Err(Error::Validation(format!(
                "verification method {} does not belong to {}",
                foreign.id, self.id
            )));
        }
        Ok(())
    }

    /// Find a verification method by its full id.
    pub fn method(&self, method_id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|m| m.id == method_id)
    }

    /// Whether `method_id` may issue credentials for this identifier.
    pub fn can_assert(&self, method_id: &str) -> bool {
        self.assertion_method.iter().any(|m| m == method_id) && self.method(method_id).is_some()
    }

    /// Compute document hash for integrity checks.
    pub fn hash(&self) -> Result<Hash256> {
        let json = serde_json::to_vec(self)?;
        Ok(sha3_256(&json))
    }
}
