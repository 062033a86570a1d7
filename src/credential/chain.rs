//! Provenance chain verification.
//!
//! A credential's `previousCredentials` are verified with the same
//! verifier, level by level. Entries may be embedded objects or JSON text.

use crate::core::{now, Timestamp};
use crate::credential::verifier::{CredentialVerifier, VerificationFailure, VerificationResult};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

/// Upper bound on the number of links examined in one chain.
pub const MAX_CHAIN_LINKS: usize = 256;

/// One verified credential in a chain.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainLink {
    /// 0 for the presented credential, 1 for its direct predecessors, ...
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    pub result: VerificationResult,
}

/// Outcome of [`verify_chain`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerification {
    /// True only when every link is valid
    pub is_valid: bool,
    /// Links in breadth-first order
    pub links: Vec<ChainLink>,
    /// Set when the chain exceeded [`MAX_CHAIN_LINKS`]
    pub truncated: bool,
}

impl ChainVerification {
    /// The links that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ChainLink> {
        self.links.iter().filter(|l| !l.result.is_valid)
    }
}

/// Verify a credential and all of its predecessors.
pub async fn verify_chain(verifier: &CredentialVerifier, credential: Value) -> ChainVerification {
    verify_chain_at(verifier, credential, now()).await
}

/// Verify a chain with every link checked at the same instant `at`.
pub async fn verify_chain_at(
    verifier: &CredentialVerifier,
    credential: Value,
    at: Timestamp,
) -> ChainVerification {
    let mut links = Vec::new();
    let mut level = vec![credential];
    let mut depth = 0;
    let mut truncated = false;

    while !level.is_empty() {
        let remaining = MAX_CHAIN_LINKS - links.len();
        if level.len() > remaining {
            level.truncate(remaining);
            truncated = true;
        }

        let results = join_all(level.into_iter().map(|entry| verify_entry(verifier, entry, at))).await;

        let mut next = Vec::new();
        for (result, predecessors) in results {
            let credential_id = result.credential.as_ref().and_then(|c| c.id.clone());
            next.extend(predecessors);
            links.push(ChainLink {
                depth,
                credential_id,
                result,
            });
        }

        if links.len() >= MAX_CHAIN_LINKS {
            truncated |= !next.is_empty();
            break;
        }
        level = next;
        depth += 1;
    }

    let is_valid = !truncated && links.iter().all(|l| l.result.is_valid);
    ChainVerification {
        is_valid,
        links,
        truncated,
    }
}

/// Verify one entry and return its predecessors.
async fn verify_entry(
    verifier: &CredentialVerifier,
    entry: Value,
    at: Timestamp,
) -> (VerificationResult, Vec<Value>) {
    let value = match entry {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(v) => v,
            Err(_) => {
                // not JSON text; let the verifier report it
                return (verifier.verify_value_at(Value::String(text), at).await, Vec::new());
            }
        },
        other => other,
    };

    let result = verifier.verify_value_at(value, at).await;
    let predecessors = match (&result.credential, result.error) {
        (Some(c), None) | (Some(c), Some(VerificationFailure::InvalidSignature)) => {
            c.previous_credentials.clone()
        }
        _ => Vec::new(),
    };
    (result, predecessors)
}
