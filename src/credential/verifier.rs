//! Credential verification.
//!
//! Each call runs a fixed sequence: parse, structural check, expiration,
//! optional ledger resolution, signature check. Structural validity and
//! ledger anchoring are independent: an unreachable or silent ledger is
//! reported in the result but never makes a credential invalid.

use crate::core::{now, Timestamp};
use crate::credential::model::{signing_input, Credential, Provenance};
use crate::identity::{verify, DocumentStore, Identifier, IdentityDocument};
use crate::ledger::{AnchorRegistry, LedgerResolver};
use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on one ledger resolution.
pub const DEFAULT_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a credential failed verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VerificationFailure {
    #[serde(rename = "parse error")]
    ParseError,
    #[serde(rename = "missing required fields")]
    MissingRequiredFields,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "invalid signature")]
    InvalidSignature,
}

impl std::fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationFailure::ParseError => write!(f, "parse error"),
            VerificationFailure::MissingRequiredFields => write!(f, "missing required fields"),
            VerificationFailure::Expired => write!(f, "expired"),
            VerificationFailure::InvalidSignature => write!(f, "invalid signature"),
        }
    }
}

/// Outcome of one verification call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<VerificationFailure>,
    /// Human-readable detail for `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Issuer document found on the ledger
    pub on_chain: bool,
    pub resolution_attempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_document: Option<IdentityDocument>,
    /// None when no issuer key was available to check against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_valid: Option<bool>,
    /// Resolution and signature remarks
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl VerificationResult {
    fn invalid(error: VerificationFailure, message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            credential: None,
            error: Some(error),
            message: Some(message.into()),
            on_chain: false,
            resolution_attempted: false,
            resolved_document: None,
            signature_valid: None,
            notes: Vec::new(),
        }
    }

    fn valid(credential: Credential) -> Self {
        Self {
            is_valid: true,
            credential: Some(credential),
            error: None,
            message: None,
            on_chain: false,
            resolution_attempted: false,
            resolved_document: None,
            signature_valid: None,
            notes: Vec::new(),
        }
    }

    fn fail(&mut self, error: VerificationFailure, message: impl Into<String>) {
        self.is_valid = false;
        self.error = Some(error);
        self.message = Some(message.into());
    }
}

/// Verifies credentials, optionally consulting an external ledger.
#[derive(Clone)]
pub struct CredentialVerifier {
    documents: Option<DocumentStore>,
    ledger: Option<(Arc<dyn LedgerResolver>, AnchorRegistry)>,
    on_chain: bool,
    resolution_timeout: Duration,
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialVerifier {
    /// A purely structural verifier.
    pub fn new() -> Self {
        Self {
            documents: None,
            ledger: None,
            on_chain: false,
            resolution_timeout: DEFAULT_RESOLUTION_TIMEOUT,
        }
    }

    /// Use locally known identity documents to check signatures.
    pub fn with_documents(mut self, documents: DocumentStore) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Attach a ledger resolver and the registry of known anchors.
    pub fn with_ledger(mut self, resolver: Arc<dyn LedgerResolver>, anchors: AnchorRegistry) -> Self {
        self.ledger = Some((resolver, anchors));
        self
    }

    /// Opt in to ledger resolution.
    pub fn with_on_chain(mut self, on_chain: bool) -> Self {
        self.on_chain = on_chain;
        self
    }

    pub fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout = timeout;
        self
    }

    /// Verify a credential given as JSON text.
    pub async fn verify_json(&self, input: &str) -> VerificationResult {
        self.verify_json_at(input, now()).await
    }

    pub async fn verify_json_at(&self, input: &str, at: Timestamp) -> VerificationResult {
        match serde_json::from_str::<Value>(input) {
            Ok(value) => self.verify_value_at(value, at).await,
            Err(e) => VerificationResult::invalid(VerificationFailure::ParseError, e.to_string()),
        }
    }

    /// Verify an already parsed credential.
    pub async fn verify(&self, credential: &Credential) -> VerificationResult {
        self.verify_at(credential, now()).await
    }

    pub async fn verify_at(&self, credential: &Credential, at: Timestamp) -> VerificationResult {
        match serde_json::to_value(credential) {
            Ok(value) => self.verify_value_at(value, at).await,
            Err(e) => VerificationResult::invalid(VerificationFailure::ParseError, e.to_string()),
        }
    }

    pub async fn verify_value(&self, value: Value) -> VerificationResult {
        self.verify_value_at(value, now()).await
    }

    /// Verify a credential document as of `at`.
    pub async fn verify_value_at(&self, value: Value, at: Timestamp) -> VerificationResult {
        let Some(object) = value.as_object() else {
            return VerificationResult::invalid(
                VerificationFailure::ParseError,
                "credential must be a JSON object",
            );
        };

        let missing = missing_required_fields(object);
        if !missing.is_empty() {
            return VerificationResult::invalid(
                VerificationFailure::MissingRequiredFields,
                format!("missing required fields: {}", missing.join(", ")),
            );
        }

        let credential: Credential = match serde_json::from_value(value.clone()) {
            Ok(c) => c,
            Err(e) => {
                return VerificationResult::invalid(VerificationFailure::ParseError, e.to_string())
            }
        };

        if let Some(expiration) = credential.expiration_date.filter(|exp| *exp < at) {
            return VerificationResult::invalid(
                VerificationFailure::Expired,
                format!("credential expired at {}", expiration.to_rfc3339()),
            );
        }

        let mut result = VerificationResult::valid(credential);
        self.resolve_issuer(&mut result).await;
        self.check_signature(&value, &mut result).await;

        debug!(
            valid = result.is_valid,
            on_chain = result.on_chain,
            signature_valid = ?result.signature_valid,
            "verified credential"
        );
        result
    }

    /// Best-effort ledger lookup of the issuer.
    async fn resolve_issuer(&self, result: &mut VerificationResult) {
        if !self.on_chain {
            return;
        }
        let Some((resolver, anchors)) = &self.ledger else {
            result.notes.push("on-chain mode enabled but no ledger is configured".to_string());
            return;
        };
        let Some(issuer) = result
            .credential
            .as_ref()
            .and_then(|c| c.issuer_identifier().ok())
        else {
            result.notes.push("issuer is not a DID; ledger resolution skipped".to_string());
            return;
        };

        match anchors.get(&issuer).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                result
                    .notes
                    .push(format!("no known ledger anchor for {}; resolution skipped", issuer));
                return;
            }
            Err(e) => {
                warn!(issuer = %issuer, error = %e, "anchor lookup failed");
                result.notes.push(format!("anchor lookup failed: {}", e));
                return;
            }
        }

        result.resolution_attempted = true;
        match tokio::time::timeout(self.resolution_timeout, resolver.resolve(&issuer)).await {
            Ok(Ok(Some(document))) => {
                result.on_chain = true;
                result.resolved_document = Some(document);
            }
            Ok(Ok(None)) => {
                result.notes.push(format!(
                    "{} not found on {}; structural verification stands",
                    issuer,
                    resolver.network()
                ));
            }
            Ok(Err(e)) => {
                warn!(issuer = %issuer, error = %e, "ledger resolution failed");
                result.notes.push(format!("ledger resolution failed: {}", e));
            }
            Err(_) => {
                warn!(issuer = %issuer, timeout = ?self.resolution_timeout, "ledger resolution timed out");
                result.notes.push(format!(
                    "ledger resolution timed out after {} ms",
                    self.resolution_timeout.as_millis()
                ));
            }
        }
    }

    /// Check the proof against the resolved or locally known issuer document.
    async fn check_signature(&self, raw: &Value, result: &mut VerificationResult) {
        let Some(credential) = result.credential.as_ref() else {
            return;
        };
        let claims_signed = credential.provenance == Some(Provenance::Signed);
        let Some(proof) = credential.proof.clone() else {
            if claims_signed {
                result.signature_valid = Some(false);
                result.fail(
                    VerificationFailure::InvalidSignature,
                    "credential claims to be signed but carries no proof",
                );
            }
            return;
        };

        let Ok(issuer) = credential.issuer_identifier() else {
            result.notes.push("issuer is not a DID; signature not checked".to_string());
            return;
        };
        if !proof.verification_method.starts_with(&format!("{}#", issuer)) {
            result.signature_valid = Some(false);
            result.fail(
                VerificationFailure::InvalidSignature,
                format!(
                    "proof method {} is not controlled by issuer {}",
                    proof.verification_method, issuer
                ),
            );
            return;
        }

        let Some(document) = self.issuer_document(&issuer, result).await else {
            result
                .notes
                .push(format!("no identity document known for {}; signature not checked", issuer));
            return;
        };

        match check_proof(&document, &proof.verification_method, &proof.proof_value, raw) {
            Ok(()) => result.signature_valid = Some(true),
            Err(reason) => {
                result.signature_valid = Some(false);
                result.fail(VerificationFailure::InvalidSignature, reason);
            }
        }
    }

    async fn issuer_document(
        &self,
        issuer: &Identifier,
        result: &mut VerificationResult,
    ) -> Option<IdentityDocument> {
        if let Some(document) = result.resolved_document.as_ref().filter(|d| &d.id == issuer) {
            return Some(document.clone());
        }
        let documents = self.documents.as_ref()?;
        match documents.get(issuer).await {
            Ok(document) => document,
            Err(e) => {
                result.notes.push(format!("local document lookup failed: {}", e));
                None
            }
        }
    }
}

fn check_proof(
    document: &IdentityDocument,
    method_id: &str,
    proof_value: &str,
    raw: &Value,
) -> std::result::Result<(), String> {
    if !document.can_assert(method_id) {
        return Err(format!("{} is not an assertion method of {}", method_id, document.id));
    }
    let method = document
        .method(method_id)
        .ok_or_else(|| format!("{} not found in issuer document", method_id))?;
    if method.controller != document.id {
        return Err(format!("{} is controlled by {}", method_id, method.controller));
    }
    let key = method.verifying_key().map_err(|e| e.to_string())?;
    let signature = base64::engine::general_purpose::STANDARD
        .decode(proof_value)
        .map_err(|e| format!("proof value is not base64: {}", e))?;
    let message = signing_input(raw).map_err(|e| e.to_string())?;
    verify(&key, &message, &signature).map_err(|_| "signature does not match credential".to_string())
}

/// Envelope fields that are absent or empty.
fn missing_required_fields(object: &Map<String, Value>) -> Vec<&'static str> {
    let mut missing = Vec::new();

    let issuer_ok = match object.get("issuer") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Object(o)) => o
            .get("id")
            .and_then(Value::as_str)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false),
        _ => false,
    };
    if !issuer_ok {
        missing.push("issuer");
    }

    let subject_ok = matches!(object.get("credentialSubject"), Some(Value::Object(o)) if !o.is_empty());
    if !subject_ok {
        missing.push("credentialSubject");
    }

    let issued_ok = matches!(object.get("issuanceDate"), Some(Value::String(s)) if !s.trim().is_empty());
    if !issued_ok {
        missing.push("issuanceDate");
    }

    missing
}
