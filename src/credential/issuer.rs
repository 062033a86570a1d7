//! Credential issuance.
//!
//! Builds the credential envelope and signs it with the issuer's stored key.
//! Issuers without a stored key get an unsigned credential carrying a
//! warning instead of a placeholder signature.

use crate::core::{now, Error, Result, Timestamp};
use crate::credential::model::{
    Claims, Credential, CredentialProof, Provenance, BASE_TYPE, PROOF_PURPOSE, PROOF_TYPE,
    VC_CONTEXT,
};
use crate::identity::{CryptoSuite, Identifier};
use crate::keystore::KeyStore;
use base64::Engine;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Warning attached to unsigned credentials.
pub const UNSIGNED_WARNING: &str =
    "issuer has no signing key in this key store; credential is unsigned";

/// Input for [`CredentialIssuer::issue`].
#[derive(Clone, Debug)]
pub struct IssueRequest {
    pub issuer: Identifier,
    pub subject: Identifier,
    pub claims: Value,
    pub previous_credentials: Vec<Value>,
}

impl IssueRequest {
    pub fn new(issuer: Identifier, subject: Identifier, claims: Value) -> Self {
        Self {
            issuer,
            subject,
            claims,
            previous_credentials: Vec::new(),
        }
    }

    /// Chain a prior credential into this one.
    pub fn with_previous(mut self, previous: &Credential) -> Result<Self> {
        self.previous_credentials.push(serde_json::to_value(previous)?);
        Ok(self)
    }

    /// Chain a prior credential in any JSON representation.
    pub fn with_previous_value(mut self, previous: Value) -> Self {
        self.previous_credentials.push(previous);
        self
    }
}

/// Issues credentials for identities held in a key store.
#[derive(Clone)]
pub struct CredentialIssuer {
    key_store: KeyStore,
    validity: chrono::Duration,
}

impl CredentialIssuer {
    /// `validity` is added to the issuance date to form the expiration date.
    pub fn new(key_store: KeyStore, validity: chrono::Duration) -> Self {
        Self {
            key_store,
            validity,
        }
    }

    /// Issue a credential about `subject`.
    ///
    /// `password` unlocks the issuer key when one is stored.
    pub async fn issue_credential(
        &self,
        issuer: &Identifier,
        subject: &Identifier,
        claims: Value,
        password: &str,
    ) -> Result<Credential> {
        self.issue_at(
            IssueRequest::new(issuer.clone(), subject.clone(), claims),
            password,
            now(),
        )
        .await
    }

    pub async fn issue(&self, request: IssueRequest, password: &str) -> Result<Credential> {
        self.issue_at(request, password, now()).await
    }

    /// Issue with an explicit issuance time.
    pub async fn issue_at(
        &self,
        request: IssueRequest,
        password: &str,
        issued_at: Timestamp,
    ) -> Result<Credential> {
        let (subject_record, claim_type) = build_subject(&request.subject, request.claims)?;
        let expiration = issued_at.checked_add_signed(self.validity).ok_or_else(|| {
            Error::Issuance(format!(
                "expiration date out of range for issuance at {}",
                issued_at.to_rfc3339()
            ))
        })?;

        let mut credential_type = vec![BASE_TYPE.to_string()];
        if let Some(t) = claim_type.filter(|t| t != BASE_TYPE) {
            credential_type.push(t);
        }

        let mut credential = Credential {
            context: vec![VC_CONTEXT.to_string()],
            id: Some(format!("urn:uuid:{}", Uuid::new_v4())),
            credential_type,
            issuer: request.issuer.to_string(),
            issuance_date: issued_at,
            expiration_date: Some(expiration),
            credential_subject: subject_record,
            previous_credentials: request.previous_credentials,
            provenance: None,
            warning: None,
            proof: None,
        };

        let has_key = self
            .key_store
            .has(&request.issuer)
            .await
            .map_err(|e| Error::Issuance(format!("cannot query key store: {}", e)))?;
        if !has_key {
            warn!(issuer = %request.issuer, "issuing unsigned credential");
            credential.provenance = Some(Provenance::Unsigned);
            credential.warning = Some(UNSIGNED_WARNING.to_string());
            return Ok(credential);
        }

        let secret = self
            .key_store
            .load(&request.issuer, password)
            .await
            .map_err(|e| Error::Issuance(format!("cannot load issuer key: {}", e)))?
            .ok_or_else(|| Error::Issuance(format!("key for {} vanished", request.issuer)))?;
        let crypto = CryptoSuite::from_bytes(&secret)
            .map_err(|e| Error::Issuance(format!("stored issuer key unusable: {}", e)))?;

        credential.provenance = Some(Provenance::Signed);
        let signature = crypto.sign(&credential.signing_input()?);
        credential.proof = Some(CredentialProof {
            proof_type: PROOF_TYPE.to_string(),
            created: issued_at,
            verification_method: request.issuer.key_id(1),
            proof_purpose: PROOF_PURPOSE.to_string(),
            proof_value: base64::engine::general_purpose::STANDARD.encode(signature),
        });

        info!(
            issuer = %request.issuer,
            subject = %request.subject,
            chained = credential.previous_credentials.len(),
            "issued signed credential"
        );
        Ok(credential)
    }
}

/// `{ id: subject, ...claims }`, plus the claims' `type` if it is a string.
fn build_subject(subject: &Identifier, claims: Value) -> Result<(Claims, Option<String>)> {
    let claims = match claims {
        Value::Object(map) => map,
        Value::Null => Claims::new(),
        other => {
            return Err(Error::Issuance(format!(
                "claims must be a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let claim_type = match claims.get("type") {
        None => None,
        Some(Value::String(t)) if !t.is_empty() => Some(t.clone()),
        Some(_) => {
            return Err(Error::Issuance(
                "claim `type` must be a non-empty string".to_string(),
            ))
        }
    };

    let mut record = Claims::new();
    record.insert("id".to_string(), Value::String(subject.to_string()));
    for (key, value) in claims {
        if key == "id" {
            if value.as_str() != Some(subject.as_str()) {
                return Err(Error::Issuance(format!(
                    "claim `id` {} does not match subject {}",
                    value, subject
                )));
            }
            continue;
        }
        record.insert(key, value);
    }
    Ok((record, claim_type))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DocumentStore, IdentityIssuer};
    use crate::storage::MemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    const ITERATIONS: u32 = 100_000;

    struct Fixture {
        keys: KeyStore,
        identities: IdentityIssuer,
        issuer: CredentialIssuer,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(MemoryBackend::new());
        let keys = KeyStore::new(backend.clone(), ITERATIONS);
        let identities = IdentityIssuer::new("dpp", keys.clone(), DocumentStore::new(backend));
        let issuer = CredentialIssuer::new(keys.clone(), chrono::Duration::days(365));
        Fixture {
            keys,
            identities,
            issuer,
        }
    }

    fn did(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_unsigned_when_issuer_has_no_key() {
        let f = fixture();
        let cred = f
            .issuer
            .issue_credential(
                &did("did:example:alice"),
                &did("did:example:bob"),
                json!({"type": "OriginCertification", "origin": "Ecuador"}),
                "pw",
            )
            .await
            .unwrap();

        assert_eq!(cred.provenance, Some(Provenance::Unsigned));
        assert_eq!(cred.warning.as_deref(), Some(UNSIGNED_WARNING));
        assert!(cred.proof.is_none());
        assert_eq!(cred.subject_id(), Some("did:example:bob"));
        assert_eq!(cred.credential_type, vec![BASE_TYPE, "OriginCertification"]);
    }

    #[tokio::test]
    async fn test_signed_with_real_signature() {
        let f = fixture();
        let farmer = f.identities.create_identity("farm-pw").await.unwrap();
        let cred = f
            .issuer
            .issue_credential(
                &farmer.identifier,
                &did("did:example:lot-7"),
                json!({"type": "HarvestCertification", "weightKg": 1200}),
                "farm-pw",
            )
            .await
            .unwrap();

        assert_eq!(cred.provenance, Some(Provenance::Signed));
        let proof = cred.proof.clone().unwrap();
        assert_eq!(proof.verification_method, farmer.identifier.key_id(1));

        let signature = base64::engine::general_purpose::STANDARD
            .decode(&proof.proof_value)
            .unwrap();
        let method = farmer.document.method(&proof.verification_method).unwrap();
        let key = method.verifying_key().unwrap();
        assert!(crate::identity::verify(&key, &cred.signing_input().unwrap(), &signature).is_ok());
    }

    #[tokio::test]
    async fn test_validity_window() {
        let f = fixture();
        let t: Timestamp = "2026-03-01T12:00:00Z".parse().unwrap();
        let cred = f
            .issuer
            .issue_at(
                IssueRequest::new(did("did:example:alice"), did("did:example:bob"), json!({})),
                "pw",
                t,
            )
            .await
            .unwrap();

        assert_eq!(cred.issuance_date, t);
        assert_eq!(cred.expiration_date, Some(t + chrono::Duration::days(365)));
    }

    #[tokio::test]
    async fn test_expiration_overflow_is_issuance_error() {
        let f = fixture();
        let result = f
            .issuer
            .issue_at(
                IssueRequest::new(did("did:example:alice"), did("did:example:bob"), json!({})),
                "pw",
                chrono::DateTime::<chrono::Utc>::MAX_UTC,
            )
            .await;
        assert!(matches!(result, Err(Error::Issuance(_))));

        let century = CredentialIssuer::new(f.keys.clone(), chrono::Duration::days(36_500));
        let cred = century
            .issue_credential(&did("did:example:alice"), &did("did:example:bob"), json!({}), "pw")
            .await
            .unwrap();
        assert!(cred.expiration_date.unwrap() > cred.issuance_date);
    }

    #[tokio::test]
    async fn test_wrong_password_is_issuance_error() {
        let f = fixture();
        let farmer = f.identities.create_identity("right").await.unwrap();
        let result = f
            .issuer
            .issue_credential(&farmer.identifier, &did("did:example:bob"), json!({}), "wrong")
            .await;
        assert!(matches!(result, Err(Error::Issuance(_))));
        assert!(f.keys.has(&farmer.identifier).await.unwrap());
    }

    #[tokio::test]
    async fn test_claims_must_be_object() {
        let f = fixture();
        let result = f
            .issuer
            .issue_credential(
                &did("did:example:alice"),
                &did("did:example:bob"),
                json!(["origin", "Ecuador"]),
                "pw",
            )
            .await;
        assert!(matches!(result, Err(Error::Issuance(_))));
    }

    #[tokio::test]
    async fn test_conflicting_subject_id_rejected() {
        let f = fixture();
        let result = f
            .issuer
            .issue_credential(
                &did("did:example:alice"),
                &did("did:example:bob"),
                json!({"id": "did:example:mallory"}),
                "pw",
            )
            .await;
        assert!(matches!(result, Err(Error::Issuance(_))));
    }

    #[tokio::test]
    async fn test_chaining_includes_previous() {
        let f = fixture();
        let harvest = f
            .issuer
            .issue_credential(
                &did("did:example:farmer"),
                &did("did:example:lot-7"),
                json!({"type": "HarvestCertification"}),
                "pw",
            )
            .await
            .unwrap();

        let request = IssueRequest::new(
            did("did:example:factory"),
            did("did:example:lot-7"),
            json!({"type": "ProcessingCertification"}),
        )
        .with_previous(&harvest)
        .unwrap();
        let processing = f.issuer.issue(request, "pw").await.unwrap();

        assert_eq!(processing.previous_credentials.len(), 1);
        assert_eq!(
            processing.previous_credentials[0]["issuer"],
            json!("did:example:farmer")
        );
    }
}
