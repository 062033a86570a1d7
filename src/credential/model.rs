//! Verifiable Credential data model.
//!
//! Shaped after the W3C VC data model. The claims payload is open-ended;
//! only the envelope (issuer, subject, issuance date) is required.

use crate::core::{Error, Result, Timestamp};
use crate::identity::Identifier;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Default JSON-LD context.
pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Type every credential carries.
pub const BASE_TYPE: &str = "VerifiableCredential";

/// Proof type produced by the issuer.
pub const PROOF_TYPE: &str = "Ed25519Signature2020";

/// Proof purpose produced by the issuer.
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// Open key/value claims payload.
pub type Claims = Map<String, Value>;

/// Whether the issuer actually signed the credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Signed,
    Unsigned,
}

/// Detached Ed25519 proof over the credential body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: Timestamp,
    pub verification_method: String,
    pub proof_purpose: String,
    /// Base64 signature
    pub proof_value: String,
}

/// A claims document about a subject, made by an issuer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context", default = "default_context")]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub credential_type: Vec<String>,
    /// Issuer DID. Accepts both `"did:..."` and `{"id": "did:..."}` on input.
    #[serde(deserialize_with = "issuer_id")]
    pub issuer: String,
    pub issuance_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<Timestamp>,
    /// `{ "id": subject, ...claims }`
    pub credential_subject: Claims,
    /// Prior credentials in the provenance chain, included verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_credentials: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<CredentialProof>,
}

fn default_context() -> Vec<String> {
    vec![VC_CONTEXT.to_string()]
}

fn issuer_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Object(obj) => match obj.get("id") {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(D::Error::custom("issuer object without string id")),
        },
        other => Err(D::Error::custom(format!("unsupported issuer value: {}", other))),
    }
}

impl Credential {
    /// Issuer as a parsed identifier.
    pub fn issuer_identifier(&self) -> Result<Identifier> {
        Identifier::parse(&self.issuer)
    }

    /// The subject's `id`, if present.
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }

    /// Get a claim as a typed value.
    pub fn get_claim<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.credential_subject
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Whether the credential has expired at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expiration_date.map(|exp| exp < now).unwrap_or(false)
    }

    /// Bytes covered by the proof: canonical JSON without `proof`.
    pub fn signing_input(&self) -> Result<Vec<u8>> {
        signing_input(&serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Parse(e.to_string()))
    }
}

/// Canonical bytes of a credential document with its `proof` removed.
pub fn signing_input(document: &Value) -> Result<Vec<u8>> {
    let mut body = document.clone();
    match body.as_object_mut() {
        Some(obj) => {
            obj.remove("proof");
        }
        None => return Err(Error::Parse("credential must be a JSON object".to_string())),
    }
    let mut out = Vec::new();
    write_canonical(&body, &mut out)?;
    Ok(out)
}

/// Serialize with object keys in sorted order and no insignificant whitespace.
fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(serde_json::to_string(key)?.as_bytes());
                out.push(b':');
                write_canonical(&map[key.as_str()], out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        scalar => out.extend_from_slice(serde_json::to_string(scalar)?.as_bytes()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "@context": [VC_CONTEXT],
            "id": "urn:uuid:1",
            "type": [BASE_TYPE, "OriginCertification"],
            "issuer": "did:example:alice",
            "issuanceDate": "2026-01-01T00:00:00Z",
            "expirationDate": "2027-01-01T00:00:00Z",
            "credentialSubject": {"id": "did:example:bob", "origin": "Ecuador"}
        })
    }

    #[test]
    fn test_parse_credential() {
        let cred: Credential = serde_json::from_value(sample()).unwrap();
        assert_eq!(cred.issuer, "did:example:alice");
        assert_eq!(cred.subject_id(), Some("did:example:bob"));
        assert_eq!(cred.get_claim::<String>("origin"), Some("Ecuador".to_string()));
        assert!(cred.proof.is_none());
        assert!(cred.previous_credentials.is_empty());
    }

    #[test]
    fn test_issuer_object_form() {
        let mut doc = sample();
        doc["issuer"] = json!({"id": "did:example:alice", "name": "Finca Alice"});
        let cred: Credential = serde_json::from_value(doc).unwrap();
        assert_eq!(cred.issuer, "did:example:alice");
        assert!(cred.issuer_identifier().is_ok());
    }

    #[test]
    fn test_is_expired_at() {
        let cred: Credential = serde_json::from_value(sample()).unwrap();
        let before = "2026-06-01T00:00:00Z".parse().unwrap();
        let after = "2027-06-01T00:00:00Z".parse().unwrap();
        assert!(!cred.is_expired_at(before));
        assert!(cred.is_expired_at(after));

        let mut open_ended = cred.clone();
        open_ended.expiration_date = None;
        assert!(!open_ended.is_expired_at(now()));
    }

    #[test]
    fn test_signing_input_ignores_key_order_and_proof() {
        let a = json!({"b": 1, "a": {"y": true, "x": [1, 2]}, "proof": {"proofValue": "zz"}});
        let b = json!({"a": {"x": [1, 2], "y": true}, "b": 1});
        assert_eq!(signing_input(&a).unwrap(), signing_input(&b).unwrap());
        assert_eq!(
            String::from_utf8(signing_input(&b).unwrap()).unwrap(),
            r#"{"a":{"x":[1,2],"y":true},"b":1}"#
        );
    }

    #[test]
    fn test_signing_input_requires_object() {
        assert!(signing_input(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_optional_fields_omitted() {
        let cred: Credential = serde_json::from_value(sample()).unwrap();
        let value = serde_json::to_value(&cred).unwrap();
        assert!(value.get("proof").is_none());
        assert!(value.get("previousCredentials").is_none());
        assert!(value.get("warning").is_none());
    }
}
