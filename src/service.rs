//! Passport service.
//!
//! Owns one storage backend and the components built on it. Callers
//! construct it explicitly and pass it where needed.

use crate::core::{PassportConfig, Result};
use crate::credential::{
    verify_chain, ChainVerification, Credential, CredentialIssuer, CredentialVerifier,
    IssueRequest, VerificationResult,
};
use crate::identity::{CreatedIdentity, DocumentStore, Identifier, IdentityIssuer};
use crate::keystore::KeyStore;
use crate::ledger::{AnchorRef, AnchorRegistry, LedgerResolver};
use crate::monitoring::init_tracing;
use crate::storage::{create_storage_backend, StorageBackend};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Identity and credential operations over a shared backend.
pub struct PassportService {
    config: PassportConfig,
    backend: Arc<dyn StorageBackend>,
    key_store: KeyStore,
    documents: DocumentStore,
    anchors: AnchorRegistry,
    identities: IdentityIssuer,
    issuer: CredentialIssuer,
    verifier: CredentialVerifier,
}

impl PassportService {
    /// Validate `config`, set up logging if asked to, and open the
    /// configured backend. No ledger resolver is attached.
    pub async fn open(config: PassportConfig) -> Result<Self> {
        config.validate()?;
        if config.logging.init_subscriber {
            init_tracing(&config.logging);
        }
        let backend = create_storage_backend(&config.storage).await?;
        Self::open_with(config, backend, None)
    }

    /// Build a service over an existing backend and optional resolver.
    pub fn open_with(
        config: PassportConfig,
        backend: Arc<dyn StorageBackend>,
        resolver: Option<Arc<dyn LedgerResolver>>,
    ) -> Result<Self> {
        config.validate()?;

        let key_store = KeyStore::new(backend.clone(), config.kdf_iterations);
        let documents = DocumentStore::new(backend.clone());
        let anchors = AnchorRegistry::new(backend.clone());
        let identities =
            IdentityIssuer::new(&config.did_method, key_store.clone(), documents.clone());
        let issuer = CredentialIssuer::new(key_store.clone(), config.credential_validity());

        let mut verifier = CredentialVerifier::new()
            .with_documents(documents.clone())
            .with_on_chain(config.on_chain)
            .with_resolution_timeout(config.resolution_timeout());
        if let Some(resolver) = resolver {
            verifier = verifier.with_ledger(resolver, anchors.clone());
        }

        info!(
            backend = %backend.backend_type(),
            did_method = %config.did_method,
            on_chain = config.on_chain,
            "passport service opened"
        );
        Ok(Self {
            config,
            backend,
            key_store,
            documents,
            anchors,
            identities,
            issuer,
            verifier,
        })
    }

    /// Flush pending writes and release the backend.
    pub async fn close(self) -> Result<()> {
        self.backend.flush().await?;
        info!("passport service closed");
        Ok(())
    }

    pub async fn create_identity(&self, password: &str) -> Result<CreatedIdentity> {
        self.identities.create_identity(password).await
    }

    pub async fn issue_credential(
        &self,
        issuer: &Identifier,
        subject: &Identifier,
        claims: Value,
        password: &str,
    ) -> Result<Credential> {
        self.issuer
            .issue_credential(issuer, subject, claims, password)
            .await
    }

    /// Issue from a full request, e.g. one chaining prior credentials.
    pub async fn issue(&self, request: IssueRequest, password: &str) -> Result<Credential> {
        self.issuer.issue(request, password).await
    }

    /// Verify a credential given as JSON text.
    pub async fn verify_credential(&self, input: &str) -> VerificationResult {
        self.verifier.verify_json(input).await
    }

    /// Verify a credential and its predecessors.
    pub async fn verify_chain(&self, credential: Value) -> ChainVerification {
        verify_chain(&self.verifier, credential).await
    }

    /// Remember where an identity was anchored so verification may resolve it.
    pub async fn record_anchor(&self, identifier: &Identifier, anchor: &AnchorRef) -> Result<()> {
        self.anchors.record(identifier, anchor).await
    }

    pub fn config(&self) -> &PassportConfig {
        &self.config
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn anchors(&self) -> &AnchorRegistry {
        &self.anchors
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::credential::{Provenance, VerificationFailure};
    use crate::ledger::InMemoryLedger;
    use crate::storage::{MemoryBackend, StorageConfig};
    use serde_json::json;
    use tokio_test::assert_ok;

    fn did(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_farm_to_consumer() {
        let service = PassportService::open(PassportConfig::default()).await.unwrap();
        let farmer = service.create_identity("farm-pw").await.unwrap();
        let factory = service.create_identity("fab-pw").await.unwrap();
        assert!(!farmer.published);
        assert_ne!(farmer.identifier, factory.identifier);
        assert!(farmer.identifier.as_str().starts_with("did:dpp:"));

        let lot = did("did:dpp:lot-0001");
        let harvest = service
            .issue_credential(
                &farmer.identifier,
                &lot,
                json!({"type": "HarvestCertification", "origin": "Ecuador"}),
                "farm-pw",
            )
            .await
            .unwrap();
        let request = IssueRequest::new(
            factory.identifier.clone(),
            lot,
            json!({"type": "ProcessingCertification"}),
        )
        .with_previous(&harvest)
        .unwrap();
        let processing = service.issue(request, "fab-pw").await.unwrap();
        assert_eq!(processing.provenance, Some(Provenance::Signed));

        let result = service
            .verify_credential(&processing.to_json().unwrap())
            .await;
        assert!(result.is_valid);
        assert_eq!(result.signature_valid, Some(true));

        let chain = service
            .verify_chain(serde_json::to_value(&processing).unwrap())
            .await;
        assert!(chain.is_valid);
        assert_eq!(chain.links.len(), 2);

        assert_ok!(service.close().await);
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let config = PassportConfig {
            kdf_iterations: 1_000,
            ..PassportConfig::default()
        };
        assert!(matches!(
            PassportService::open(config).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = PassportConfig::default()
            .with_storage(StorageConfig::file(dir.path().join("passport.json")));

        let service = PassportService::open(config.clone()).await.unwrap();
        let farmer = service.create_identity("pw").await.unwrap();
        assert_ok!(service.close().await);

        let service = PassportService::open(config).await.unwrap();
        assert!(service.key_store().has(&farmer.identifier).await.unwrap());
        assert_eq!(
            service.documents().get(&farmer.identifier).await.unwrap(),
            Some(farmer.document.clone())
        );
        let cred = service
            .issue_credential(&farmer.identifier, &did("did:dpp:lot-2"), json!({}), "pw")
            .await
            .unwrap();
        assert_eq!(cred.provenance, Some(Provenance::Signed));
    }

    #[tokio::test]
    async fn test_on_chain_resolution_through_service() {
        let ledger = Arc::new(InMemoryLedger::new("memnet"));
        let service = PassportService::open_with(
            PassportConfig::default().with_on_chain(true),
            Arc::new(MemoryBackend::new()),
            Some(ledger.clone() as Arc<dyn LedgerResolver>),
        )
        .unwrap();

        let farmer = service.create_identity("pw").await.unwrap();
        let anchor = ledger.insert(farmer.document.clone()).unwrap();
        service.record_anchor(&farmer.identifier, &anchor).await.unwrap();

        let cred = service
            .issue_credential(&farmer.identifier, &did("did:dpp:lot-3"), json!({}), "pw")
            .await
            .unwrap();
        let result = service.verify_credential(&cred.to_json().unwrap()).await;
        assert!(result.is_valid);
        assert!(result.on_chain);

        ledger.set_offline(true);
        let result = service.verify_credential(&cred.to_json().unwrap()).await;
        assert!(result.is_valid);
        assert!(!result.on_chain);
    }

    #[tokio::test]
    async fn test_malformed_input() {
        let service = PassportService::open(PassportConfig::default()).await.unwrap();
        let result = service.verify_credential("").await;
        assert_eq!(result.error, Some(VerificationFailure::ParseError));
    }
}
