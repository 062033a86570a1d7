//! Identity Issuer.
//!
//! Creates an identifier, its document and its signing key as one unit.

use crate::core::{Error, Result};
use crate::identity::crypto::CryptoSuite;
use crate::identity::did::{Identifier, IdentityDocument};
use crate::identity::registry::DocumentStore;
use crate::keystore::KeyStore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A freshly created identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatedIdentity {
    pub identifier: Identifier,
    pub document: IdentityDocument,
    /// Always false here: anchoring on a ledger is a separate step.
    pub published: bool,
}

/// Creates identities and registers their keys and documents.
#[derive(Clone)]
pub struct IdentityIssuer {
    method: String,
    key_store: KeyStore,
    documents: DocumentStore,
}

impl IdentityIssuer {
    pub fn new(method: &str, key_store: KeyStore, documents: DocumentStore) -> Self {
        Self {
            method: method.to_string(),
            key_store,
            documents,
        }
    }

    /// Create a new identity whose key is sealed under `password`.
    ///
    /// Either the key and the document are both stored, or neither is.
    /// Any failure is reported as [`Error::IdentityCreation`].
    pub async fn create_identity(&self, password: &str) -> Result<CreatedIdentity> {
        self.try_create(password).await.map_err(|e| match e {
            Error::IdentityCreation(_) => e,
            other => Error::IdentityCreation(other.to_string()),
        })
    }

    async fn try_create(&self, password: &str) -> Result<CreatedIdentity> {
        let crypto = CryptoSuite::generate()?;
        let public_key = crypto.verifying_key_bytes();
        let identifier = Identifier::from_public_key(&self.method, &public_key)?;
        let document = IdentityDocument::new(&identifier, &public_key);
        document.validate()?;

        if self.key_store.has(&identifier).await? {
            return Err(Error::IdentityCreation(format!(
                "identifier collision on {}",
                identifier
            )));
        }

        self.key_store
            .save(&identifier, crypto.secret_bytes().as_slice(), password)
            .await?;

        if let Err(e) = self.documents.put(&document).await {
            if let Err(cleanup) = self.key_store.delete(&identifier).await {
                warn!(identifier = %identifier, error = %cleanup, "failed to roll back key after document write error");
            }
            return Err(e);
        }

        info!(identifier = %identifier, "created identity");
        Ok(CreatedIdentity {
            identifier,
            document,
            published: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BackendType, MemoryBackend, StorageBackend};
    use async_trait::async_trait;
    use std::sync::Arc;

    const ITERATIONS: u32 = 100_000;

    fn issuer_over(backend: Arc<dyn StorageBackend>) -> (IdentityIssuer, KeyStore, DocumentStore) {
        let keys = KeyStore::new(backend.clone(), ITERATIONS);
        let docs = DocumentStore::new(backend);
        (IdentityIssuer::new("dpp", keys.clone(), docs.clone()), keys, docs)
    }

    /// Accepts key writes, rejects document writes.
    struct NoDocumentsBackend {
        inner: MemoryBackend,
    }

    #[async_trait]
    impl StorageBackend for NoDocumentsBackend {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if key.starts_with("doc:") {
                return Err(Error::Storage("disk full".into()));
            }
            self.inner.set(key, value).await
        }
        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }
        async fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys().await
        }
        fn backend_type(&self) -> BackendType {
            BackendType::Memory
        }
    }

    #[tokio::test]
    async fn test_create_identity() {
        let (issuer, keys, docs) = issuer_over(Arc::new(MemoryBackend::new()));
        let created = issuer.create_identity("pw").await.unwrap();

        assert!(!created.published);
        assert!(created.identifier.as_str().starts_with("did:dpp:"));
        assert!(!created.document.verification_method.is_empty());
        assert!(keys.has(&created.identifier).await.unwrap());
        assert_eq!(
            docs.get(&created.identifier).await.unwrap(),
            Some(created.document.clone())
        );
    }

    #[tokio::test]
    async fn test_stored_key_matches_document() {
        let (issuer, keys, _) = issuer_over(Arc::new(MemoryBackend::new()));
        let created = issuer.create_identity("pw").await.unwrap();

        let secret = keys.load(&created.identifier, "pw").await.unwrap().unwrap();
        let crypto = CryptoSuite::from_bytes(&secret).unwrap();
        let method = &created.document.verification_method[0];
        assert_eq!(
            method.verifying_key().unwrap().to_bytes(),
            crypto.verifying_key_bytes()
        );
    }

    #[tokio::test]
    async fn test_two_calls_give_independent_identities() {
        let (issuer, keys, _) = issuer_over(Arc::new(MemoryBackend::new()));
        let a = issuer.create_identity("pw").await.unwrap();
        let b = issuer.create_identity("pw").await.unwrap();

        assert_ne!(a.identifier, b.identifier);
        assert_eq!(keys.list_identifiers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_document_failure_rolls_back_key() {
        let backend = Arc::new(NoDocumentsBackend {
            inner: MemoryBackend::new(),
        });
        let (issuer, keys, _) = issuer_over(backend);

        let result = issuer.create_identity("pw").await;
        assert!(matches!(result, Err(Error::IdentityCreation(_))));
        assert!(keys.list_identifiers().await.unwrap().is_empty());
    }
}
