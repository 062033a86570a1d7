//! Local identity document registry.

use crate::core::{Error, Result};
use crate::identity::did::{Identifier, IdentityDocument};
use crate::storage::{keys_with_prefix, StorageBackend};
use std::sync::Arc;

/// Storage key prefix for identity documents.
pub const DOC_PREFIX: &str = "doc:";

/// Documents of identities created by this node, keyed by identifier.
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn StorageBackend>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn storage_key(identifier: &Identifier) -> String {
        format!("{}{}", DOC_PREFIX, identifier)
    }

    /// Store (or replace) a document.
    pub async fn put(&self, document: &IdentityDocument) -> Result<()> {
        document.validate()?;
        let json = serde_json::to_string(document)?;
        self.backend.set(&Self::storage_key(&document.id), &json).await
    }

    /// Fetch the document for `identifier`.
    pub async fn get(&self, identifier: &Identifier) -> Result<Option<IdentityDocument>> {
        match self.backend.get(&Self::storage_key(identifier)).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| Error::Storage(format!("corrupt document for {}: {}", identifier, e))),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, identifier: &Identifier) -> Result<()> {
        self.backend.delete(&Self::storage_key(identifier)).await
    }

    /// Identifiers with a stored document.
    pub async fn list(&self) -> Result<Vec<Identifier>> {
        keys_with_prefix(self.backend.as_ref(), DOC_PREFIX)
            .await?
            .iter()
            .map(|id| Identifier::parse(id))
            .collect()
    }
}
