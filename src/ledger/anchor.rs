//! Known ledger anchors per identifier.
//!
//! The verifier only asks the ledger about issuers listed here.

use crate::core::{Error, Result};
use crate::identity::Identifier;
use crate::ledger::resolver::AnchorRef;
use crate::storage::{keys_with_prefix, StorageBackend};
use std::sync::Arc;
use tracing::debug;

/// Storage key prefix for anchor references.
pub const ANCHOR_PREFIX: &str = "anchor:";

#[derive(Clone)]
pub struct AnchorRegistry {
    backend: Arc<dyn StorageBackend>,
}

impl AnchorRegistry {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn storage_key(identifier: &Identifier) -> String {
        format!("{}{}", ANCHOR_PREFIX, identifier)
    }

    /// Remember that `identifier` was anchored at `anchor`.
    pub async fn record(&self, identifier: &Identifier, anchor: &AnchorRef) -> Result<()> {
        let json = serde_json::to_string(anchor)?;
        self.backend.set(&Self::storage_key(identifier), &json).await?;
        debug!(identifier = %identifier, network = %anchor.network, "recorded anchor");
        Ok(())
    }

    pub async fn get(&self, identifier: &Identifier) -> Result<Option<AnchorRef>> {
        match self.backend.get(&Self::storage_key(identifier)).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| Error::Storage(format!("corrupt anchor for {}: {}", identifier, e))),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, identifier: &Identifier) -> Result<()> {
        self.backend.delete(&Self::storage_key(identifier)).await
    }

    /// Identifiers with a recorded anchor.
    pub async fn list(&self) -> Result<Vec<Identifier>> {
        keys_with_prefix(self.backend.as_ref(), ANCHOR_PREFIX)
            .await?
            .iter()
            .map(|id| Identifier::parse(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;
    use crate::storage::MemoryBackend;

    #[tokio::test]
    async fn test_record_get_remove() {
        let registry = AnchorRegistry::new(Arc::new(MemoryBackend::new()));
        let id = Identifier::parse("did:example:alice").unwrap();
        let anchor = AnchorRef {
            network: "iota-testnet".to_string(),
            reference: "0xabc".to_string(),
            anchored_at: now(),
        };

        assert!(registry.get(&id).await.unwrap().is_none());
        registry.record(&id, &anchor).await.unwrap();
        assert_eq!(registry.get(&id).await.unwrap(), Some(anchor));
        assert_eq!(registry.list().await.unwrap(), vec![id.clone()]);

        registry.remove(&id).await.unwrap();
        assert!(registry.get(&id).await.unwrap().is_none());
    }
}
