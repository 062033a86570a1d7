//! In-memory reference ledger.
//!
//! Stands in for a real network in tests and local demos. It can simulate an
//! outage and a slow link.

use crate::core::{now, Error, Result};
use crate::identity::{Identifier, IdentityDocument};
use crate::ledger::resolver::{AnchorRef, LedgerResolver};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Ledger double backed by a hash map.
pub struct InMemoryLedger {
    network: String,
    documents: RwLock<HashMap<Identifier, IdentityDocument>>,
    offline: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryLedger {
    pub fn new(network: &str) -> Self {
        Self {
            network: network.to_string(),
            documents: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            latency: None,
        }
    }

    /// Delay every resolution by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make subsequent resolutions fail with a connectivity error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Seed the ledger with a document and return its anchor reference.
    pub fn insert(&self, document: IdentityDocument) -> Result<AnchorRef> {
        document.validate()?;
        let reference = format!("0x{}", document.hash()?.to_hex());
        self.documents
            .write()
            .map_err(|_| Error::Internal("ledger lock poisoned".to_string()))?
            .insert(document.id.clone(), document);
        Ok(AnchorRef {
            network: self.network.clone(),
            reference,
            anchored_at: now(),
        })
    }
}

#[async_trait]
impl LedgerResolver for InMemoryLedger {
    async fn resolve(&self, identifier: &Identifier) -> Result<Option<IdentityDocument>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Resolution(format!(
                "{} unreachable: connection refused",
                self.network
            )));
        }
        let documents = self
            .documents
            .read()
            .map_err(|_| Error::Resolution("ledger lock poisoned".to_string()))?;
        Ok(documents.get(identifier).cloned())
    }

    fn network(&self) -> &str {
        &self.network
    }
}
