//! LedgerResolver trait definition.

use crate::core::{Result, Timestamp};
use crate::identity::{Identifier, IdentityDocument};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where an identifier's document was anchored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRef {
    /// Ledger/network name, e.g. "iota-testnet"
    pub network: String,
    /// Ledger-specific reference (transaction, output or block id)
    pub reference: String,
    pub anchored_at: Timestamp,
}

/// Read access to identity documents anchored on an external ledger.
///
/// Resolution is network-backed and best-effort. Implementations report
/// connectivity problems as [`crate::Error::Resolution`] and an unknown
/// identifier as `Ok(None)`.
#[async_trait]
pub trait LedgerResolver: Send + Sync {
    /// Look up the document anchored for `identifier`.
    async fn resolve(&self, identifier: &Identifier) -> Result<Option<IdentityDocument>>;

    /// Network name used in anchor references.
    fn network(&self) -> &str;
}
