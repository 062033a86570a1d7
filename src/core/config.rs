//! Passport configuration.
//!
//! One serde-backed structure drives every component; all fields have
//! defaults so partial JSON documents are accepted.

use crate::core::{Error, Result};
use crate::monitoring::LoggerConfig;
use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Lowest accepted PBKDF2 iteration count.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Longest accepted credential lifetime (about a century).
pub const MAX_CREDENTIAL_VALIDITY_DAYS: i64 = 36_500;

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PassportConfig {
    /// DID method namespace, e.g. "dpp" for `did:dpp:...`
    pub did_method: String,
    /// PBKDF2 iterations for key store encryption
    pub kdf_iterations: u32,
    /// Credential lifetime in days
    pub credential_validity_days: i64,
    /// Attempt ledger resolution during verification
    pub on_chain: bool,
    /// Upper bound on a single ledger resolution call
    pub resolution_timeout_ms: u64,
    /// Persistence backend
    pub storage: StorageConfig,
    /// Logging
    pub logging: LoggerConfig,
}

impl Default for PassportConfig {
    fn default() -> Self {
        Self {
            did_method: "dpp".to_string(),
            kdf_iterations: MIN_KDF_ITERATIONS,
            credential_validity_days: 365,
            on_chain: false,
            resolution_timeout_ms: 5000,
            storage: StorageConfig::default(),
            logging: LoggerConfig::default(),
        }
    }
}

impl PassportConfig {
    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Enable ledger resolution.
    pub fn with_on_chain(mut self, on_chain: bool) -> Self {
        self.on_chain = on_chain;
        self
    }

    /// Override the storage backend.
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.resolution_timeout_ms)
    }

    pub fn credential_validity(&self) -> chrono::Duration {
        chrono::Duration::days(
            self.credential_validity_days
                .clamp(1, MAX_CREDENTIAL_VALIDITY_DAYS),
        )
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.did_method.is_empty()
            || !self
                .did_method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(Error::Config(format!(
                "did_method must be non-empty lowercase alphanumeric, got {:?}",
                self.did_method
            )));
        }
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(Error::Config(format!(
                "kdf_iterations must be at least {}, got {}",
                MIN_KDF_ITERATIONS, self.kdf_iterations
            )));
        }
        if !(1..=MAX_CREDENTIAL_VALIDITY_DAYS).contains(&self.credential_validity_days) {
            return Err(Error::Config(format!(
                "credential_validity_days must be between 1 and {}, got {}",
                MAX_CREDENTIAL_VALIDITY_DAYS, self.credential_validity_days
            )));
        }
        if self.resolution_timeout_ms == 0 {
            return Err(Error::Config(
                "resolution_timeout_ms must be positive".to_string(),
            ));
        }
        self.storage.validate()
    }
}
