//! Storage backend configuration.
//!
//! Configuration-driven backend selection.

use crate::core::{Error, Result};
use crate::storage::backend::BackendType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persistence layer configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend type to use
    pub backend: BackendType,
    /// File location (file backend only)
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// In-memory storage.
    pub fn memory() -> Self {
        Self::default()
    }

    /// JSON file storage at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendType::File,
            path: Some(path.into()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendType::File && self.path.is_none() {
            return Err(Error::Config(
                "file storage backend requires a path".to_string(),
            ));
        }
        Ok(())
    }
}
