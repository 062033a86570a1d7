//! StorageBackend trait definition.
//!
//! The key-value persistence surface every store in the crate sits on.

use crate::core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Backend type identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Process-local map, lost on drop
    #[default]
    Memory,
    /// Single JSON document on disk
    File,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Memory => write!(f, "memory"),
            BackendType::File => write!(f, "file"),
        }
    }
}

/// Core trait for persistence backends.
///
/// Implementations only guarantee per-key atomicity. Two writers racing on
/// the same key resolve as last-write-wins.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns None if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List every stored key.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Get the backend type.
    fn backend_type(&self) -> BackendType;

    /// Persist any buffered state.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Health check for the backend.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// List the keys under `prefix`, with the prefix stripped, sorted.
pub async fn keys_with_prefix(backend: &dyn StorageBackend, prefix: &str) -> Result<Vec<String>> {
    let mut keys: Vec<String> = backend
        .keys()
        .await?
        .into_iter()
        .filter_map(|k| k.strip_prefix(prefix).map(str::to_string))
        .collect();
    keys.sort();
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    #[test]
    fn test_backend_type_display() {
        assert_eq!(BackendType::Memory.to_string(), "memory");
        assert_eq!(BackendType::File.to_string(), "file");
    }

    #[test]
    fn test_backend_type_serde() {
        let parsed: BackendType = serde_json::from_str("\"file\"").unwrap();
        assert_eq!(parsed, BackendType::File);
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let backend = MemoryBackend::new();
        backend.set("key:b", "1").await.unwrap();
        backend.set("key:a", "2").await.unwrap();
        backend.set("doc:a", "3").await.unwrap();

        let keys = keys_with_prefix(&backend, "key:").await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
