//! In-memory backend implementation.

use crate::core::{Error, Result};
use crate::storage::backend::{BackendType, StorageBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local key-value store.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Storage("memory backend lock poisoned".to_string())
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get() {
        let backend = MemoryBackend::new();
        backend.set("a", "1").await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(backend.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let backend = MemoryBackend::new();
        backend.set("a", "1").await.unwrap();
        backend.set("a", "2").await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), Some("2".to_string()));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let backend = MemoryBackend::new();
        backend.delete("missing").await.unwrap();
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_keys() {
        let backend = MemoryBackend::new();
        backend.set("x", "1").await.unwrap();
        backend.set("y", "2").await.unwrap();
        let mut keys = backend.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["x", "y"]);
    }
}
