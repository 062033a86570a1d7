//! JSON file backend implementation.
//!
//! The whole store is one JSON object. Every mutation rewrites it through a
//! temporary file followed by a rename, so readers never see a torn file.

use crate::core::{Error, Result};
use crate::storage::backend::{BackendType, StorageBackend};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// File-backed key-value store.
pub struct FileBackend {
    path: PathBuf,
    /// Guards both the map and the file; writes are serialized.
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileBackend {
    /// Open (or create on first write) the store at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::Storage(format!("corrupt store file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::Storage(format!("cannot create {}: {}", parent.display(), e)))?;
            }
        }
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| Error::Storage(format!("cannot write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Storage(format!("cannot replace {}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries).await {
            // keep memory consistent with disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if let Some(old) = entries.remove(key) {
            if let Err(e) = self.persist(&entries).await {
                entries.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::File
    }

    async fn flush(&self) -> Result<()> {
        let entries = self.entries.lock().await;
        self.persist(&entries).await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self
            .path
            .parent()
            .map(|p| p.as_os_str().is_empty() || p.exists())
            .unwrap_or(true))
    }
}
