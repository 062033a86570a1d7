//! Backend factory.
//!
//! Creates storage backends based on configuration.

use crate::core::{Error, Result};
use crate::storage::backend::{BackendType, StorageBackend};
use crate::storage::backends::{FileBackend, MemoryBackend};
use crate::storage::config::StorageConfig;
use std::sync::Arc;

/// Create a storage backend from configuration.
///
/// Returns an Arc-wrapped backend for shared ownership between stores.
pub async fn create_storage_backend(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    config.validate()?;
    match config.backend {
        BackendType::Memory => Ok(Arc::new(MemoryBackend::new()) as Arc<dyn StorageBackend>),
        BackendType::File => {
            let path = config
                .path
                .clone()
                .ok_or_else(|| Error::Config("file storage backend requires a path".into()))?;
            let backend = FileBackend::open(path).await?;
            Ok(Arc::new(backend) as Arc<dyn StorageBackend>)
        }
    }
}
