//! Persistence surface.
//!
//! Trait-based key-value storage supporting:
//! - In-memory maps
//! - JSON files on disk

pub mod backend;
pub mod backends;
pub mod config;
pub mod factory;

pub use backend::{keys_with_prefix, BackendType, StorageBackend};
pub use backends::{FileBackend, MemoryBackend};
pub use config::StorageConfig;
pub use factory::create_storage_backend;
