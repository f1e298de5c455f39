//! Storage backends for course file URLs.

pub mod azure;
pub mod filesystem;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Storage backend trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store content with the given key, overwriting any previous value
    async fn put(&self, key: &str, content: Bytes) -> Result<()>;

    /// Retrieve content by key; `AppError::NotFound` when the key is absent
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Delete content by key; deleting an absent key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Create the storage backend selected by configuration.
pub async fn create_backend(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    match config.storage_backend.as_str() {
        "filesystem" => {
            let path = PathBuf::from(&config.storage_path);
            fs::create_dir_all(&path).await?;
            Ok(Arc::new(filesystem::FilesystemStorage::new(path)))
        }
        "azure" => {
            let azure_config = azure::AzureConfig::from_env()?;
            Ok(Arc::new(azure::AzureBackend::new(azure_config)?))
        }
        other => Err(AppError::Config(format!(
            "Unknown storage backend: {}",
            other
        ))),
    }
}
