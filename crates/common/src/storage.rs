//! Blob storage abstraction for listing images.

use std::{collections::HashMap, path::PathBuf, sync::RwLock};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, IdGenerator};

/// A stored blob: where it is served from and the key to delete it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    /// Public URL of the blob.
    pub url: String,
    /// Backend key used for deletion.
    pub storage_id: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `folder` and return its URL and key.
    async fn put(&self, data: &[u8], content_type: &str, folder: &str) -> AppResult<StoredBlob>;

    /// Delete a blob by key. Deleting a missing key is not an error.
    async fn delete(&self, storage_id: &str) -> AppResult<()>;
}

/// File extension for an accepted image content type.
#[must_use]
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Generate a unique key such as `listings/01h.../01h....png`.
#[must_use]
pub fn generate_storage_key(folder: &str, content_type: &str) -> String {
    let ext = image_extension(content_type).unwrap_or("bin");
    format!(
        "{}/{}.{ext}",
        folder.trim_matches('/'),
        IdGenerator::new().generate()
    )
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(AppError::BadRequest("Invalid storage id".to_string()));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn put(&self, data: &[u8], content_type: &str, folder: &str) -> AppResult<StoredBlob> {
        let key = generate_storage_key(folder, content_type);
        let path = self.path_for(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        Ok(StoredBlob {
            url: self.public_url(&key),
            storage_id: key,
        })
    }

    async fn delete(&self, storage_id: &str) -> AppResult<()> {
        let path = self.path_for(storage_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to delete file: {e}"))),
        }
    }
}

/// In-memory backend. Blobs live as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a blob with this key is present.
    #[must_use]
    pub fn contains(&self, storage_id: &str) -> bool {
        self.blobs
            .read()
            .is_ok_and(|blobs| blobs.contains_key(storage_id))
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().map_or(0, |blobs| blobs.len())
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStorage {
    async fn put(&self, data: &[u8], content_type: &str, folder: &str) -> AppResult<StoredBlob> {
        let key = generate_storage_key(folder, content_type);
        self.blobs
            .write()
            .map_err(|_| AppError::Internal("storage lock poisoned".to_string()))?
            .insert(key.clone(), data.to_vec());
        Ok(StoredBlob {
            url: format!("memory://{key}"),
            storage_id: key,
        })
    }

    async fn delete(&self, storage_id: &str) -> AppResult<()> {
        self.blobs
            .write()
            .map_err(|_| AppError::Internal("storage lock poisoned".to_string()))?
            .remove(storage_id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_layout() {
        let key = generate_storage_key("/listings/abc/", "image/png");
        assert!(key.starts_with("listings/abc/"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("image/webp"), Some("webp"));
        assert_eq!(image_extension("image/gif"), None);
    }

    #[tokio::test]
    async fn test_local_storage_put_and_delete() {
        let dir = std::env::temp_dir().join(format!("adoptme-test-{}", IdGenerator::new().generate()));
        let storage = LocalStorage::new(dir.clone(), "/uploads/".to_string());

        let blob = storage
            .put(b"\x89PNG", "image/png", "listings/one")
            .await
            .unwrap();
        assert!(blob.url.starts_with("/uploads/listings/one/"));
        assert!(dir.join(&blob.storage_id).exists());

        storage.delete(&blob.storage_id).await.unwrap();
        assert!(!dir.join(&blob.storage_id).exists());
        // second delete is a no-op
        storage.delete(&blob.storage_id).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_local_storage_rejects_traversal() {
        let storage = LocalStorage::new(std::env::temp_dir(), "/uploads".to_string());
        assert!(storage.delete("../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        let blob = storage.put(b"data", "image/jpeg", "listings/x").await.unwrap();
        assert!(storage.contains(&blob.storage_id));
        storage.delete(&blob.storage_id).await.unwrap();
        assert!(storage.is_empty());
    }
}
