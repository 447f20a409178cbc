//! Object storage for template PDFs

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object name: {0}")]
    InvalidName(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A flat bucket of named objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a new object and return its path within the bucket.
    ///
    /// Existing objects are never overwritten.
    async fn put(&self, name: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, StorageError>;

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;
}

/// Bucket backed by a local directory
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open the bucket, creating its directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn object_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.object_path(name)?;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(name.to_string()),
                _ => StorageError::Io(e),
            })?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        debug!(object = name, content_type, size = bytes.len(), "Stored object");
        Ok(name.to_string())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.object_path(path)?;
        tokio::fs::read(&full).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path().join("templates")).await.unwrap();

        let path = store
            .put("abc.pdf", b"%PDF-1.4".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(path, "abc.pdf");
        assert_eq!(store.get(&path).await.unwrap(), b"%PDF-1.4".to_vec());
    }

    #[tokio::test]
    async fn test_put_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).await.unwrap();
        store
            .put("abc.pdf", b"first".to_vec(), "application/pdf")
            .await
            .unwrap();

        let err = store
            .put("abc.pdf", b"second".to_vec(), "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.get("abc.pdf").await.unwrap(), b"first".to_vec());
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.get("nope.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_names_cannot_escape_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).await.unwrap();
        for name in ["../evil.pdf", "a/b.pdf", "..", ""] {
            assert!(matches!(
                store.put(name, Vec::new(), "application/pdf").await,
                Err(StorageError::InvalidName(_))
            ));
        }
    }
}
