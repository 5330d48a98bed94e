//! Local filesystem implementation of [`FileStoragePort`].
//!
//! Keys are relative, `/`-separated paths under a root directory. Swapping
//! in an object store only requires another implementation of the port.

use crate::model::StoredFile;
use crate::traits::FileStoragePort;
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spm_types::checksum::sha256_hex;
use std::path::{Component, Path, PathBuf};

/// Files stored beneath a root directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidInput(format!("invalid file key `{key}`")));
        }
        Ok(self.root.join(relative))
    }

    fn url_for(&self, path: &Path) -> String {
        format!("file://{}", path.display())
    }

    async fn describe(&self, key: &str, path: &Path, bytes: &[u8]) -> StorageResult<StoredFile> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| not_found_or(key, e))?;
        let modified_at = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(StoredFile {
            key: key.to_string(),
            url: self.url_for(path),
            size: meta.len(),
            checksum: sha256_hex(bytes),
            content_type: guess_content_type(key).map(str::to_string),
            modified_at,
        })
    }
}

fn not_found_or(key: &str, err: std::io::Error) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(format!("file `{key}` not found"))
    } else {
        StorageError::Backend(err.to_string())
    }
}

fn guess_content_type(key: &str) -> Option<&'static str> {
    let ext = Path::new(key).extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "pdf" => "application/pdf",
        "md" | "markdown" => "text/markdown",
        "txt" => "text/plain",
        "json" => "application/json",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    })
}

#[async_trait]
impl FileStoragePort for LocalFileStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> StorageResult<StoredFile> {
        let path = self.full_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        let mut stored = self.describe(key, &path, bytes).await?;
        if let Some(content_type) = content_type {
            stored.content_type = Some(content_type.to_string());
        }
        tracing::debug!(key, size = stored.size, "stored file");
        Ok(stored)
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.full_path(key)?;
        tokio::fs::read(&path).await.map_err(|e| not_found_or(key, e))
    }

    async fn checksum(&self, key: &str) -> StorageResult<String> {
        Ok(sha256_hex(&self.download(key).await?))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.full_path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn metadata(&self, key: &str) -> StorageResult<StoredFile> {
        let path = self.full_path(key)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| not_found_or(key, e))?;
        self.describe(key, &path, &bytes).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.full_path(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or(key, e))
    }
}
