//! Blob storage for files attached to exercises, comments and solutions.
//!
//! The rest of the system only ever sees the `Attachment` reference a store
//! hands back; bytes never reach the database.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::StorageConfig;
use crate::db::models::Attachment;
use crate::error::{AppError, AppResult};

/// A file received with a request, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

pub struct StoredBlob {
    pub bytes: Bytes,
    pub mime_type: String,
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn put(&self, file: UploadedFile) -> AppResult<Attachment>;

    async fn open(&self, storage_id: &str) -> AppResult<Option<StoredBlob>>;
    /// Delete a stored blob. Removing one that is already gone is not an error.
    async fn remove(&self, storage_id: &str) -> AppResult<()>;
}

/// Reject a batch of uploads that breaks the configured bounds.
pub fn check_limits(files: &[UploadedFile], config: &StorageConfig) -> AppResult<()> {
    if files.len() > config.max_files {
        return Err(AppError::bad_request(format!(
            "At most {} files per request",
            config.max_files
        )));
    }
    if let Some(file) = files
        .iter()
        .find(|f| f.bytes.len() > config.max_file_bytes())
    {
        return Err(AppError::bad_request(format!(
            "File {} exceeds {} MB",
            file.original_name, config.max_file_mb
        )));
    }
    Ok(())
}

/// Store every file in order, returning their references.
pub async fn store_all(
    store: &dyn AttachmentStore,
    files: Vec<UploadedFile>,
) -> AppResult<Vec<Attachment>> {
    let mut attachments = Vec::with_capacity(files.len());
    for file in files {
        attachments.push(store.put(file).await?);
    }
    Ok(attachments)
}

/// Best-effort removal of blobs whose owning record was never written.
pub async fn discard(store: &dyn AttachmentStore, attachments: &[Attachment]) {
    for attachment in attachments {
        match store.remove(&attachment.storage_id).await {
            Ok(()) => tracing::info!("Discarded orphaned attachment {}", attachment.storage_id),
            Err(e) => tracing::warn!(
                "Failed to discard orphaned attachment {}: {}",
                attachment.storage_id,
                e
            ),
        }
    }
}

/// Keeps blobs as plain files under one directory.
pub struct LocalAttachmentStore {
    root: PathBuf,
    public_url: String,
}

impl LocalAttachmentStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, storage_id: &str) -> Option<PathBuf> {
        let valid = !storage_id.is_empty()
            && storage_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !storage_id.starts_with('.');
        valid.then(|| self.root.join(storage_id))
    }
}

fn extension_for(original_name: &str, mime_type: &str) -> Option<String> {
    let from_name = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase());

    from_name.or_else(|| {
        mime_guess::get_mime_extensions_str(mime_type)
            .and_then(|exts| exts.first())
            .map(|e| e.to_string())
    })
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn put(&self, file: UploadedFile) -> AppResult<Attachment> {
        let storage_id = match extension_for(&file.original_name, &file.mime_type) {
            Some(ext) => format!("{}.{}", uuid::Uuid::now_v7(), ext),
            None => uuid::Uuid::now_v7().to_string(),
        };

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&storage_id), &file.bytes).await?;
        tracing::info!(
            "Stored attachment {} ({} bytes) as {}",
            file.original_name,
            file.bytes.len(),
            storage_id
        );

        Ok(Attachment {
            url: format!("{}/{}", self.public_url, storage_id),
            storage_id,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size_bytes: file.bytes.len() as u64,
        })
    }

    async fn open(&self, storage_id: &str) -> AppResult<Option<StoredBlob>> {
        let Some(path) = self.path_for(storage_id) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(StoredBlob {
                bytes: Bytes::from(bytes),
                mime_type: mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, storage_id: &str) -> AppResult<()> {
        let Some(path) = self.path_for(storage_id) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
