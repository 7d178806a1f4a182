//! Photo upload
//!
//! Turns raw image bytes into a `PhotoRef` the store can hold. Uploads are
//! fire-once: a failure is returned to the caller, never retried here.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use sb_core::config::StorageConfig;
use sb_models::PhotoRef;
use thiserror::Error;
use tracing::{info, instrument};

use crate::storage::{content_type_for, generate_key, sanitize_file_name, Storage, StorageError};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File is empty: {0}")]
    Empty(String),
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },
    #[error("Not an image: {file_name} ({content_type})")]
    NotAnImage { file_name: String, content_type: String },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl UploadError {
    /// Only storage failures can succeed on a second attempt; the rest reject the file itself
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted size in bytes
    pub max_size: usize,
    pub url_expiry: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size: 20 * 1024 * 1024,
            url_expiry: Duration::from_secs(3600),
        }
    }
}

impl From<&StorageConfig> for UploadConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            max_size: config.max_photo_size,
            url_expiry: Duration::from_secs(config.url_expiry_seconds),
        }
    }
}

/// A file handed in for upload
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub data: Bytes,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

pub struct PhotoUploader {
    storage: Arc<dyn Storage>,
    config: UploadConfig,
}

impl PhotoUploader {
    pub fn new(storage: Arc<dyn Storage>, config: UploadConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Check size and image type, store the bytes, return the reference
    #[instrument(skip(self, data), fields(storage = self.storage.name(), size = data.len()))]
    pub async fn upload(&self, file_name: &str, data: Bytes) -> UploadResult<PhotoRef> {
        let file_name = sanitize_file_name(file_name);

        if data.is_empty() {
            return Err(UploadError::Empty(file_name));
        }
        if data.len() > self.config.max_size {
            return Err(UploadError::TooLarge {
                size: data.len(),
                max: self.config.max_size,
            });
        }

        let content_type = content_type_for(&file_name);
        if !content_type.starts_with("image/") {
            return Err(UploadError::NotAnImage {
                file_name,
                content_type,
            });
        }

        let key = generate_key(&file_name, Utc::now());
        let stored = self.storage.put(&key, data).await?;
        let url = self.storage.url(&key, self.config.url_expiry).await?;

        info!(key = %key, digest = %stored.digest, "Photo uploaded");

        Ok(PhotoRef::new(key, file_name, content_type, url))
    }

    /// Upload every file, stopping at the first failure
    pub async fn upload_all(&self, files: Vec<PhotoUpload>) -> UploadResult<Vec<PhotoRef>> {
        let mut photos = Vec::with_capacity(files.len());
        for file in files {
            photos.push(self.upload(&file.file_name, file.data).await?);
        }
        Ok(photos)
    }

    /// Regenerate the time-limited URL of an existing reference
    pub async fn refresh_url(&self, photo: &PhotoRef) -> UploadResult<PhotoRef> {
        let url = self.storage.url(&photo.s3_key, self.config.url_expiry).await?;
        Ok(PhotoRef { url, ..photo.clone() })
    }
}
