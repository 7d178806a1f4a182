//! Progress photos: upload, then push the references into the working copy

use std::sync::Arc;

use sb_attachments::{PhotoUpload, PhotoUploader, UploadError};
use sb_models::ProgressPhotoEntry;
use sb_store::ProjectWorkflowStore;
use tracing::{info, instrument, warn};

use crate::result::ServiceResult;

pub struct ProgressPhotoService {
    uploader: Arc<PhotoUploader>,
}

impl ProgressPhotoService {
    pub fn new(uploader: Arc<PhotoUploader>) -> Self {
        Self { uploader }
    }

    /// Upload `files` and append them as one entry on the work item.
    ///
    /// The address is checked before anything is uploaded. If any upload fails
    /// nothing is pushed.
    #[instrument(skip(self, store, files), fields(files = files.len()))]
    pub async fn attach(
        &self,
        store: &mut ProjectWorkflowStore,
        sheet1_index: usize,
        files: Vec<PhotoUpload>,
        description: &str,
    ) -> ServiceResult<ProgressPhotoEntry> {
        if store.sheet1_item(sheet1_index).is_none() {
            return ServiceResult::failure_with_error(format!("sheet1[{}]", sheet1_index), "does not exist");
        }
        if files.is_empty() {
            return ServiceResult::failure_with_error("photos", "can't be empty");
        }

        let photos = match self.uploader.upload_all(files).await {
            Ok(photos) => photos,
            Err(e) => {
                warn!(error = %e, "Progress photo upload failed");
                return upload_failure("photos", e);
            }
        };

        let entry = ProgressPhotoEntry::new(photos, description);
        if !store.push_to_progress_photos(sheet1_index, entry.clone()) {
            return ServiceResult::failure_with_error(format!("sheet1[{}]", sheet1_index), "does not exist");
        }

        info!(sheet1_index, photos = entry.photos.len(), "Progress photos attached");
        ServiceResult::success(entry)
    }
}

/// A rejected file is reported at `field`; a storage outage is retryable
pub(crate) fn upload_failure<T>(field: &str, error: UploadError) -> ServiceResult<T> {
    if error.is_retryable() {
        ServiceResult::retryable_failure(format!("Upload failed: {}", error))
    } else {
        ServiceResult::failure_with_error(field, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use sb_attachments::{MemoryStorage, Storage, StorageError, StorageResult, StoredObject, UploadConfig};
    use sb_models::{ProjectVersion, WorkItem};
    use std::time::Duration;

    /// Storage whose bucket is unreachable
    struct OfflineStorage;

    #[async_trait]
    impl Storage for OfflineStorage {
        async fn put(&self, _key: &str, _data: Bytes) -> StorageResult<StoredObject> {
            Err(StorageError::Backend("bucket offline".into()))
        }

        async fn get(&self, key: &str) -> StorageResult<Bytes> {
            Err(StorageError::NotFound(key.to_string()))
        }

        async fn delete(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn exists(&self, _key: &str) -> StorageResult<bool> {
            Ok(false)
        }

        async fn url(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
            Ok(key.to_string())
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    fn store_with_item() -> ProjectWorkflowStore {
        let mut store = ProjectWorkflowStore::default();
        let mut project = ProjectVersion::new("Tower A");
        project.sheet1.push(WorkItem::new("Glazing", "sqm", 100.0));
        store.set_project(project);
        store
    }

    fn setup() -> (ProgressPhotoService, Arc<MemoryStorage>, ProjectWorkflowStore) {
        let storage = Arc::new(MemoryStorage::new());
        let uploader = Arc::new(PhotoUploader::new(storage.clone(), UploadConfig::default()));
        (ProgressPhotoService::new(uploader), storage, store_with_item())
    }

    #[tokio::test]
    async fn test_attach_pushes_entry() {
        let (service, storage, mut store) = setup();

        let result = service
            .attach(
                &mut store,
                0,
                vec![
                    PhotoUpload::new("east.jpg", Bytes::from_static(b"jpeg")),
                    PhotoUpload::new("west.png", Bytes::from_static(b"png")),
                ],
                "Level 4 glazing",
            )
            .await;

        assert!(result.is_success());
        let entries = &store.sheet1_item(0).unwrap().yesterday_progress_photos;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "Level 4 glazing");
        assert_eq!(entries[0].photos.len(), 2);
        assert!(storage.exists(&entries[0].photos[1].s3_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_file_is_not_retryable() {
        let (service, _, mut store) = setup();
        let before = store.project().clone();

        let result = service
            .attach(
                &mut store,
                0,
                vec![
                    PhotoUpload::new("east.jpg", Bytes::from_static(b"jpeg")),
                    PhotoUpload::new("notes.docx", Bytes::from_static(b"doc")),
                ],
                "Level 4",
            )
            .await;

        assert!(result.is_failure());
        assert!(!result.is_retryable());
        assert!(result.errors().has_error("photos"));
        assert_eq!(store.project(), &before);
    }

    #[tokio::test]
    async fn test_storage_outage_is_retryable() {
        let uploader = Arc::new(PhotoUploader::new(Arc::new(OfflineStorage), UploadConfig::default()));
        let service = ProgressPhotoService::new(uploader);
        let mut store = store_with_item();
        let before = store.project().clone();

        let result = service
            .attach(&mut store, 0, vec![PhotoUpload::new("east.jpg", Bytes::from_static(b"jpeg"))], "Level 4")
            .await;

        assert!(result.is_retryable());
        assert!(result.errors().paths().next().is_none());
        assert_eq!(store.project(), &before);
    }

    #[tokio::test]
    async fn test_missing_work_item_uploads_nothing() {
        let (service, storage, mut store) = setup();

        let result = service
            .attach(&mut store, 3, vec![PhotoUpload::new("east.jpg", Bytes::from_static(b"jpeg"))], "")
            .await;

        assert!(result.errors().has_error("sheet1[3]"));
        assert!(storage.is_empty().await);
    }
}
