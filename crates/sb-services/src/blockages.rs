//! Blockage reporting: upload the evidence photos, then record a PENDING blockage

use std::sync::Arc;

use sb_attachments::{PhotoUpload, PhotoUploader};
use sb_contracts::field_rules;
use sb_models::{Blockage, BlockageSeverity, BlockageType};
use sb_store::ProjectWorkflowStore;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::photos::upload_failure;
use crate::result::ServiceResult;

/// What the site team fills in when reporting a blockage
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlockageDraft {
    #[serde(rename = "type", default)]
    pub blockage_type: BlockageType,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub category: String,
    #[serde(default)]
    pub severity: BlockageSeverity,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub description: String,
    #[serde(default)]
    pub weather_report: String,
    #[serde(default)]
    pub man_power: u32,
}

impl BlockageDraft {
    pub fn new(
        blockage_type: BlockageType,
        category: impl Into<String>,
        severity: BlockageSeverity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            blockage_type,
            category: category.into(),
            severity,
            description: description.into(),
            ..Default::default()
        }
    }
}

pub struct BlockageReportService {
    uploader: Arc<PhotoUploader>,
}

impl BlockageReportService {
    pub fn new(uploader: Arc<PhotoUploader>) -> Self {
        Self { uploader }
    }

    #[instrument(skip(self, store, draft, files), fields(files = files.len()))]
    pub async fn report(
        &self,
        store: &mut ProjectWorkflowStore,
        sheet1_index: usize,
        draft: BlockageDraft,
        files: Vec<PhotoUpload>,
    ) -> ServiceResult<Blockage> {
        if store.sheet1_item(sheet1_index).is_none() {
            return ServiceResult::failure_with_error(format!("sheet1[{}]", sheet1_index), "does not exist");
        }
        let errors = field_rules(&draft);
        if !errors.is_empty() {
            return ServiceResult::failure(errors);
        }

        let photos = match self.uploader.upload_all(files).await {
            Ok(photos) => photos,
            Err(e) => {
                warn!(error = %e, "Blockage photo upload failed");
                return upload_failure("blockagePhotos", e);
            }
        };

        let blockage = Blockage::new_pending(
            draft.blockage_type,
            draft.category,
            draft.severity,
            draft.description,
            store.clock().now(),
        )
        .with_site_conditions(draft.weather_report, draft.man_power)
        .with_photos(photos);

        if !store.push_to_blockages(sheet1_index, blockage.clone()) {
            return ServiceResult::failure_with_error(format!("sheet1[{}]", sheet1_index), "does not exist");
        }

        info!(
            sheet1_index,
            severity = ?blockage.severity,
            photos = blockage.blockage_photos.len(),
            "Blockage reported"
        );
        ServiceResult::success(blockage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};
    use sb_attachments::{MemoryStorage, UploadConfig};
    use sb_core::traits::FixedClock;
    use sb_models::{BlockageStatus, ProjectVersion, WorkItem};
    use sb_store::NullMirror;

    fn setup() -> (BlockageReportService, ProjectWorkflowStore) {
        let uploader = Arc::new(PhotoUploader::new(Arc::new(MemoryStorage::new()), UploadConfig::default()));
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 5, 11, 15, 0).unwrap());
        let mut store = ProjectWorkflowStore::new(Arc::new(NullMirror), Arc::new(clock));

        let mut project = ProjectVersion::new("Tower A");
        project.sheet1.push(WorkItem::new("Glazing", "sqm", 100.0));
        store.set_project(project);

        (BlockageReportService::new(uploader), store)
    }

    fn draft() -> BlockageDraft {
        BlockageDraft {
            weather_report: "Heavy rain".into(),
            man_power: 12,
            ..BlockageDraft::new(
                BlockageType::Client,
                "Site access",
                BlockageSeverity::High,
                "Main gate closed by client security",
            )
        }
    }

    #[tokio::test]
    async fn test_report_records_pending_blockage() {
        let (service, mut store) = setup();

        let result = service
            .report(
                &mut store,
                0,
                draft(),
                vec![PhotoUpload::new("gate.jpg", Bytes::from_static(b"jpeg"))],
            )
            .await;

        assert!(result.is_success());
        let pending = store.pending_blockages(0);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, BlockageStatus::Pending);
        assert_eq!(pending[0].man_power, 12);
        assert_eq!(pending[0].weather_report, "Heavy rain");
        assert_eq!(pending[0].blockage_photos.len(), 1);
        assert_eq!(
            pending[0].blockage_start_time,
            Utc.with_ymd_and_hms(2024, 3, 5, 11, 15, 0).unwrap()
        );
        assert!(pending[0].blockage_end_time.is_none());
    }

    #[tokio::test]
    async fn test_blank_draft_is_rejected() {
        let (service, mut store) = setup();
        let mut blank = draft();
        blank.description.clear();

        let result = service.report(&mut store, 0, blank, Vec::new()).await;

        assert!(result.errors().has_error("description"));
        assert!(store.sheet1_blockages(0).is_empty());
    }

    #[tokio::test]
    async fn test_rejected_photo_records_nothing() {
        let (service, mut store) = setup();

        let result = service
            .report(
                &mut store,
                0,
                draft(),
                vec![PhotoUpload::new("gate.exe", Bytes::from_static(b"MZ"))],
            )
            .await;

        assert!(!result.is_retryable());
        assert!(result.errors().has_error("blockagePhotos"));
        assert!(store.sheet1_blockages(0).is_empty());
    }
}
