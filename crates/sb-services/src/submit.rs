//! Daily report submission
//!
//! 1. build the candidate: working copy with `yesterdayReportStatus = PENDING`
//!    and `yesterdayReportCreatedAt = now`
//! 2. validate with the submit contract, reporting every offending path
//! 3. hand the candidate to the backend
//! 4. replace the working copy with the stored copy
//!
//! Any failure leaves the working copy exactly as it was. The mirror is not
//! cleared on success.

use std::sync::Arc;

use sb_contracts::{Contract, SubmitProjectVersionContract};
use sb_models::{ProjectVersion, ReportStatus};
use sb_store::ProjectWorkflowStore;
use tracing::{info, instrument, warn};

use crate::backend::ProjectBackend;
use crate::result::ServiceResult;

pub struct SubmitDailyReportService {
    backend: Arc<dyn ProjectBackend>,
    contract: SubmitProjectVersionContract,
}

impl SubmitDailyReportService {
    pub fn new(backend: Arc<dyn ProjectBackend>) -> Self {
        Self {
            backend,
            contract: SubmitProjectVersionContract::new(),
        }
    }

    /// The document that would be submitted right now
    pub fn candidate(&self, store: &ProjectWorkflowStore) -> ProjectVersion {
        let mut candidate = store.project().clone();
        candidate.yesterday_report_status = ReportStatus::Pending;
        candidate.yesterday_report_created_at = Some(store.clock().now());
        candidate
    }

    /// Check the candidate without submitting it
    pub fn validate(&self, store: &ProjectWorkflowStore) -> ServiceResult<ProjectVersion> {
        let candidate = self.candidate(store);
        match self.contract.validate(&candidate) {
            Ok(()) => ServiceResult::success(candidate),
            Err(errors) => {
                let count = errors.errors.len() + errors.base_errors.len();
                ServiceResult::failure(errors)
                    .with_message(format!("Daily report has {} problem(s) to fix", count))
            }
        }
    }

    #[instrument(skip(self, store), fields(project_id = ?store.project().project_id))]
    pub async fn call(&self, store: &mut ProjectWorkflowStore) -> ServiceResult<ProjectVersion> {
        let mut checked = self.validate(store);
        let Some(candidate) = checked.take_result() else {
            warn!(errors = ?checked.errors().paths().collect::<Vec<_>>(), "Daily report failed validation");
            return checked;
        };

        let confirmed = match self.backend.submit(&candidate).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                warn!(error = %e, "Daily report submission failed");
                return ServiceResult::retryable_failure(format!("Submission failed: {}", e));
            }
        };

        info!(
            project_id = ?confirmed.project_id,
            status = %confirmed.yesterday_report_status,
            "Daily report submitted"
        );
        store.set_project(confirmed.clone());
        ServiceResult::success(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, MemoryBackend, MockProjectBackend};
    use chrono::{TimeZone, Utc};
    use sb_core::traits::FixedClock;
    use sb_models::{SubItem, WorkItem, YesterdayProgressReport};
    use sb_store::MemoryMirror;

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 19, 30, 0).unwrap()
    }

    fn store_with_valid_project() -> (ProjectWorkflowStore, MemoryMirror) {
        let mirror = MemoryMirror::new();
        let mut store = ProjectWorkflowStore::new(Arc::new(mirror.clone()), Arc::new(FixedClock::new(now())));

        let mut project = ProjectVersion::new("Tower A Facade");
        project.assigned_project_manager_id = Some("pm-7".into());
        project.sheet1.push(
            WorkItem::new("Glazing", "sqm", 100.0)
                .with_sub_items(vec![SubItem::new("Clear glass", "sqm", 100.0).connected()]),
        );
        store.set_project(project);
        (store, mirror)
    }

    #[tokio::test]
    async fn test_submit_replaces_working_copy() {
        let backend = Arc::new(MemoryBackend::new());
        let service = SubmitDailyReportService::new(backend.clone());
        let (mut store, mirror) = store_with_valid_project();

        let result = service.call(&mut store).await;
        assert!(result.is_success());

        let project = store.project();
        assert!(project.project_id.is_some());
        assert_eq!(project.yesterday_report_status, ReportStatus::Pending);
        assert_eq!(project.yesterday_report_created_at, Some(now()));
        assert_eq!(backend.len().await, 1);
        // Submission keeps the mirror
        assert!(mirror.contents().is_some());
    }

    #[tokio::test]
    async fn test_validation_failure_lists_every_path() {
        let mut backend = MockProjectBackend::new();
        backend.expect_submit().never();
        let service = SubmitDailyReportService::new(Arc::new(backend));

        let (mut store, _) = store_with_valid_project();
        let mut item = store.sheet1_item(0).unwrap().clone();
        item.total_installed = 150.0;
        item.sheet2[0].total_supplied = 90.0;
        item.sheet2[0].yesterday_progress_report = Some(YesterdayProgressReport::new(20.0, 0.0));
        assert!(store.edit_sheet1_item(0, item));
        let mut project = store.project().clone();
        project.assigned_project_manager_id = None;
        store.set_project(project);
        let before = store.project().clone();

        let result = service.call(&mut store).await;

        assert!(result.is_failure());
        assert!(!result.is_retryable());
        let paths: Vec<&str> = result.errors().paths().collect();
        assert_eq!(
            paths,
            vec![
                "assignedProjectManagerId",
                "sheet1[0].sheet2[0].yesterdayProgressReport.yesterdaySupplied",
                "sheet1[0].totalInstalled",
            ]
        );
        assert_eq!(store.project(), &before);
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_store_unchanged() {
        let mut backend = MockProjectBackend::new();
        backend
            .expect_submit()
            .times(1)
            .returning(|_| Err(BackendError::Unavailable("connection refused".into())));
        let service = SubmitDailyReportService::new(Arc::new(backend));

        let (mut store, _) = store_with_valid_project();
        let before = store.project().clone();

        let result = service.call(&mut store).await;

        assert!(result.is_failure());
        assert!(result.is_retryable());
        assert_eq!(store.project(), &before);
        assert_eq!(store.project().yesterday_report_status, ReportStatus::NotCreated);
    }

    #[tokio::test]
    async fn test_backend_receives_pending_candidate() {
        let mut backend = MockProjectBackend::new();
        backend
            .expect_submit()
            .withf(|project| {
                project.yesterday_report_status == ReportStatus::Pending
                    && project.yesterday_report_created_at == Some(now())
            })
            .times(1)
            .returning(|project| {
                let mut stored = project.clone();
                stored.project_id = Some("p-1".into());
                Ok(stored)
            });
        let service = SubmitDailyReportService::new(Arc::new(backend));

        let (mut store, _) = store_with_valid_project();
        let result = service.call(&mut store).await;

        assert!(result.is_success());
        assert_eq!(store.project().project_id.as_deref(), Some("p-1"));
    }
}
