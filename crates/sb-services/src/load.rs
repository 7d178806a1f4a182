//! Load a project version into the working copy

use std::sync::Arc;

use sb_models::ProjectVersion;
use sb_store::ProjectWorkflowStore;
use tracing::{instrument, warn};

use crate::backend::{BackendError, ProjectBackend};
use crate::result::ServiceResult;

pub struct LoadProjectService {
    backend: Arc<dyn ProjectBackend>,
}

impl LoadProjectService {
    pub fn new(backend: Arc<dyn ProjectBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, store))]
    pub async fn call(&self, store: &mut ProjectWorkflowStore, project_id: &str) -> ServiceResult<ProjectVersion> {
        match self.backend.fetch(project_id).await {
            Ok(project) => {
                store.set_project(project.clone());
                ServiceResult::success(project)
            }
            Err(BackendError::NotFound(_)) => ServiceResult::failure_with_error("projectId", "does not exist"),
            Err(e) => {
                warn!(error = %e, "Failed to load project");
                ServiceResult::retryable_failure(format!("Load failed: {}", e))
            }
        }
    }
}
