//! Persistence backend
//!
//! Owns the authoritative copy of every project version. Submission hands over a
//! whole document and gets back the stored copy, which then replaces the
//! working copy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sb_core::config::BackendConfig;
use sb_models::ProjectVersion;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Project rejected: {0}")]
    Rejected(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectBackend: Send + Sync {
    /// Load the authoritative copy
    async fn fetch(&self, project_id: &str) -> BackendResult<ProjectVersion>;

    /// Store `project`, assigning a `projectId` on first save, and return the stored copy
    async fn submit(&self, project: &ProjectVersion) -> BackendResult<ProjectVersion>;
}

/// In-memory backend
#[derive(Default)]
pub struct MemoryBackend {
    projects: RwLock<HashMap<String, ProjectVersion>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project, returning its id
    pub async fn insert(&self, mut project: ProjectVersion) -> String {
        let id = project
            .project_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        self.projects.write().await.insert(id.clone(), project);
        id
    }

    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.projects.read().await.is_empty()
    }
}

#[async_trait]
impl ProjectBackend for MemoryBackend {
    async fn fetch(&self, project_id: &str) -> BackendResult<ProjectVersion> {
        self.projects
            .read()
            .await
            .get(project_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(project_id.to_string()))
    }

    async fn submit(&self, project: &ProjectVersion) -> BackendResult<ProjectVersion> {
        let mut stored = project.clone();
        let id = self.insert(stored.clone()).await;
        stored.project_id = Some(id);
        Ok(stored)
    }
}

/// One JSON document per project in a directory
pub struct LocalBackend {
    dir: PathBuf,
}

impl LocalBackend {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.data_dir)
    }

    fn document_path(&self, project_id: &str) -> BackendResult<PathBuf> {
        let valid = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BackendError::Rejected(format!(
                "invalid projectId {:?}",
                project_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", project_id)))
    }
}

#[async_trait]
impl ProjectBackend for LocalBackend {
    #[instrument(skip(self), fields(backend = "local"))]
    async fn fetch(&self, project_id: &str) -> BackendResult<ProjectVersion> {
        let path = self.document_path(project_id)?;
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::NotFound(project_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        debug!(path = ?path, "Project loaded");
        Ok(serde_json::from_str(&contents)?)
    }

    #[instrument(skip(self, project), fields(backend = "local", project_id = ?project.project_id))]
    async fn submit(&self, project: &ProjectVersion) -> BackendResult<ProjectVersion> {
        let mut stored = project.clone();
        let id = stored
            .project_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let path = self.document_path(&id)?;

        fs::create_dir_all(&self.dir).await?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec_pretty(&stored)?).await?;
        fs::rename(&staging, &path).await?;

        info!(project_id = %id, path = ?path, "Project stored");
        Ok(stored)
    }
}
