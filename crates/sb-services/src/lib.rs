//! # sb-services
//!
//! Workflow services for Sitebook RS.
//!
//! Services orchestrate the working-copy store and its external collaborators
//! (persistence backend, object storage). Each call returns a `ServiceResult`;
//! a failed call leaves the working copy unchanged.

pub mod backend;
pub mod blockages;
pub mod load;
pub mod photos;
pub mod result;
pub mod submit;

pub use backend::{BackendError, BackendResult, LocalBackend, MemoryBackend, ProjectBackend};
pub use blockages::{BlockageDraft, BlockageReportService};
pub use load::LoadProjectService;
pub use photos::ProgressPhotoService;
pub use result::ServiceResult;
pub use submit::SubmitDailyReportService;
