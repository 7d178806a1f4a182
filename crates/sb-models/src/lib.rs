//! # sb-models
//!
//! Domain models for Sitebook RS.
//!
//! A [`ProjectVersion`] is the whole document a Project Manager edits during one
//! session: descriptive project data, the bill of quantities (`sheet1` work items
//! with their `sheet2` sub-items), progress photos, blockages and comments. Every
//! type (de)serializes with camelCase keys so the working-copy mirror and backend
//! payloads keep one wire shape.

pub mod blockage;
pub mod file_ref;
pub mod project_version;
pub mod work_item;

pub use blockage::{Blockage, BlockageSeverity, BlockageStatus, BlockageType};
pub use file_ref::{FileRef, PhotoRef};
pub use project_version::{
    Client, Comment, ProjectPriority, ProjectStatus, ProjectVersion, ReportStatus, SiteLocation,
};
pub use work_item::{ProgressPhotoEntry, SubItem, WorkItem, YesterdayProgressReport};
