//! # sb-store
//!
//! The Project Manager's working copy: an explicitly constructed, single-writer
//! state container over one `ProjectVersion`, its durable mirror, the end-of-day
//! rollup and a read-only progress summary.

pub mod mirror;
pub mod rollup;
pub mod store;
pub mod summary;

pub use mirror::{FileMirror, MemoryMirror, Mirror, NullMirror};
pub use rollup::{rollup, RollupReport, TotalField, Truncation};
pub use store::ProjectWorkflowStore;
pub use summary::{ProjectProgressSummary, WorkItemProgress};
