//! The working-copy store
//!
//! Holds exactly one `ProjectVersion` for the current session and exposes
//! index-addressed access into its nested collections. Every mutation that
//! targets a path returns `true` when applied and `false` when the path does not
//! exist in the current snapshot; a miss never panics and never mutates.
//!
//! After each applied mutation the whole document is written to the mirror.
//! A failed mirror write is logged and the mutation still stands.

use std::sync::Arc;

use sb_core::error::SbError;
use sb_core::traits::{Clock, SystemClock};
use sb_models::{
    Blockage, Comment, ProgressPhotoEntry, ProjectVersion, ReportStatus, SubItem, WorkItem,
    YesterdayProgressReport,
};
use tracing::{debug, info, warn};

use crate::mirror::{Mirror, NullMirror};
use crate::rollup::{rollup, RollupReport};
use crate::summary::ProjectProgressSummary;

/// Session-scoped holder of the working copy, mirrored after every applied mutation
pub struct ProjectWorkflowStore {
    project: ProjectVersion,
    mirror: Arc<dyn Mirror>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ProjectWorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectWorkflowStore")
            .field("project", &self.project)
            .field("mirror", &self.mirror.name())
            .finish()
    }
}

impl Default for ProjectWorkflowStore {
    fn default() -> Self {
        Self::new(Arc::new(NullMirror), Arc::new(SystemClock))
    }
}

impl ProjectWorkflowStore {
    /// An empty store. The mirror is not read; use [`rehydrate`](Self::rehydrate) on startup.
    pub fn new(mirror: Arc<dyn Mirror>, clock: Arc<dyn Clock>) -> Self {
        Self {
            project: ProjectVersion::default(),
            mirror,
            clock,
        }
    }

    /// A store restored from the mirror
    ///
    /// An unreadable or corrupt mirror is logged and the store starts empty.
    pub fn rehydrate(mirror: Arc<dyn Mirror>, clock: Arc<dyn Clock>) -> Self {
        let mut store = Self::new(mirror, clock);

        match store.mirror.load() {
            Ok(Some(contents)) => match serde_json::from_str::<ProjectVersion>(&contents) {
                Ok(project) => {
                    info!(
                        mirror = store.mirror.name(),
                        project_id = ?project.project_id,
                        work_items = project.sheet1.len(),
                        "Working copy restored from mirror"
                    );
                    store.project = project;
                }
                Err(e) => warn!(mirror = store.mirror.name(), error = %e, "Ignoring unreadable mirror"),
            },
            Ok(None) => debug!(mirror = store.mirror.name(), "Mirror empty, starting fresh"),
            Err(e) => warn!(mirror = store.mirror.name(), error = %e, "Failed to read mirror"),
        }

        store
    }

    /// Clock used for blockage and rollup timestamps
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ------------------------------------------------------------------
    // Whole document
    // ------------------------------------------------------------------

    /// Replace the working copy (initial load, post-submission replace)
    pub fn set_project(&mut self, project: ProjectVersion) {
        info!(
            project_id = ?project.project_id,
            name = %project.name,
            work_items = project.sheet1.len(),
            "Working copy replaced"
        );
        self.project = project;
        self.persist("set_project");
    }

    /// The current working copy
    pub fn project(&self) -> &ProjectVersion {
        &self.project
    }

    /// Clear the working copy and the mirror
    pub fn reset_project(&mut self) {
        self.project = ProjectVersion::default();
        if let Err(e) = self.mirror.clear() {
            warn!(mirror = self.mirror.name(), error = %e, "Failed to clear mirror");
        }
        info!("Working copy reset");
    }

    // ------------------------------------------------------------------
    // Sheet1
    // ------------------------------------------------------------------

    /// The work item at `sheet1_index`, if any
    pub fn sheet1_item(&self, sheet1_index: usize) -> Option<&WorkItem> {
        self.project.sheet1.get(sheet1_index)
    }

    /// Append a work item
    pub fn push_to_sheet1(&mut self, item: WorkItem) {
        self.project.sheet1.push(item);
        self.persist("push_to_sheet1");
    }

    /// Replace the whole work item at `sheet1_index`
    pub fn edit_sheet1_item(&mut self, sheet1_index: usize, item: WorkItem) -> bool {
        let Some(slot) = self.project.sheet1.get_mut(sheet1_index) else {
            return miss("edit_sheet1_item", sheet1_index, None);
        };
        *slot = item;
        self.persist("edit_sheet1_item")
    }

    /// Remove the work item, shifting later items down
    pub fn delete_sheet1_item(&mut self, sheet1_index: usize) -> bool {
        if sheet1_index >= self.project.sheet1.len() {
            return miss("delete_sheet1_item", sheet1_index, None);
        }
        self.project.sheet1.remove(sheet1_index);
        self.persist("delete_sheet1_item")
    }

    // ------------------------------------------------------------------
    // Sheet2
    // ------------------------------------------------------------------

    /// The sub-item at `sheet1[i].sheet2[j]`, if any
    pub fn sheet2_item(&self, sheet1_index: usize, sheet2_index: usize) -> Option<&SubItem> {
        self.sheet1_item(sheet1_index)?.sheet2.get(sheet2_index)
    }

    /// Append a sub-item to the work item's breakdown
    pub fn push_to_sheet2(&mut self, sheet1_index: usize, sub_item: SubItem) -> bool {
        let Some(item) = self.project.sheet1.get_mut(sheet1_index) else {
            return miss("push_to_sheet2", sheet1_index, None);
        };
        item.sheet2.push(sub_item);
        self.persist("push_to_sheet2")
    }

    /// Replace the whole sub-item at `sheet1[i].sheet2[j]`
    pub fn edit_sheet2_item(&mut self, sheet1_index: usize, sheet2_index: usize, sub_item: SubItem) -> bool {
        let Some(slot) = self.sub_item_mut(sheet1_index, sheet2_index) else {
            return miss("edit_sheet2_item", sheet1_index, Some(sheet2_index));
        };
        *slot = sub_item;
        self.persist("edit_sheet2_item")
    }

    /// Remove the sub-item, shifting later sub-items down
    pub fn delete_sheet2_item(&mut self, sheet1_index: usize, sheet2_index: usize) -> bool {
        match self.project.sheet1.get_mut(sheet1_index) {
            Some(item) if sheet2_index < item.sheet2.len() => {
                item.sheet2.remove(sheet2_index);
                self.persist("delete_sheet2_item")
            }
            _ => miss("delete_sheet2_item", sheet1_index, Some(sheet2_index)),
        }
    }

    /// Enter the day's delta for one sub-item; consumed by the next rollup
    pub fn set_yesterday_progress_report_of_sub_item(
        &mut self,
        sheet1_index: usize,
        sheet2_index: usize,
        report: YesterdayProgressReport,
    ) -> bool {
        let Some(sub) = self.sub_item_mut(sheet1_index, sheet2_index) else {
            return miss(
                "set_yesterday_progress_report_of_sub_item",
                sheet1_index,
                Some(sheet2_index),
            );
        };
        sub.yesterday_progress_report = Some(report);
        self.persist("set_yesterday_progress_report_of_sub_item")
    }

    // ------------------------------------------------------------------
    // Blockages
    // ------------------------------------------------------------------

    /// Append a blockage to the work item
    pub fn push_to_blockages(&mut self, sheet1_index: usize, blockage: Blockage) -> bool {
        let Some(item) = self.project.sheet1.get_mut(sheet1_index) else {
            return miss("push_to_blockages", sheet1_index, None);
        };
        item.blockages.push(blockage);
        self.persist("push_to_blockages")
    }

    /// Remove the blockage, whatever its status
    pub fn delete_blockage(&mut self, sheet1_index: usize, blockage_index: usize) -> bool {
        match self.project.sheet1.get_mut(sheet1_index) {
            Some(item) if blockage_index < item.blockages.len() => {
                item.blockages.remove(blockage_index);
                self.persist("delete_blockage")
            }
            _ => miss("delete_blockage", sheet1_index, Some(blockage_index)),
        }
    }

    /// PENDING -> RESOLVED with `blockageEndTime = now`
    ///
    /// Returns `false` for a missing blockage and for one that is not pending;
    /// a blockage is resolved at most once.
    pub fn set_blockage_resolved(&mut self, sheet1_index: usize, blockage_index: usize) -> bool {
        let now = self.clock.now();
        let Some(blockage) = self.blockage_mut(sheet1_index, blockage_index) else {
            return miss("set_blockage_resolved", sheet1_index, Some(blockage_index));
        };
        if !blockage.resolve(now) {
            debug!(
                sheet1_index,
                blockage_index,
                status = blockage.status.as_str(),
                "Blockage not pending, resolve skipped"
            );
            return false;
        }
        self.persist("set_blockage_resolved")
    }

    /// Same transition as [`set_blockage_resolved`](Self::set_blockage_resolved)
    pub fn close_blockage(&mut self, sheet1_index: usize, blockage_index: usize) -> bool {
        self.set_blockage_resolved(sheet1_index, blockage_index)
    }

    /// PENDING -> IGNORED, no end time recorded
    pub fn ignore_blockage(&mut self, sheet1_index: usize, blockage_index: usize) -> bool {
        let Some(blockage) = self.blockage_mut(sheet1_index, blockage_index) else {
            return miss("ignore_blockage", sheet1_index, Some(blockage_index));
        };
        if !blockage.ignore() {
            return false;
        }
        self.persist("ignore_blockage")
    }

    /// Blockages still PENDING; empty for a missing work item
    pub fn pending_blockages(&self, sheet1_index: usize) -> Vec<&Blockage> {
        self.sheet1_item(sheet1_index)
            .map(|item| item.pending_blockages().collect())
            .unwrap_or_default()
    }

    /// Blockages already RESOLVED; empty for a missing work item
    pub fn resolved_blockages(&self, sheet1_index: usize) -> Vec<&Blockage> {
        self.sheet1_item(sheet1_index)
            .map(|item| item.resolved_blockages().collect())
            .unwrap_or_default()
    }

    /// Every blockage on the work item, whatever its status
    pub fn sheet1_blockages(&self, sheet1_index: usize) -> &[Blockage] {
        self.sheet1_item(sheet1_index)
            .map(|item| item.blockages.as_slice())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Progress photos
    // ------------------------------------------------------------------

    /// Append one day's photo batch to the work item
    pub fn push_to_progress_photos(&mut self, sheet1_index: usize, entry: ProgressPhotoEntry) -> bool {
        let Some(item) = self.project.sheet1.get_mut(sheet1_index) else {
            return miss("push_to_progress_photos", sheet1_index, None);
        };
        item.yesterday_progress_photos.push(entry);
        self.persist("push_to_progress_photos")
    }

    /// Remove a photo batch. The stored blobs are left in place.
    pub fn delete_progress_photos(&mut self, sheet1_index: usize, photo_index: usize) -> bool {
        match self.project.sheet1.get_mut(sheet1_index) {
            Some(item) if photo_index < item.yesterday_progress_photos.len() => {
                item.yesterday_progress_photos.remove(photo_index);
                self.persist("delete_progress_photos")
            }
            _ => miss("delete_progress_photos", sheet1_index, Some(photo_index)),
        }
    }

    /// Replace the work item's whole photo list
    pub fn set_yesterday_progress_report_of_item(
        &mut self,
        sheet1_index: usize,
        photos: Vec<ProgressPhotoEntry>,
    ) -> bool {
        let Some(item) = self.project.sheet1.get_mut(sheet1_index) else {
            return miss("set_yesterday_progress_report_of_item", sheet1_index, None);
        };
        item.yesterday_progress_photos = photos;
        self.persist("set_yesterday_progress_report_of_item")
    }

    /// Empty the photo list on every work item, starting a new daily cycle
    pub fn reset_progress_photos(&mut self) {
        for item in &mut self.project.sheet1 {
            item.yesterday_progress_photos.clear();
        }
        self.persist("reset_progress_photos");
    }

    // ------------------------------------------------------------------
    // Report status, comments, rollup
    // ------------------------------------------------------------------

    /// Record the state of the latest daily report
    pub fn set_yesterday_report_status(&mut self, status: ReportStatus) {
        self.project.yesterday_report_status = status;
        self.persist("set_yesterday_report_status");
    }

    /// Append a review comment
    pub fn push_to_comments(&mut self, comment: Comment) {
        self.project.comments.push(comment);
        self.persist("push_to_comments");
    }

    /// Fold every pending daily delta into the cumulative totals
    ///
    /// Stamps start and end dates with the store clock and returns what changed,
    /// including any clamp that discarded part of a delta.
    pub fn update_supply_and_installations_from_yesterday_progress_report(&mut self) -> RollupReport {
        let now = self.clock.now();
        let report = rollup(&mut self.project, now);
        info!(
            folded = report.folded,
            truncations = report.truncations.len(),
            "Daily progress rolled up"
        );
        self.persist("rollup");
        report
    }

    /// Read-only progress aggregate of the current working copy
    pub fn summary(&self) -> ProjectProgressSummary {
        ProjectProgressSummary::from_project(&self.project)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn sub_item_mut(&mut self, sheet1_index: usize, sheet2_index: usize) -> Option<&mut SubItem> {
        self.project.sheet1.get_mut(sheet1_index)?.sheet2.get_mut(sheet2_index)
    }

    fn blockage_mut(&mut self, sheet1_index: usize, blockage_index: usize) -> Option<&mut Blockage> {
        self.project
            .sheet1
            .get_mut(sheet1_index)?
            .blockages
            .get_mut(blockage_index)
    }

    /// Mirror the working copy after an applied mutation. Always `true`.
    fn persist(&self, operation: &'static str) -> bool {
        debug!(operation, "Mutation applied");

        let result = serde_json::to_string(&self.project)
            .map_err(SbError::from)
            .and_then(|contents| self.mirror.save(&contents));
        if let Err(e) = result {
            warn!(
                operation,
                mirror = self.mirror.name(),
                error = %e,
                "Failed to write mirror, change kept in memory only"
            );
        }
        true
    }
}

fn miss(operation: &'static str, sheet1_index: usize, nested_index: Option<usize>) -> bool {
    debug!(operation, sheet1_index, ?nested_index, "Address not found, ignoring");
    false
}
