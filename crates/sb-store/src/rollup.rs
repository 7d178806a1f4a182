//! End-of-day rollup
//!
//! Folds every sub-item's pending daily delta into its cumulative totals and,
//! for connected sub-items, into the parent work item. Runs in three passes:
//!
//! 1. stamp `actualStartDate` on work items whose sub-items are all at 0% installed
//!    (state before this rollup)
//! 2. fold each pending `yesterdayProgressReport`, clamping totals to `totalQuantity`
//! 3. stamp `actualEndDate` on work items whose sub-items are all at 100% installed
//!
//! The rollup tolerates already-invalid input. Any clamp that discards a nonzero
//! excess is logged and returned as a [`Truncation`].

use chrono::{DateTime, Utc};
use sb_core::types::Quantity;
use sb_models::{ProjectVersion, SubItem, WorkItem, YesterdayProgressReport};
use serde::Serialize;
use tracing::{debug, warn};

/// Which cumulative total a clamp applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TotalField {
    TotalSupplied,
    TotalInstalled,
}

impl TotalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalSupplied => "totalSupplied",
            Self::TotalInstalled => "totalInstalled",
        }
    }
}

/// A clamp that discarded part of a delta
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Truncation {
    /// `sheet1[0]` or `sheet1[0].sheet2[1]`
    pub path: String,
    pub field: TotalField,
    /// Pre-clamp sum
    pub attempted: Quantity,
    /// Value actually stored (`totalQuantity`)
    pub capped: Quantity,
}

impl Truncation {
    pub fn discarded(&self) -> Quantity {
        self.attempted - self.capped
    }
}

/// What a rollup changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupReport {
    /// Sheet1 indices stamped with `actualStartDate`
    pub started: Vec<usize>,
    /// Sheet1 indices stamped with `actualEndDate`
    pub completed: Vec<usize>,
    /// Number of sub-item reports consumed
    pub folded: usize,
    pub truncations: Vec<Truncation>,
}

impl RollupReport {
    pub fn is_noop(&self) -> bool {
        self.started.is_empty() && self.completed.is_empty() && self.folded == 0
    }
}

/// Run the rollup over `project`, stamping dates with `now`
pub fn rollup(project: &mut ProjectVersion, now: DateTime<Utc>) -> RollupReport {
    let mut report = RollupReport::default();

    for (index, item) in project.sheet1.iter_mut().enumerate() {
        if all_sub_items(item, |sub| sub.installation_not_started()) {
            item.actual_start_date = Some(now);
            report.started.push(index);
        }
    }

    for (index, item) in project.sheet1.iter_mut().enumerate() {
        fold_work_item(index, item, &mut report);
    }

    for (index, item) in project.sheet1.iter_mut().enumerate() {
        if all_sub_items(item, |sub| sub.installation_complete()) {
            item.actual_end_date = Some(now);
            report.completed.push(index);
        }
    }

    debug!(
        folded = report.folded,
        started = report.started.len(),
        completed = report.completed.len(),
        truncations = report.truncations.len(),
        "Rollup applied"
    );
    report
}

/// Vacuously true for an empty `sheet2`: an item without a breakdown is stamped both ways
fn all_sub_items(item: &WorkItem, predicate: impl Fn(&SubItem) -> bool) -> bool {
    item.sheet2.iter().all(predicate)
}

fn fold_work_item(index: usize, item: &mut WorkItem, report: &mut RollupReport) {
    let item_path = format!("sheet1[{}]", index);

    for sub_index in 0..item.sheet2.len() {
        let sub = &mut item.sheet2[sub_index];
        let Some(delta) = sub.yesterday_progress_report.take() else {
            continue;
        };
        let sub_path = format!("{}.sheet2[{}]", item_path, sub_index);

        sub.total_supplied = add_clamped(
            sub.total_supplied,
            delta.yesterday_supplied,
            sub.total_quantity,
            &sub_path,
            TotalField::TotalSupplied,
            report,
        );
        sub.total_installed = add_clamped(
            sub.total_installed,
            delta.yesterday_installed,
            sub.total_quantity,
            &sub_path,
            TotalField::TotalInstalled,
            report,
        );
        sub.recompute_percentages();
        report.folded += 1;

        if sub.connect_with_sheet1_item {
            propagate(item, &item_path, delta, report);
        }
    }
}

fn propagate(item: &mut WorkItem, path: &str, delta: YesterdayProgressReport, report: &mut RollupReport) {
    item.total_supplied = add_clamped(
        item.total_supplied,
        delta.yesterday_supplied,
        item.total_quantity,
        path,
        TotalField::TotalSupplied,
        report,
    );
    item.total_installed = add_clamped(
        item.total_installed,
        delta.yesterday_installed,
        item.total_quantity,
        path,
        TotalField::TotalInstalled,
        report,
    );
    item.recompute_derived();
}

fn add_clamped(
    current: Quantity,
    delta: Quantity,
    total_quantity: Quantity,
    path: &str,
    field: TotalField,
    report: &mut RollupReport,
) -> Quantity {
    let attempted = current + delta;
    if attempted <= total_quantity {
        return attempted;
    }

    warn!(
        path,
        field = field.as_str(),
        attempted,
        capped = total_quantity,
        "Rollup clamped total to totalQuantity, excess discarded"
    );
    report.truncations.push(Truncation {
        path: path.to_string(),
        field,
        attempted,
        capped: total_quantity,
    });
    total_quantity
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 18, 0, 0).unwrap()
    }

    fn project_with(item: WorkItem) -> ProjectVersion {
        let mut project = ProjectVersion::new("Tower A");
        project.sheet1.push(item);
        project
    }

    fn with_report(sub: SubItem, supplied: Quantity, installed: Quantity) -> SubItem {
        SubItem {
            yesterday_progress_report: Some(YesterdayProgressReport::new(supplied, installed)),
            ..sub
        }
    }

    #[test]
    fn test_fold_consumes_report() {
        let sub = with_report(SubItem::new("Clear glass", "sqm", 40.0), 10.0, 4.0);
        let mut project = project_with(WorkItem::new("Glazing", "sqm", 40.0).with_sub_items(vec![sub]));

        let report = rollup(&mut project, now());
        let sub = &project.sheet1[0].sheet2[0];

        assert_eq!(report.folded, 1);
        assert!(report.truncations.is_empty());
        assert_eq!(sub.total_supplied, 10.0);
        assert_eq!(sub.total_installed, 4.0);
        assert_eq!(sub.percent_supplied, 25.0);
        assert_eq!(sub.percent_installed, 10.0);
        assert!(sub.yesterday_progress_report.is_none());
        // Not connected: parent untouched
        assert_eq!(project.sheet1[0].total_supplied, 0.0);
    }

    #[test]
    fn test_clamp_is_reported() {
        let sub = with_report(
            SubItem::new("Clear glass", "sqm", 100.0).with_progress(50.0, 40.0).connected(),
            60.0,
            10.0,
        );
        let mut project = project_with(
            WorkItem::new("Glazing", "sqm", 100.0)
                .with_progress(50.0, 40.0)
                .with_sub_items(vec![sub]),
        );

        let report = rollup(&mut project, now());

        assert_eq!(
            report.truncations,
            vec![
                Truncation {
                    path: "sheet1[0].sheet2[0]".into(),
                    field: TotalField::TotalSupplied,
                    attempted: 110.0,
                    capped: 100.0,
                },
                Truncation {
                    path: "sheet1[0]".into(),
                    field: TotalField::TotalSupplied,
                    attempted: 110.0,
                    capped: 100.0,
                },
            ]
        );
        assert_eq!(report.truncations[0].discarded(), 10.0);
    }

    #[test]
    fn test_zero_quantity_sub_item() {
        let sub = with_report(SubItem::new("Sealant", "m", 0.0), 0.0, 0.0);
        let mut project = project_with(WorkItem::new("Sealing", "m", 0.0).with_sub_items(vec![sub]));

        rollup(&mut project, now());
        let sub = &project.sheet1[0].sheet2[0];
        assert_eq!(sub.percent_supplied, 0.0);
        assert_eq!(sub.percent_installed, 0.0);
        assert!(sub.percent_installed.is_finite());
    }

    #[test]
    fn test_items_without_sub_items_are_stamped_both_ways() {
        let mut project = project_with(WorkItem::new("Scaffolding", "lot", 1.0));

        let report = rollup(&mut project, now());
        assert_eq!(report.started, vec![0]);
        assert_eq!(report.completed, vec![0]);
        assert_eq!(report.folded, 0);
        assert_eq!(project.sheet1[0].actual_start_date, Some(now()));
        assert_eq!(project.sheet1[0].actual_end_date, Some(now()));

        // Re-stamped on the next rollup
        let later = now() + chrono::Duration::days(1);
        rollup(&mut project, later);
        assert_eq!(project.sheet1[0].actual_start_date, Some(later));
        assert_eq!(project.sheet1[0].actual_end_date, Some(later));
    }

    #[test]
    fn test_start_stamp_uses_pre_fold_state() {
        // All at 0% before the fold, even though the fold moves it to 50%
        let sub = with_report(SubItem::new("Brackets", "pcs", 10.0), 5.0, 5.0);
        let mut project = project_with(WorkItem::new("Anchoring", "pcs", 10.0).with_sub_items(vec![sub]));

        let report = rollup(&mut project, now());
        assert_eq!(report.started, vec![0]);
        assert_eq!(project.sheet1[0].actual_start_date, Some(now()));
        assert_eq!(project.sheet1[0].sheet2[0].percent_installed, 50.0);
    }
}
