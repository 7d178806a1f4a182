//! Bill-of-quantities lines
//!
//! `WorkItem` is a `sheet1` line ("Curtain wall glazing - Tower A"); its `sheet2`
//! holds `SubItem`s that break it down further. Percentages and yet-to-supply/install
//! figures are derived from the totals and recomputed, never edited directly.

use chrono::{DateTime, Utc};
use sb_core::types::{percent_of, Quantity};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::blockage::Blockage;
use crate::file_ref::PhotoRef;

/// A day's photo batch for a work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPhotoEntry {
    #[validate]
    #[serde(default)]
    pub photos: Vec<PhotoRef>,

    #[serde(default)]
    pub description: String,
}

impl ProgressPhotoEntry {
    pub fn new(photos: Vec<PhotoRef>, description: impl Into<String>) -> Self {
        Self {
            photos,
            description: description.into(),
        }
    }
}

/// The day's incremental input for one sub-item, consumed by the rollup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct YesterdayProgressReport {
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub yesterday_supplied: f64,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub yesterday_installed: f64,
}

impl YesterdayProgressReport {
    pub fn new(yesterday_supplied: Quantity, yesterday_installed: Quantity) -> Self {
        Self {
            yesterday_supplied,
            yesterday_installed,
        }
    }
}

/// A `sheet2` line: finer breakdown of a work item, tracked independently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubItem {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub unit: String,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub total_quantity: f64,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub total_supplied: f64,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub total_installed: f64,

    #[serde(default)]
    pub percent_supplied: f64,

    #[serde(default)]
    pub percent_installed: f64,

    /// When true, this sub-item's daily deltas also roll up into the parent's totals
    #[serde(default)]
    pub connect_with_sheet1_item: bool,

    #[validate]
    #[serde(default)]
    pub yesterday_progress_report: Option<YesterdayProgressReport>,
}

impl SubItem {
    pub fn new(description: impl Into<String>, unit: impl Into<String>, total_quantity: Quantity) -> Self {
        Self {
            description: description.into(),
            unit: unit.into(),
            total_quantity,
            ..Default::default()
        }
    }

    pub fn connected(mut self) -> Self {
        self.connect_with_sheet1_item = true;
        self
    }

    pub fn with_progress(mut self, total_supplied: Quantity, total_installed: Quantity) -> Self {
        self.total_supplied = total_supplied;
        self.total_installed = total_installed;
        self.recompute_percentages();
        self
    }

    pub fn recompute_percentages(&mut self) {
        self.percent_supplied = percent_of(self.total_supplied, self.total_quantity);
        self.percent_installed = percent_of(self.total_installed, self.total_quantity);
    }

    pub fn has_pending_report(&self) -> bool {
        self.yesterday_progress_report.is_some()
    }

    pub fn installation_not_started(&self) -> bool {
        self.percent_installed == 0.0
    }

    pub fn installation_complete(&self) -> bool {
        self.percent_installed == 100.0
    }
}

/// A `sheet1` line: one scope of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub unit: String,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub total_quantity: f64,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub total_supplied: f64,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub total_installed: f64,

    #[serde(default)]
    pub yet_to_supply: Quantity,

    #[serde(default)]
    pub yet_to_install: Quantity,

    #[serde(default)]
    pub percent_supplied: f64,

    #[serde(default)]
    pub percent_installed: f64,

    #[serde(default)]
    pub planned_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub planned_end_date: Option<DateTime<Utc>>,

    /// Stamped by the rollup the first day work begins
    #[serde(default)]
    pub actual_start_date: Option<DateTime<Utc>>,
    /// Stamped by the rollup once every sub-item is fully installed
    #[serde(default)]
    pub actual_end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub revised_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revised_end_date: Option<DateTime<Utc>>,

    #[validate]
    #[serde(default)]
    pub yesterday_progress_photos: Vec<ProgressPhotoEntry>,

    #[validate]
    #[serde(default)]
    pub blockages: Vec<Blockage>,

    #[validate]
    #[serde(default)]
    pub sheet2: Vec<SubItem>,
}

impl WorkItem {
    pub fn new(description: impl Into<String>, unit: impl Into<String>, total_quantity: Quantity) -> Self {
        let mut item = Self {
            description: description.into(),
            unit: unit.into(),
            total_quantity,
            ..Default::default()
        };
        item.recompute_derived();
        item
    }

    pub fn with_progress(mut self, total_supplied: Quantity, total_installed: Quantity) -> Self {
        self.total_supplied = total_supplied;
        self.total_installed = total_installed;
        self.recompute_derived();
        self
    }

    pub fn with_sub_items(mut self, sheet2: Vec<SubItem>) -> Self {
        self.sheet2 = sheet2;
        self
    }

    /// Recompute percentages and the yet-to-supply/install remainders from the totals
    pub fn recompute_derived(&mut self) {
        self.percent_supplied = percent_of(self.total_supplied, self.total_quantity);
        self.percent_installed = percent_of(self.total_installed, self.total_quantity);
        self.yet_to_supply = self.total_quantity - self.total_supplied;
        self.yet_to_install = self.total_quantity - self.total_installed;
    }

    pub fn pending_blockages(&self) -> impl Iterator<Item = &Blockage> {
        self.blockages.iter().filter(|b| b.is_pending())
    }

    pub fn resolved_blockages(&self) -> impl Iterator<Item = &Blockage> {
        self.blockages.iter().filter(|b| b.is_resolved())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockage::{BlockageSeverity, BlockageType};

    #[test]
    fn test_work_item_derived_fields() {
        let item = WorkItem::new("Curtain wall glazing - Tower A", "sqm", 200.0).with_progress(50.0, 25.0);
        assert_eq!(item.percent_supplied, 25.0);
        assert_eq!(item.percent_installed, 12.5);
        assert_eq!(item.yet_to_supply, 150.0);
        assert_eq!(item.yet_to_install, 175.0);
    }

    #[test]
    fn test_zero_quantity_percentages() {
        let sub = SubItem::new("Spandrel glass", "sqm", 0.0).with_progress(0.0, 0.0);
        assert_eq!(sub.percent_supplied, 0.0);
        assert_eq!(sub.percent_installed, 0.0);
        assert!(sub.installation_not_started());
    }

    #[test]
    fn test_blockage_filters() {
        let now = chrono::Utc::now();
        let mut item = WorkItem::new("Cladding", "sqm", 10.0);
        item.blockages.push(Blockage::new_pending(
            BlockageType::Internal,
            "Crane",
            BlockageSeverity::Low,
            "Crane down",
            now,
        ));
        let mut resolved = Blockage::new_pending(
            BlockageType::Client,
            "Access",
            BlockageSeverity::Medium,
            "Site closed",
            now,
        );
        resolved.resolve(now);
        item.blockages.push(resolved);

        assert_eq!(item.pending_blockages().count(), 1);
        assert_eq!(item.resolved_blockages().count(), 1);
    }

    #[test]
    fn test_deserialize_partial_sub_item() {
        let sub: SubItem = serde_json::from_str(
            r#"{"totalQuantity": 10, "connectWithSheet1Item": true,
                "yesterdayProgressReport": {"yesterdaySupplied": 2}}"#,
        )
        .unwrap();
        assert!(sub.connect_with_sheet1_item);
        assert_eq!(
            sub.yesterday_progress_report,
            Some(YesterdayProgressReport::new(2.0, 0.0))
        );
        assert_eq!(sub.total_supplied, 0.0);
    }
}
