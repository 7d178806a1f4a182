//! Blockage model
//!
//! A recorded obstruction preventing progress on a work item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::file_ref::PhotoRef;

/// Who caused the blockage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockageType {
    Client,
    #[default]
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockageSeverity {
    Low,
    #[default]
    Medium,
    High,
}

/// Blockage lifecycle state
///
/// `Pending` is the only state with outgoing transitions: to `Resolved`
/// (stamps the end time) or to `Ignored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockageStatus {
    #[default]
    Pending,
    Resolved,
    Ignored,
}

impl BlockageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Resolved => "RESOLVED",
            Self::Ignored => "IGNORED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Blockage {
    #[serde(rename = "type")]
    pub blockage_type: BlockageType,

    /// Free-text category ("Material delay", "Drawing approval", ...)
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub severity: BlockageSeverity,

    #[serde(default)]
    pub status: BlockageStatus,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub weather_report: String,

    /// Crew size affected on site
    #[serde(default)]
    pub man_power: u32,

    pub blockage_start_time: DateTime<Utc>,

    /// Set exactly once, when the blockage is resolved
    #[serde(default)]
    pub blockage_end_time: Option<DateTime<Utc>>,

    #[validate]
    #[serde(default)]
    pub blockage_photos: Vec<PhotoRef>,
}

impl Blockage {
    /// A freshly reported blockage
    pub fn new_pending(
        blockage_type: BlockageType,
        category: impl Into<String>,
        severity: BlockageSeverity,
        description: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            blockage_type,
            category: category.into(),
            severity,
            status: BlockageStatus::Pending,
            description: description.into(),
            weather_report: String::new(),
            man_power: 0,
            blockage_start_time: started_at,
            blockage_end_time: None,
            blockage_photos: Vec::new(),
        }
    }

    pub fn with_photos(mut self, photos: Vec<PhotoRef>) -> Self {
        self.blockage_photos = photos;
        self
    }

    pub fn with_site_conditions(mut self, weather_report: impl Into<String>, man_power: u32) -> Self {
        self.weather_report = weather_report.into();
        self.man_power = man_power;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == BlockageStatus::Pending
    }

    pub fn is_resolved(&self) -> bool {
        self.status == BlockageStatus::Resolved
    }

    /// PENDING -> RESOLVED, stamping `blockage_end_time`.
    ///
    /// Returns `false` and changes nothing when the blockage is not pending.
    pub fn resolve(&mut self, at: DateTime<Utc>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = BlockageStatus::Resolved;
        self.blockage_end_time = Some(at);
        true
    }

    /// PENDING -> IGNORED. No end time is recorded.
    pub fn ignore(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = BlockageStatus::Ignored;
        true
    }

    /// How long the blockage has been (or was) open
    pub fn open_duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.blockage_end_time.unwrap_or(now) - self.blockage_start_time
    }
}
