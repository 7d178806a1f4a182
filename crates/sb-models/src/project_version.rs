//! Project version model
//!
//! A versioned snapshot of one construction project's plan and current status.
//! Created by a planning-role user and handed to a Project Manager, whose daily
//! workflow mutates the working copy before submitting it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::file_ref::FileRef;
use crate::work_item::WorkItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    NotStarted,
    InProgress,
    OnHold,
    Completed,
}

/// State of the most recent daily report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    NotCreated,
    Pending,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotCreated => "NOT_CREATED",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client identity, contact and billing details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub contact_person: String,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub billing_address: Option<String>,
    /// Tax registration number used on invoices
    #[serde(default)]
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteLocation {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(comment: impl Into<String>, author: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            comment: comment.into(),
            author: author.into(),
            created_at,
        }
    }
}

/// The working-copy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersion {
    /// Assigned by the persistence backend on first save
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub assigned_project_manager_id: Option<String>,

    #[validate(length(max = 255))]
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub project_type: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub priority: ProjectPriority,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default)]
    pub description: String,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub budget: f64,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub floor_area: f64,

    #[serde(default)]
    pub project_start_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub estimated_end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub total_working_days: u32,

    #[serde(default)]
    pub completed_working_days: u32,

    /// Free-text site instructions from the planning team
    #[serde(default)]
    pub instructions: String,

    #[serde(default)]
    pub meeting_link: String,

    #[validate]
    #[serde(default)]
    pub documents: Vec<FileRef>,

    #[validate]
    #[serde(default)]
    pub client: Client,

    #[serde(default)]
    pub site_location: SiteLocation,

    #[validate]
    #[serde(default)]
    pub sheet1: Vec<WorkItem>,

    #[serde(default)]
    pub yesterday_report_status: ReportStatus,

    #[serde(default)]
    pub yesterday_report_created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl ProjectVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.project_id.is_some()
    }

    /// Whether the document holds anything (a reset store holds an empty one)
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work_item::SubItem;

    #[test]
    fn test_default_is_empty() {
        let project = ProjectVersion::default();
        assert!(project.is_empty());
        assert!(!project.is_persisted());
        assert_eq!(project.yesterday_report_status, ReportStatus::NotCreated);

        assert!(!ProjectVersion::new("Tower A").is_empty());
    }

    #[test]
    fn test_wire_names() {
        let mut project = ProjectVersion::new("Tower A");
        project.project_type = "Commercial".into();
        project.sheet1.push(
            WorkItem::new("Glazing", "sqm", 10.0).with_sub_items(vec![SubItem::new("Clear", "sqm", 5.0).connected()]),
        );

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["type"], "Commercial");
        assert_eq!(json["yesterdayReportStatus"], "NOT_CREATED");
        assert_eq!(json["sheet1"][0]["sheet2"][0]["connectWithSheet1Item"], true);
        assert!(json["projectId"].is_null());
    }

    #[test]
    fn test_round_trip_minimal_document() {
        let project: ProjectVersion =
            serde_json::from_str(r#"{"name": "Tower B", "yesterdayReportStatus": "REJECTED"}"#).unwrap();
        assert_eq!(project.name, "Tower B");
        assert_eq!(project.yesterday_report_status, ReportStatus::Rejected);
        assert!(project.sheet1.is_empty());
    }
}
