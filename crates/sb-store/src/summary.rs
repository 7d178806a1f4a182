//! Read-only progress aggregate for dashboards

use sb_core::types::{display_percent, round2};
use sb_models::{BlockageSeverity, ProjectVersion, ReportStatus, WorkItem};
use serde::Serialize;

/// One sheet1 line as shown on a dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemProgress {
    pub index: usize,
    pub description: String,
    pub unit: String,
    pub percent_supplied: f64,
    pub percent_installed: f64,
    pub pending_blockages: usize,
    pub started: bool,
    pub completed: bool,
}

impl WorkItemProgress {
    fn from_item(index: usize, item: &WorkItem) -> Self {
        Self {
            index,
            description: item.description.clone(),
            unit: item.unit.clone(),
            percent_supplied: display_percent(item.percent_supplied),
            percent_installed: display_percent(item.percent_installed),
            pending_blockages: item.pending_blockages().count(),
            started: item.actual_start_date.is_some() || item.percent_installed > 0.0,
            completed: item.actual_end_date.is_some() || item.percent_installed >= 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgressSummary {
    pub project_id: Option<String>,
    pub name: String,
    pub items: Vec<WorkItemProgress>,
    /// Unweighted mean over work items, 0 when there are none
    pub mean_percent_supplied: f64,
    pub mean_percent_installed: f64,
    pub items_started: usize,
    pub items_completed: usize,
    pub pending_blockages: usize,
    pub high_severity_pending_blockages: usize,
    pub report_status: ReportStatus,
}

impl ProjectProgressSummary {
    pub fn from_project(project: &ProjectVersion) -> Self {
        let items: Vec<WorkItemProgress> = project
            .sheet1
            .iter()
            .enumerate()
            .map(|(index, item)| WorkItemProgress::from_item(index, item))
            .collect();

        let high_severity_pending_blockages = project
            .sheet1
            .iter()
            .flat_map(|item| item.pending_blockages())
            .filter(|b| b.severity == BlockageSeverity::High)
            .count();

        Self {
            project_id: project.project_id.clone(),
            name: project.name.clone(),
            mean_percent_supplied: mean(items.iter().map(|i| i.percent_supplied)),
            mean_percent_installed: mean(items.iter().map(|i| i.percent_installed)),
            items_started: items.iter().filter(|i| i.started).count(),
            items_completed: items.iter().filter(|i| i.completed).count(),
            pending_blockages: items.iter().map(|i| i.pending_blockages).sum(),
            high_severity_pending_blockages,
            report_status: project.yesterday_report_status,
            items,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}
