//! Base contract for project versions
//!
//! Field rules plus the cross-field invariants every stored version must hold:
//! quantities never exceed totals, the estimated end date is not before the
//! start date, and blockage end times exist exactly for resolved blockages.

use sb_core::error::ValidationErrors;
use sb_models::{Blockage, BlockageStatus, ProjectVersion, SubItem, WorkItem};

use crate::base::{field_rules, Contract, ValidationResult};

const EXCEEDS_TOTAL: &str = "must not exceed totalQuantity";

/// Base contract for project versions with the shared validations
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectVersionBaseContract;

impl ProjectVersionBaseContract {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_name(&self, name: &str, errors: &mut ValidationErrors) {
        if name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
    }

    /// `estimatedEndDate >= projectStartDate`, comparing calendar dates only
    pub fn validate_schedule(&self, project: &ProjectVersion, errors: &mut ValidationErrors) {
        if let (Some(start), Some(end)) = (project.project_start_date, project.estimated_end_date) {
            if end.date_naive() < start.date_naive() {
                errors.add("estimatedEndDate", "must not be before projectStartDate");
            }
        }
    }

    pub fn validate_meeting_link(&self, link: &str, errors: &mut ValidationErrors) {
        if link.trim().is_empty() {
            return;
        }
        if url::Url::parse(link.trim()).is_err() {
            errors.add("meetingLink", "is not a valid URL");
        }
    }

    pub fn validate_work_item(&self, path: &str, item: &WorkItem, errors: &mut ValidationErrors) {
        if item.total_supplied > item.total_quantity {
            errors.add(format!("{}.totalSupplied", path), EXCEEDS_TOTAL);
        }
        if item.total_installed > item.total_quantity {
            errors.add(format!("{}.totalInstalled", path), EXCEEDS_TOTAL);
        }

        for (index, sub) in item.sheet2.iter().enumerate() {
            self.validate_sub_item(&format!("{}.sheet2[{}]", path, index), sub, errors);
        }
        for (index, blockage) in item.blockages.iter().enumerate() {
            self.validate_blockage(&format!("{}.blockages[{}]", path, index), blockage, errors);
        }
    }

    pub fn validate_sub_item(&self, path: &str, sub: &SubItem, errors: &mut ValidationErrors) {
        if sub.total_supplied > sub.total_quantity {
            errors.add(format!("{}.totalSupplied", path), EXCEEDS_TOTAL);
        }
        if sub.total_installed > sub.total_quantity {
            errors.add(format!("{}.totalInstalled", path), EXCEEDS_TOTAL);
        }

        if let Some(report) = &sub.yesterday_progress_report {
            if sub.total_supplied + report.yesterday_supplied > sub.total_quantity {
                errors.add(
                    format!("{}.yesterdayProgressReport.yesterdaySupplied", path),
                    "would raise totalSupplied above totalQuantity",
                );
            }
            if sub.total_installed + report.yesterday_installed > sub.total_quantity {
                errors.add(
                    format!("{}.yesterdayProgressReport.yesterdayInstalled", path),
                    "would raise totalInstalled above totalQuantity",
                );
            }
        }
    }

    pub fn validate_blockage(&self, path: &str, blockage: &Blockage, errors: &mut ValidationErrors) {
        let end_path = format!("{}.blockageEndTime", path);
        match (blockage.status, blockage.blockage_end_time) {
            (BlockageStatus::Resolved, None) => {
                errors.add(end_path, "can't be blank for a resolved blockage");
            }
            (BlockageStatus::Resolved, Some(end)) if end < blockage.blockage_start_time => {
                errors.add(end_path, "must not be before blockageStartTime");
            }
            (BlockageStatus::Pending | BlockageStatus::Ignored, Some(_)) => {
                errors.add(end_path, "must be empty until the blockage is resolved");
            }
            _ => {}
        }
    }

    /// Collect every violation without stopping at the first
    pub fn collect(&self, project: &ProjectVersion) -> ValidationErrors {
        let mut errors = field_rules(project);

        self.validate_name(&project.name, &mut errors);
        self.validate_schedule(project, &mut errors);
        self.validate_meeting_link(&project.meeting_link, &mut errors);
        for (index, item) in project.sheet1.iter().enumerate() {
            self.validate_work_item(&format!("sheet1[{}]", index), item, &mut errors);
        }

        errors
    }
}

impl Contract<ProjectVersion> for ProjectVersionBaseContract {
    fn validate(&self, entity: &ProjectVersion) -> ValidationResult {
        self.collect(entity).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sb_models::{BlockageSeverity, BlockageType, YesterdayProgressReport};

    fn valid_project() -> ProjectVersion {
        let mut project = ProjectVersion::new("Tower A Facade");
        project.project_start_date = Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        project.estimated_end_date = Some(Utc.with_ymd_and_hms(2024, 9, 30, 9, 0, 0).unwrap());
        project.meeting_link = "https://meet.example.com/tower-a".into();
        project.sheet1.push(
            WorkItem::new("Curtain wall glazing", "sqm", 100.0)
                .with_progress(50.0, 40.0)
                .with_sub_items(vec![sb_models::SubItem::new("Clear glass", "sqm", 100.0)
                    .with_progress(50.0, 40.0)
                    .connected()]),
        );
        project
    }

    #[test]
    fn test_valid_project() {
        let contract = ProjectVersionBaseContract::new();
        assert!(contract.validate(&valid_project()).is_ok());
    }

    #[test]
    fn test_blank_name() {
        let contract = ProjectVersionBaseContract::new();
        let mut project = valid_project();
        project.name = "   ".into();

        let result = contract.validate(&project);
        assert!(result.unwrap_err().has_error("name"));
    }

    #[test]
    fn test_quantities_exceeding_totals() {
        let contract = ProjectVersionBaseContract::new();
        let mut project = valid_project();
        project.sheet1[0].total_supplied = 120.0;
        project.sheet1[0].sheet2[0].total_installed = 101.0;

        let errors = contract.validate(&project).unwrap_err();
        assert!(errors.has_error("sheet1[0].totalSupplied"));
        assert!(!errors.has_error("sheet1[0].totalInstalled"));
        assert!(errors.has_error("sheet1[0].sheet2[0].totalInstalled"));
    }

    #[test]
    fn test_pending_report_sums() {
        let contract = ProjectVersionBaseContract::new();
        let mut project = valid_project();
        project.sheet1[0].sheet2[0].yesterday_progress_report = Some(YesterdayProgressReport::new(60.0, 10.0));

        let errors = contract.validate(&project).unwrap_err();
        assert!(errors.has_error("sheet1[0].sheet2[0].yesterdayProgressReport.yesterdaySupplied"));
        assert!(!errors.has_error("sheet1[0].sheet2[0].yesterdayProgressReport.yesterdayInstalled"));
    }

    #[test]
    fn test_report_exactly_reaching_total_is_valid() {
        let contract = ProjectVersionBaseContract::new();
        let mut project = valid_project();
        project.sheet1[0].sheet2[0].yesterday_progress_report = Some(YesterdayProgressReport::new(50.0, 60.0));
        assert!(contract.validate(&project).is_ok());
    }

    #[test]
    fn test_end_date_compares_dates_only() {
        let contract = ProjectVersionBaseContract::new();
        let mut project = valid_project();

        // Same day, earlier hour: allowed
        project.project_start_date = Some(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap());
        project.estimated_end_date = Some(Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap());
        assert!(contract.validate(&project).is_ok());

        project.estimated_end_date = Some(Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap());
        assert!(contract.validate(&project).unwrap_err().has_error("estimatedEndDate"));
    }

    #[test]
    fn test_blockage_end_time_rules() {
        let contract = ProjectVersionBaseContract::new();
        let start = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
        let mut project = valid_project();

        let mut pending_with_end =
            Blockage::new_pending(BlockageType::Client, "Access", BlockageSeverity::High, "Gate locked", start);
        pending_with_end.blockage_end_time = Some(start);

        let mut resolved_without_end =
            Blockage::new_pending(BlockageType::Internal, "Crane", BlockageSeverity::Low, "Crane down", start);
        resolved_without_end.status = BlockageStatus::Resolved;

        let mut resolved_ok =
            Blockage::new_pending(BlockageType::Internal, "Crane", BlockageSeverity::Low, "Crane down", start);
        resolved_ok.resolve(start + chrono::Duration::hours(3));

        project.sheet1[0].blockages = vec![pending_with_end, resolved_without_end, resolved_ok];

        let errors = contract.validate(&project).unwrap_err();
        assert!(errors.has_error("sheet1[0].blockages[0].blockageEndTime"));
        assert!(errors.has_error("sheet1[0].blockages[1].blockageEndTime"));
        assert!(!errors.has_error("sheet1[0].blockages[2].blockageEndTime"));
    }

    #[test]
    fn test_invalid_meeting_link() {
        let contract = ProjectVersionBaseContract::new();
        let mut project = valid_project();
        project.meeting_link = "meet at the site office".into();
        assert!(contract.validate(&project).unwrap_err().has_error("meetingLink"));
    }

    #[test]
    fn test_reports_every_violation() {
        let contract = ProjectVersionBaseContract::new();
        let mut project = valid_project();
        project.name.clear();
        project.client.email = Some("nope".into());
        project.sheet1[0].total_installed = 500.0;
        project.estimated_end_date = Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());

        let errors = contract.validate(&project).unwrap_err();
        let paths: Vec<&str> = errors.paths().collect();
        assert_eq!(
            paths,
            vec!["client.email", "estimatedEndDate", "name", "sheet1[0].totalInstalled"]
        );
    }
}
