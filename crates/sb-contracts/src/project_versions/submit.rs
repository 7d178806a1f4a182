//! Submit contract for project versions

use sb_core::error::ValidationErrors;
use sb_models::ProjectVersion;

use super::base::ProjectVersionBaseContract;
use crate::base::{Contract, ValidationResult};

/// Contract for submitting a daily report candidate
#[derive(Debug, Default, Clone, Copy)]
pub struct SubmitProjectVersionContract {
    base: ProjectVersionBaseContract,
}

impl SubmitProjectVersionContract {
    pub fn new() -> Self {
        Self {
            base: ProjectVersionBaseContract::new(),
        }
    }

    fn validate_manager(&self, project: &ProjectVersion, errors: &mut ValidationErrors) {
        let assigned = project
            .assigned_project_manager_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if assigned.is_empty() {
            errors.add("assignedProjectManagerId", "can't be blank");
        }
    }

    fn validate_has_work_items(&self, project: &ProjectVersion, errors: &mut ValidationErrors) {
        if project.sheet1.is_empty() {
            errors.add_base("A daily report needs at least one work item");
        }
    }

    /// Get the base contract
    pub fn base(&self) -> &ProjectVersionBaseContract {
        &self.base
    }
}

impl Contract<ProjectVersion> for SubmitProjectVersionContract {
    fn validate(&self, entity: &ProjectVersion) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if let Err(base_errors) = self.base.validate(entity) {
            errors.merge(base_errors);
        }

        self.validate_manager(entity, &mut errors);
        self.validate_has_work_items(entity, &mut errors);

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_models::WorkItem;

    fn candidate() -> ProjectVersion {
        let mut project = ProjectVersion::new("Tower A Facade");
        project.assigned_project_manager_id = Some("pm-42".into());
        project.sheet1.push(WorkItem::new("Glazing", "sqm", 10.0));
        project
    }

    #[test]
    fn test_valid_candidate() {
        let contract = SubmitProjectVersionContract::new();
        assert!(contract.validate(&candidate()).is_ok());
    }

    #[test]
    fn test_requires_manager() {
        let contract = SubmitProjectVersionContract::new();
        let mut project = candidate();
        project.assigned_project_manager_id = Some("  ".into());

        let errors = contract.validate(&project).unwrap_err();
        assert!(errors.has_error("assignedProjectManagerId"));

        project.assigned_project_manager_id = None;
        assert!(contract.validate(&project).unwrap_err().has_error("assignedProjectManagerId"));
    }

    #[test]
    fn test_requires_work_items() {
        let contract = SubmitProjectVersionContract::new();
        let mut project = candidate();
        project.sheet1.clear();

        let errors = contract.validate(&project).unwrap_err();
        assert_eq!(errors.base_errors.len(), 1);
    }

    #[test]
    fn test_includes_base_errors() {
        let contract = SubmitProjectVersionContract::new();
        let mut project = candidate();
        project.sheet1[0].total_supplied = 11.0;

        let errors = contract.validate(&project).unwrap_err();
        assert!(errors.has_error("sheet1[0].totalSupplied"));
        assert!(!errors.has_error("assignedProjectManagerId"));
    }
}
