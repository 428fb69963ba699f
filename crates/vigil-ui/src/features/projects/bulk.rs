//! Bulk permission-template orchestration over the current selection.
//!
//! # Design
//! - Only non-managed projects receive a template; managed ones are counted
//!   so the dialog can explain why they are skipped.
//! - Portfolios and applications never take part in permission bulk actions.

use vigil_api_models::{Project, ProjectKey, Qualifier};

use crate::i18n::TranslationBundle;

/// Selection split by eligibility for permission templates.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BulkPartition {
    /// Locally managed projects the template applies to.
    pub local: Vec<ProjectKey>,
    /// Projects governed by an external provisioning system.
    pub managed: Vec<ProjectKey>,
    /// Selected rows that are not projects.
    pub ineligible: Vec<ProjectKey>,
}

/// Explanation shown in the bulk-apply dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulkNotice {
    /// Nothing eligible and nothing managed.
    Empty,
    /// Every selected project receives the template.
    ApplyToSelected {
        /// Projects receiving the template.
        count: usize,
    },
    /// Every selected project is managed; nothing can be applied.
    OnlyManaged,
    /// Some projects receive the template, the managed ones are skipped.
    Mixed {
        /// Projects receiving the template.
        local: usize,
        /// Managed projects skipped.
        managed: usize,
    },
}

/// Split selected rows into local, managed and ineligible groups.
#[must_use]
pub fn partition<'a, I>(selected: I) -> BulkPartition
where
    I: IntoIterator<Item = &'a Project>,
{
    let mut split = BulkPartition::default();
    for project in selected {
        if project.qualifier != Qualifier::Project {
            split.ineligible.push(project.key.clone());
        } else if project.managed {
            split.managed.push(project.key.clone());
        } else {
            split.local.push(project.key.clone());
        }
    }
    split
}

impl BulkPartition {
    /// A template can be applied iff at least one local project is selected.
    #[must_use]
    pub fn can_apply(&self) -> bool {
        !self.local.is_empty()
    }

    /// Which explanation the dialog shows.
    #[must_use]
    pub fn notice(&self) -> BulkNotice {
        match (self.local.len(), self.managed.len()) {
            (0, 0) => BulkNotice::Empty,
            (0, _) => BulkNotice::OnlyManaged,
            (count, 0) => BulkNotice::ApplyToSelected { count },
            (local, managed) => BulkNotice::Mixed { local, managed },
        }
    }

    /// Localised lines for the dialog body.
    #[must_use]
    pub fn messages(&self, bundle: &TranslationBundle) -> Vec<String> {
        const SELECTED: &str = "permission_templates.bulk_apply_permission_template.apply_to_selected";
        const MANAGED: &str =
            "permission_templates.bulk_apply_permission_template.apply_to_github_projects";
        const ONLY_MANAGED: &str =
            "permission_templates.bulk_apply_permission_template.apply_to_only_github_projects";
        match self.notice() {
            BulkNotice::Empty => Vec::new(),
            BulkNotice::ApplyToSelected { count } => vec![bundle.count_text(SELECTED, count)],
            BulkNotice::OnlyManaged => vec![bundle.text(ONLY_MANAGED, ONLY_MANAGED)],
            BulkNotice::Mixed { local, managed } => vec![
                bundle.count_text(SELECTED, local),
                bundle.count_text(MANAGED, managed),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocaleCode;
    use vigil_api_models::Visibility;

    fn project(key: &str, managed: bool, qualifier: Qualifier) -> Project {
        Project {
            key: ProjectKey::new(key),
            name: key.to_string(),
            qualifier,
            visibility: Visibility::Public,
            managed,
            last_analysis_date: None,
        }
    }

    #[test]
    fn all_managed_selection_cannot_apply() {
        let rows: Vec<Project> = (0..11)
            .map(|i| project(&i.to_string(), true, Qualifier::Project))
            .collect();
        let split = partition(&rows);
        assert!(!split.can_apply());
        assert_eq!(split.notice(), BulkNotice::OnlyManaged);
        let bundle = TranslationBundle::new(LocaleCode::En);
        assert_eq!(split.messages(&bundle).len(), 1);
    }

    #[test]
    fn mixed_selection_applies_to_local_only() {
        let mut rows: Vec<Project> = (0..6)
            .map(|i| project(&format!("{i} managed"), true, Qualifier::Project))
            .collect();
        rows.extend((0..5).map(|i| project(&format!("{i} local"), false, Qualifier::Project)));
        let split = partition(&rows);
        assert!(split.can_apply());
        assert_eq!(split.notice(), BulkNotice::Mixed { local: 5, managed: 6 });
        assert!(split.local.iter().all(|key| key.as_str().ends_with("local")));

        let bundle = TranslationBundle::new(LocaleCode::En);
        let lines = split.messages(&bundle);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains('5'));
        assert!(lines[1].contains('6'));
    }

    #[test]
    fn portfolios_and_applications_are_ineligible() {
        let rows = [
            project("vw", false, Qualifier::Portfolio),
            project("app", false, Qualifier::Application),
        ];
        let split = partition(&rows);
        assert_eq!(split.ineligible.len(), 2);
        assert_eq!(split.notice(), BulkNotice::Empty);
        assert!(!split.can_apply());
    }

    #[test]
    fn local_only_selection_reports_count() {
        let rows = [
            project("a", false, Qualifier::Project),
            project("b", false, Qualifier::Project),
        ];
        assert_eq!(
            partition(&rows).notice(),
            BulkNotice::ApplyToSelected { count: 2 }
        );
    }
}
