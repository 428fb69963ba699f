//! Per-row action resolution.
//!
//! # Design
//! - One pure function decides the action set from the project, the user and
//!   the instance features so every branch is testable without a backend.
//! - Managed projects never expose template application or permission editing.

use vigil_api_models::{CurrentUser, FeatureFlags, Project, Qualifier};

/// Project permissions held by the current user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ProjectCapabilities {
    /// May browse the project.
    pub browse: bool,
    /// May administer the project.
    pub admin: bool,
}

/// Entries of a row's action menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowAction {
    /// Link to the editable permissions page.
    EditPermissions,
    /// Link to the read-only permissions page.
    ShowPermissions,
    /// Open the single-project apply-template dialog.
    ApplyTemplate,
    /// Open the restore-access confirmation.
    RestoreAccess,
}

impl RowAction {
    /// Translation key of the menu entry.
    #[must_use]
    pub const fn label_key(self) -> &'static str {
        match self {
            Self::EditPermissions => "permissions.edit",
            Self::ShowPermissions => "permissions.show",
            Self::ApplyTemplate => "projects_role.apply_template.title",
            Self::RestoreAccess => "global_permissions.restore_access",
        }
    }
}

/// Ordered, de-duplicated action menu of a row.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ActionSet(Vec<RowAction>);

impl ActionSet {
    fn push(&mut self, action: RowAction) {
        if !self.0.contains(&action) {
            self.0.push(action);
        }
    }

    /// Whether the menu offers `action`.
    #[must_use]
    pub fn contains(&self, action: RowAction) -> bool {
        self.0.contains(&action)
    }

    /// Actions in display order.
    #[must_use]
    pub fn actions(&self) -> &[RowAction] {
        &self.0
    }

    /// Whether the menu is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolve the action menu of one row.
#[must_use]
pub fn resolve_actions(
    project: &Project,
    user: &CurrentUser,
    capabilities: ProjectCapabilities,
    features: FeatureFlags,
) -> ActionSet {
    let mut set = ActionSet::default();
    if project.managed {
        let can_restore = features.github_provisioning && user.local && !capabilities.admin;
        if can_restore {
            set.push(RowAction::RestoreAccess);
        } else if capabilities.admin || capabilities.browse {
            set.push(RowAction::ShowPermissions);
        }
        return set;
    }

    if capabilities.admin {
        set.push(RowAction::EditPermissions);
    } else if capabilities.browse {
        set.push(RowAction::ShowPermissions);
    }
    set.push(RowAction::ApplyTemplate);
    if !capabilities.admin && !capabilities.browse {
        set.push(RowAction::RestoreAccess);
    }
    set
}

/// Whether a row carries the "local" badge.
#[must_use]
pub fn shows_local_badge(project: &Project, features: FeatureFlags) -> bool {
    features.github_provisioning && project.qualifier == Qualifier::Project && !project.managed
}

/// Route of the permissions page for a project.
#[must_use]
pub fn permissions_path(project: &Project) -> String {
    format!("/project_roles?id={}", project.key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_api_models::{ProjectKey, Visibility};

    const ADMIN: ProjectCapabilities = ProjectCapabilities {
        browse: true,
        admin: true,
    };
    const BROWSE: ProjectCapabilities = ProjectCapabilities {
        browse: true,
        admin: false,
    };
    const NOTHING: ProjectCapabilities = ProjectCapabilities {
        browse: false,
        admin: false,
    };
    const PROVISIONING: FeatureFlags = FeatureFlags {
        github_provisioning: true,
    };
    const NO_PROVISIONING: FeatureFlags = FeatureFlags {
        github_provisioning: false,
    };

    fn project(managed: bool) -> Project {
        Project {
            key: ProjectKey::new("project1"),
            name: "Project 1".into(),
            qualifier: Qualifier::Project,
            visibility: Visibility::Public,
            managed,
            last_analysis_date: None,
        }
    }

    fn user(local: bool) -> CurrentUser {
        CurrentUser {
            login: "gooduser2".into(),
            local,
            global_permissions: Vec::new(),
        }
    }

    #[test]
    fn local_project_admin_can_edit_and_apply_templates() {
        let set = resolve_actions(&project(false), &user(true), ADMIN, NO_PROVISIONING);
        assert_eq!(
            set.actions(),
            &[RowAction::EditPermissions, RowAction::ApplyTemplate]
        );
    }

    #[test]
    fn local_project_browse_only_shows_permissions() {
        let set = resolve_actions(&project(false), &user(false), BROWSE, NO_PROVISIONING);
        assert!(set.contains(RowAction::ShowPermissions));
        assert!(!set.contains(RowAction::EditPermissions));
        assert!(!set.contains(RowAction::RestoreAccess));
    }

    #[test]
    fn local_project_without_access_offers_restore() {
        for features in [PROVISIONING, NO_PROVISIONING] {
            for local in [true, false] {
                let set = resolve_actions(&project(false), &user(local), NOTHING, features);
                assert!(set.contains(RowAction::RestoreAccess));
                assert!(!set.contains(RowAction::EditPermissions));
            }
        }
    }

    #[test]
    fn restore_then_re_resolve_yields_edit_permissions() {
        let before = resolve_actions(&project(false), &user(true), NOTHING, NO_PROVISIONING);
        assert!(before.contains(RowAction::RestoreAccess));
        let after = resolve_actions(&project(false), &user(true), ADMIN, NO_PROVISIONING);
        assert!(!after.contains(RowAction::RestoreAccess));
        assert!(after.contains(RowAction::EditPermissions));
    }

    #[test]
    fn managed_project_never_edits_or_applies_templates() {
        for caps in [ADMIN, BROWSE, NOTHING] {
            for features in [PROVISIONING, NO_PROVISIONING] {
                for local in [true, false] {
                    let set = resolve_actions(&project(true), &user(local), caps, features);
                    assert!(!set.contains(RowAction::EditPermissions));
                    assert!(!set.contains(RowAction::ApplyTemplate));
                }
            }
        }
        let set = resolve_actions(&project(true), &user(true), ADMIN, NO_PROVISIONING);
        assert_eq!(set.actions(), &[RowAction::ShowPermissions]);
    }

    #[test]
    fn managed_project_restore_requires_provisioning_and_local_account() {
        let local = resolve_actions(&project(true), &user(true), NOTHING, PROVISIONING);
        assert_eq!(local.actions(), &[RowAction::RestoreAccess]);

        let external = resolve_actions(&project(true), &user(false), BROWSE, PROVISIONING);
        assert_eq!(external.actions(), &[RowAction::ShowPermissions]);

        let disabled = resolve_actions(&project(true), &user(true), NOTHING, NO_PROVISIONING);
        assert!(disabled.is_empty());

        let restored = resolve_actions(&project(true), &user(true), ADMIN, PROVISIONING);
        assert_eq!(restored.actions(), &[RowAction::ShowPermissions]);
    }

    #[test]
    fn local_badge_needs_provisioning_and_a_local_project() {
        assert!(shows_local_badge(&project(false), PROVISIONING));
        assert!(!shows_local_badge(&project(true), PROVISIONING));
        assert!(!shows_local_badge(&project(false), NO_PROVISIONING));
        let mut portfolio = project(false);
        portfolio.qualifier = Qualifier::Portfolio;
        assert!(!shows_local_badge(&portfolio, PROVISIONING));
    }

    #[test]
    fn permissions_path_embeds_the_key() {
        assert_eq!(permissions_path(&project(false)), "/project_roles?id=project1");
    }
}
