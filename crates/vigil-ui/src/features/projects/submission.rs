//! Dialog submissions split into issue, send and finish steps.
//!
//! # Design
//! - [`Submission`] is a snapshot taken when the dialog enters `Submitting`;
//!   sending it needs only the facade handles, never the screen.
//! - [`Submitted`] carries what the screen needs to settle the dialog and
//!   refresh its snapshots.

use tracing::warn;
use vigil_api_models::{NewProject, Project, ProjectKey, Visibility};
use vigil_core::{ServiceResult, Services};

/// Backend call prepared by an open dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Apply a permission template to projects.
    ApplyTemplate {
        /// Template id.
        template_id: String,
        /// Target projects.
        keys: Vec<ProjectKey>,
    },
    /// Delete projects.
    Delete {
        /// Projects to delete.
        keys: Vec<ProjectKey>,
    },
    /// Grant the acting user access to one project.
    RestoreAccess {
        /// Target project.
        key: ProjectKey,
    },
    /// Store the instance default visibility.
    DefaultVisibility {
        /// Visibility picked in the dialog.
        choice: Visibility,
    },
    /// Create one project.
    CreateProject(NewProject),
}

/// Successful outcome of a [`Submission`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submitted {
    /// The template was applied to `count` projects.
    TemplateApplied {
        /// Number of projects the template reached.
        count: usize,
    },
    /// The projects were deleted.
    Deleted {
        /// Deleted keys.
        keys: Vec<ProjectKey>,
    },
    /// Access was restored on a project.
    AccessRestored {
        /// Project key.
        key: ProjectKey,
    },
    /// The default visibility as read back after the change.
    DefaultVisibility(Visibility),
    /// The created project.
    ProjectCreated(Project),
}

impl Submitted {
    /// Whether the dialog closes on this outcome; the others stay open to
    /// show the success message.
    #[must_use]
    pub const fn closes_dialog(&self) -> bool {
        matches!(
            self,
            Self::Deleted { .. } | Self::AccessRestored { .. } | Self::DefaultVisibility(_)
        )
    }
}

impl Submission {
    /// Short operation name for logs.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::ApplyTemplate { .. } => "apply_template",
            Self::Delete { .. } => "delete_projects",
            Self::RestoreAccess { .. } => "restore_access",
            Self::DefaultVisibility { .. } => "set_default_visibility",
            Self::CreateProject(_) => "create_project",
        }
    }

    /// Call the facade.
    ///
    /// # Errors
    ///
    /// Propagates the facade failure.
    pub async fn send(self, services: &Services) -> ServiceResult<Submitted> {
        let operation = self.operation();
        let result = match self {
            Self::ApplyTemplate { template_id, keys } => services
                .permissions
                .apply_template(&template_id, &keys)
                .await
                .map(|()| Submitted::TemplateApplied { count: keys.len() }),
            Self::Delete { keys } => services
                .catalog
                .delete_projects(&keys)
                .await
                .map(|()| Submitted::Deleted { keys }),
            Self::RestoreAccess { key } => services
                .permissions
                .restore_access(&key)
                .await
                .map(|()| Submitted::AccessRestored { key }),
            Self::DefaultVisibility { choice } => {
                match services.settings.set_default_visibility(choice).await {
                    Ok(()) => services
                        .settings
                        .default_visibility()
                        .await
                        .map(Submitted::DefaultVisibility),
                    Err(err) => Err(err),
                }
            }
            Self::CreateProject(project) => services
                .catalog
                .create_project(project)
                .await
                .map(Submitted::ProjectCreated),
        };
        if let Err(err) = &result {
            warn!(operation, error = %err, "dialog submission failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_confirmations_close_on_success() {
        assert!(Submitted::Deleted { keys: Vec::new() }.closes_dialog());
        assert!(
            Submitted::AccessRestored {
                key: ProjectKey::new("project1")
            }
            .closes_dialog()
        );
        assert!(Submitted::DefaultVisibility(Visibility::Private).closes_dialog());
        assert!(!Submitted::TemplateApplied { count: 2 }.closes_dialog());
    }

    #[test]
    fn operations_name_the_facade_call() {
        let submission = Submission::RestoreAccess {
            key: ProjectKey::new("project1"),
        };
        assert_eq!(submission.operation(), "restore_access");
        assert_eq!(
            Submission::DefaultVisibility {
                choice: Visibility::Public
            }
            .operation(),
            "set_default_visibility"
        );
    }
}
