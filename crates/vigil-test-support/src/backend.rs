//! In-memory implementation of every backend facade.
//!
//! # Design
//! - Each test builds its own backend; there is no shared or global state.
//! - Failures are injected per operation and consumed by the next call.
//! - Calls are recorded so tests can assert what reached the backend.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::debug;
use vigil_api_models::{
    NewProject, Paging, PermissionTemplate, PermissionUser, PermissionUsers, Project, ProjectKey,
    ProjectPage, ProjectPermission, ProjectSearchQuery, Qualifier, Visibility,
};
use vigil_core::{
    PermissionService, ProjectCatalog, ProvisioningService, ServiceError, ServiceResult,
    SettingsService,
};

/// Facade operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `search_projects`.
    SearchProjects,
    /// `create_project`.
    CreateProject,
    /// `delete_projects`.
    DeleteProjects,
    /// `permission_users`.
    PermissionUsers,
    /// `permission_templates`.
    PermissionTemplates,
    /// `apply_template`.
    ApplyTemplate,
    /// `restore_access`.
    RestoreAccess,
    /// `default_visibility`.
    DefaultVisibility,
    /// `set_default_visibility`.
    SetDefaultVisibility,
    /// `main_branch_name`.
    MainBranchName,
    /// `github_provisioning_enabled`.
    GithubProvisioning,
}

impl Operation {
    /// Operation name carried by injected errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SearchProjects => "search_projects",
            Self::CreateProject => "create_project",
            Self::DeleteProjects => "delete_projects",
            Self::PermissionUsers => "permission_users",
            Self::PermissionTemplates => "permission_templates",
            Self::ApplyTemplate => "apply_template",
            Self::RestoreAccess => "restore_access",
            Self::DefaultVisibility => "default_visibility",
            Self::SetDefaultVisibility => "set_default_visibility",
            Self::MainBranchName => "main_branch_name",
            Self::GithubProvisioning => "github_provisioning_enabled",
        }
    }
}

/// Record of one successful template application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedTemplate {
    /// Template id.
    pub template_id: String,
    /// Projects that received it.
    pub projects: Vec<ProjectKey>,
}

#[derive(Debug, Default)]
struct BackendState {
    projects: Vec<Project>,
    templates: Vec<PermissionTemplate>,
    grants: HashSet<(ProjectKey, String, ProjectPermission)>,
    default_visibility: Visibility,
    main_branch: String,
    github_provisioning: bool,
    failures: HashMap<Operation, String>,
    applied: Vec<AppliedTemplate>,
    searches: Vec<ProjectSearchQuery>,
}

/// Backend holding projects, grants and settings in memory.
#[derive(Debug)]
pub struct InMemoryBackend {
    login: String,
    state: RefCell<BackendState>,
}

impl InMemoryBackend {
    /// Empty backend acting on behalf of `login`.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            state: RefCell::new(BackendState {
                main_branch: "main".to_string(),
                ..BackendState::default()
            }),
        }
    }

    /// Seed projects.
    #[must_use]
    pub fn with_projects(self, projects: impl IntoIterator<Item = Project>) -> Self {
        self.state.borrow_mut().projects.extend(projects);
        self
    }

    /// Seed permission templates.
    #[must_use]
    pub fn with_templates(self, templates: impl IntoIterator<Item = PermissionTemplate>) -> Self {
        self.state.borrow_mut().templates.extend(templates);
        self
    }

    /// Report GitHub provisioning as enabled or disabled.
    #[must_use]
    pub fn with_github_provisioning(self, enabled: bool) -> Self {
        self.state.borrow_mut().github_provisioning = enabled;
        self
    }

    /// Set the default visibility of new projects.
    #[must_use]
    pub fn with_default_visibility(self, visibility: Visibility) -> Self {
        self.state.borrow_mut().default_visibility = visibility;
        self
    }

    /// Set the configured main branch name.
    #[must_use]
    pub fn with_main_branch(self, branch: impl Into<String>) -> Self {
        self.state.borrow_mut().main_branch = branch.into();
        self
    }

    /// Grant `login` a permission on a project.
    pub fn grant(&self, project: &ProjectKey, login: &str, permission: ProjectPermission) {
        self.state
            .borrow_mut()
            .grants
            .insert((project.clone(), login.to_string(), permission));
    }

    /// Grant `login` browse and admin on every seeded project.
    pub fn grant_all(&self, login: &str) {
        let keys: Vec<ProjectKey> = self
            .state
            .borrow()
            .projects
            .iter()
            .map(|project| project.key.clone())
            .collect();
        for key in &keys {
            self.grant(key, login, ProjectPermission::Browse);
            self.grant(key, login, ProjectPermission::Admin);
        }
    }

    /// Make the next call of `operation` fail with `message`.
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .failures
            .insert(operation, message.into());
    }

    /// Templates applied so far, in call order.
    #[must_use]
    pub fn applied_templates(&self) -> Vec<AppliedTemplate> {
        self.state.borrow().applied.clone()
    }

    /// Project search queries received so far.
    #[must_use]
    pub fn searches(&self) -> Vec<ProjectSearchQuery> {
        self.state.borrow().searches.clone()
    }

    /// Keys of the stored projects.
    #[must_use]
    pub fn project_keys(&self) -> Vec<ProjectKey> {
        self.state
            .borrow()
            .projects
            .iter()
            .map(|project| project.key.clone())
            .collect()
    }

    /// Whether `login` holds `permission` on a project.
    #[must_use]
    pub fn has_grant(&self, project: &ProjectKey, login: &str, permission: ProjectPermission) -> bool {
        self.state
            .borrow()
            .grants
            .contains(&(project.clone(), login.to_string(), permission))
    }

    /// Stored default visibility.
    #[must_use]
    pub fn stored_default_visibility(&self) -> Visibility {
        self.state.borrow().default_visibility
    }

    fn check(&self, operation: Operation) -> ServiceResult<()> {
        match self.state.borrow_mut().failures.remove(&operation) {
            Some(message) => {
                debug!(operation = operation.name(), "injected failure");
                Err(ServiceError::rejected(operation.name(), message))
            }
            None => Ok(()),
        }
    }

    fn require_project(&self, key: &ProjectKey) -> ServiceResult<()> {
        if self
            .state
            .borrow()
            .projects
            .iter()
            .any(|project| &project.key == key)
        {
            Ok(())
        } else {
            Err(ServiceError::NotFound { key: key.clone() })
        }
    }
}

#[async_trait(?Send)]
impl ProjectCatalog for InMemoryBackend {
    async fn search_projects(&self, query: &ProjectSearchQuery) -> ServiceResult<ProjectPage> {
        self.check(Operation::SearchProjects)?;
        let mut state = self.state.borrow_mut();
        state.searches.push(query.clone());
        let matching: Vec<&Project> = state
            .projects
            .iter()
            .filter(|project| query.matches(project))
            .collect();
        let total = u32::try_from(matching.len()).unwrap_or(u32::MAX);
        let skip = query.page.saturating_sub(1).saturating_mul(query.page_size) as usize;
        let projects = matching
            .into_iter()
            .skip(skip)
            .take(query.page_size as usize)
            .cloned()
            .collect();
        Ok(ProjectPage {
            paging: Paging {
                page_index: query.page,
                page_size: query.page_size,
                total,
            },
            projects,
        })
    }

    async fn create_project(&self, project: NewProject) -> ServiceResult<Project> {
        self.check(Operation::CreateProject)?;
        let mut state = self.state.borrow_mut();
        if state.projects.iter().any(|existing| existing.key == project.key) {
            return Err(ServiceError::rejected(
                Operation::CreateProject.name(),
                format!("Could not create Project, key already exists: {}", project.key),
            ));
        }
        let created = Project {
            key: project.key,
            name: project.name,
            qualifier: Qualifier::Project,
            visibility: project.visibility,
            managed: false,
            last_analysis_date: None,
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn delete_projects(&self, keys: &[ProjectKey]) -> ServiceResult<()> {
        self.check(Operation::DeleteProjects)?;
        let mut state = self.state.borrow_mut();
        state.projects.retain(|project| !keys.contains(&project.key));
        state.grants.retain(|(key, _, _)| !keys.contains(key));
        Ok(())
    }
}

#[async_trait(?Send)]
impl PermissionService for InMemoryBackend {
    async fn permission_users(
        &self,
        project: &ProjectKey,
        permission: ProjectPermission,
        login: &str,
    ) -> ServiceResult<PermissionUsers> {
        self.check(Operation::PermissionUsers)?;
        self.require_project(project)?;
        let state = self.state.borrow();
        let mut users: Vec<PermissionUser> = state
            .grants
            .iter()
            .filter(|(key, user, granted)| {
                key == project && *granted == permission && user.contains(login)
            })
            .map(|(_, user, _)| PermissionUser {
                login: user.clone(),
                name: user.clone(),
            })
            .collect();
        users.sort_by(|a, b| a.login.cmp(&b.login));
        Ok(PermissionUsers { users })
    }

    async fn permission_templates(&self) -> ServiceResult<Vec<PermissionTemplate>> {
        self.check(Operation::PermissionTemplates)?;
        Ok(self.state.borrow().templates.clone())
    }

    async fn apply_template(&self, template_id: &str, projects: &[ProjectKey]) -> ServiceResult<()> {
        self.check(Operation::ApplyTemplate)?;
        let mut state = self.state.borrow_mut();
        if !state.templates.iter().any(|template| template.id == template_id) {
            return Err(ServiceError::rejected(
                Operation::ApplyTemplate.name(),
                format!("Permission template with id '{template_id}' is not found"),
            ));
        }
        state.applied.push(AppliedTemplate {
            template_id: template_id.to_string(),
            projects: projects.to_vec(),
        });
        Ok(())
    }

    async fn restore_access(&self, project: &ProjectKey) -> ServiceResult<()> {
        self.check(Operation::RestoreAccess)?;
        self.require_project(project)?;
        self.grant(project, &self.login, ProjectPermission::Browse);
        self.grant(project, &self.login, ProjectPermission::Admin);
        Ok(())
    }
}

#[async_trait(?Send)]
impl SettingsService for InMemoryBackend {
    async fn default_visibility(&self) -> ServiceResult<Visibility> {
        self.check(Operation::DefaultVisibility)?;
        Ok(self.state.borrow().default_visibility)
    }

    async fn set_default_visibility(&self, visibility: Visibility) -> ServiceResult<()> {
        self.check(Operation::SetDefaultVisibility)?;
        self.state.borrow_mut().default_visibility = visibility;
        Ok(())
    }

    async fn main_branch_name(&self) -> ServiceResult<String> {
        self.check(Operation::MainBranchName)?;
        Ok(self.state.borrow().main_branch.clone())
    }
}

#[async_trait(?Send)]
impl ProvisioningService for InMemoryBackend {
    async fn github_provisioning_enabled(&self) -> ServiceResult<bool> {
        self.check(Operation::GithubProvisioning)?;
        Ok(self.state.borrow().github_provisioning)
    }
}
