//! Facade traits implemented by backend adapters (REST client, in-memory fakes).
//!
//! The console runs on a single-threaded event loop, so futures are not
//! required to be `Send` and adapters are shared through `Rc`.

use std::rc::Rc;

use async_trait::async_trait;
use vigil_api_models::{
    NewProject, PermissionTemplate, PermissionUsers, Project, ProjectKey, ProjectPage,
    ProjectPermission, ProjectSearchQuery, Visibility,
};

use crate::error::ServiceResult;

/// Project listing and lifecycle.
#[async_trait(?Send)]
pub trait ProjectCatalog {
    /// List one page of projects matching the query.
    async fn search_projects(&self, query: &ProjectSearchQuery) -> ServiceResult<ProjectPage>;

    /// Create a project.
    async fn create_project(&self, project: NewProject) -> ServiceResult<Project>;

    /// Delete the given projects.
    async fn delete_projects(&self, keys: &[ProjectKey]) -> ServiceResult<()>;
}

/// Project permissions and permission templates.
#[async_trait(?Send)]
pub trait PermissionService {
    /// Users matching `login` that hold `permission` on the project.
    async fn permission_users(
        &self,
        project: &ProjectKey,
        permission: ProjectPermission,
        login: &str,
    ) -> ServiceResult<PermissionUsers>;

    /// Available permission templates.
    async fn permission_templates(&self) -> ServiceResult<Vec<PermissionTemplate>>;

    /// Apply a permission template to every listed project.
    async fn apply_template(&self, template_id: &str, projects: &[ProjectKey])
    -> ServiceResult<()>;

    /// Grant the current user browse and admin on the project.
    async fn restore_access(&self, project: &ProjectKey) -> ServiceResult<()>;
}

/// Instance settings consulted by the console.
#[async_trait(?Send)]
pub trait SettingsService {
    /// Visibility applied to newly created projects.
    async fn default_visibility(&self) -> ServiceResult<Visibility>;

    /// Change the visibility applied to newly created projects.
    async fn set_default_visibility(&self, visibility: Visibility) -> ServiceResult<()>;

    /// Main branch name prefilled in the create-project form.
    async fn main_branch_name(&self) -> ServiceResult<String>;
}

/// External provisioning status.
#[async_trait(?Send)]
pub trait ProvisioningService {
    /// Whether GitHub provisioning is currently enabled.
    async fn github_provisioning_enabled(&self) -> ServiceResult<bool>;
}

/// Bundle of facade handles injected into the screen.
#[derive(Clone)]
pub struct Services {
    /// Project listing and lifecycle.
    pub catalog: Rc<dyn ProjectCatalog>,
    /// Permissions and templates.
    pub permissions: Rc<dyn PermissionService>,
    /// Instance settings.
    pub settings: Rc<dyn SettingsService>,
    /// Provisioning status.
    pub provisioning: Rc<dyn ProvisioningService>,
}

impl Services {
    /// Share one adapter implementing every facade.
    #[must_use]
    pub fn from_backend<B>(backend: Rc<B>) -> Self
    where
        B: ProjectCatalog + PermissionService + SettingsService + ProvisioningService + 'static,
    {
        Self {
            catalog: backend.clone(),
            permissions: backend.clone(),
            settings: backend.clone(),
            provisioning: backend,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
