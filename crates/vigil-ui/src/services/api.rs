//! HTTP client implementing the backend facades over the console REST API.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use vigil_api_models::{
    CurrentUser, NewProject, PermissionTemplate, PermissionUsers, Project, ProjectKey, ProjectPage,
    ProjectPermission, ProjectSearchQuery, Visibility,
};
use vigil_core::{
    PermissionService, ProjectCatalog, ProvisioningService, ServiceError, ServiceResult,
    SettingsService,
};

const DEFAULT_VISIBILITY_KEY: &str = "projects.default.visibility";
const MAIN_BRANCH_KEY: &str = "sonar.projectCreation.mainBranchName";
const GITHUB_PROVISIONING_KEY: &str = "provisioning.github.enabled";

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    base_url: String,
    login: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorMessage>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    msg: String,
}

#[derive(Deserialize)]
struct CreatedProject {
    project: Project,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplatesBody {
    permission_templates: Vec<PermissionTemplate>,
}

#[derive(Deserialize)]
struct SettingsBody {
    settings: Vec<SettingValue>,
}

#[derive(Deserialize)]
struct SettingValue {
    key: String,
    value: String,
}

fn unavailable(operation: &'static str, err: gloo_net::Error) -> ServiceError {
    ServiceError::Unavailable {
        operation,
        source: Box::new(err),
    }
}

fn form(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn join_keys(keys: &[ProjectKey]) -> String {
    keys.iter()
        .map(ProjectKey::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

impl ApiClient {
    pub(crate) fn new(base_url: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login: login.into(),
        }
    }

    /// Account behind the browser session.
    pub(crate) async fn current_user(&self) -> ServiceResult<CurrentUser> {
        self.get_json("current_user", "api/users/current").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn check(operation: &'static str, response: Response) -> ServiceResult<Response> {
        if response.ok() {
            return Ok(response);
        }
        if response.status() == 403 {
            return Err(ServiceError::PermissionDenied { operation });
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body
                .errors
                .into_iter()
                .map(|error| error.msg)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => response.status_text(),
        };
        Err(ServiceError::rejected(operation, message))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> ServiceResult<T> {
        let response = Request::get(&self.url(path))
            .send()
            .await
            .map_err(|err| unavailable(operation, err))?;
        Self::check(operation, response)
            .await?
            .json::<T>()
            .await
            .map_err(|err| unavailable(operation, err))
    }

    async fn post_form(
        &self,
        operation: &'static str,
        path: &str,
        params: &[(&str, &str)],
    ) -> ServiceResult<Response> {
        let response = Request::post(&self.url(path))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(form(params))
            .send()
            .await
            .map_err(|err| unavailable(operation, err))?;
        Self::check(operation, response).await
    }

    async fn setting(&self, operation: &'static str, key: &str) -> ServiceResult<Option<String>> {
        let body: SettingsBody = self
            .get_json(operation, &format!("api/settings/values?keys={key}"))
            .await?;
        Ok(body
            .settings
            .into_iter()
            .find(|setting| setting.key == key)
            .map(|setting| setting.value))
    }
}

fn search_path(query: &ProjectSearchQuery) -> String {
    let mut path = format!(
        "api/projects/search?qualifiers={}&p={}&ps={}",
        query.qualifier.code(),
        query.page,
        query.page_size
    );
    if let Some(visibility) = query.visibility {
        path.push_str(&format!("&visibility={}", visibility.as_str()));
    }
    if let Some(cutoff) = query.analyzed_before {
        path.push_str(&format!("&analyzedBefore={}", cutoff.format("%Y-%m-%d")));
    }
    if query.on_provisioned_only {
        path.push_str("&onProvisionedOnly=true");
    }
    if let Some(q) = &query.q {
        path.push_str(&format!("&q={}", urlencoding::encode(q)));
    }
    path
}

#[async_trait(?Send)]
impl ProjectCatalog for ApiClient {
    async fn search_projects(&self, query: &ProjectSearchQuery) -> ServiceResult<ProjectPage> {
        self.get_json("search_projects", &search_path(query)).await
    }

    async fn create_project(&self, project: NewProject) -> ServiceResult<Project> {
        const OPERATION: &str = "create_project";
        let response = self
            .post_form(
                OPERATION,
                "api/projects/create",
                &[
                    ("name", &project.name),
                    ("project", project.key.as_str()),
                    ("mainBranch", &project.main_branch),
                    ("visibility", project.visibility.as_str()),
                ],
            )
            .await?;
        let created: CreatedProject = response
            .json()
            .await
            .map_err(|err| unavailable(OPERATION, err))?;
        Ok(created.project)
    }

    async fn delete_projects(&self, keys: &[ProjectKey]) -> ServiceResult<()> {
        let projects = join_keys(keys);
        self.post_form(
            "delete_projects",
            "api/projects/bulk_delete",
            &[("projects", &projects)],
        )
        .await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl PermissionService for ApiClient {
    async fn permission_users(
        &self,
        project: &ProjectKey,
        permission: ProjectPermission,
        login: &str,
    ) -> ServiceResult<PermissionUsers> {
        let path = format!(
            "api/permissions/users?projectKey={}&permission={}&q={}",
            urlencoding::encode(project.as_str()),
            permission.as_str(),
            urlencoding::encode(login)
        );
        self.get_json("permission_users", &path).await
    }

    async fn permission_templates(&self) -> ServiceResult<Vec<PermissionTemplate>> {
        let body: TemplatesBody = self
            .get_json("permission_templates", "api/permissions/search_templates")
            .await?;
        Ok(body.permission_templates)
    }

    async fn apply_template(&self, template_id: &str, projects: &[ProjectKey]) -> ServiceResult<()> {
        let projects = join_keys(projects);
        self.post_form(
            "apply_template",
            "api/permissions/bulk_apply_template",
            &[("templateId", template_id), ("projects", &projects)],
        )
        .await?;
        Ok(())
    }

    async fn restore_access(&self, project: &ProjectKey) -> ServiceResult<()> {
        for permission in [ProjectPermission::Browse, ProjectPermission::Admin] {
            self.post_form(
                "restore_access",
                "api/permissions/add_user",
                &[
                    ("projectKey", project.as_str()),
                    ("login", &self.login),
                    ("permission", permission.as_str()),
                ],
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl SettingsService for ApiClient {
    async fn default_visibility(&self) -> ServiceResult<Visibility> {
        let value = self
            .setting("default_visibility", DEFAULT_VISIBILITY_KEY)
            .await?;
        Ok(match value.as_deref() {
            Some("private") => Visibility::Private,
            _ => Visibility::Public,
        })
    }

    async fn set_default_visibility(&self, visibility: Visibility) -> ServiceResult<()> {
        self.post_form(
            "set_default_visibility",
            "api/projects/update_default_visibility",
            &[("projectVisibility", visibility.as_str())],
        )
        .await?;
        Ok(())
    }

    async fn main_branch_name(&self) -> ServiceResult<String> {
        let value = self.setting("main_branch_name", MAIN_BRANCH_KEY).await?;
        Ok(value.unwrap_or_else(|| "main".to_string()))
    }
}

#[async_trait(?Send)]
impl ProvisioningService for ApiClient {
    async fn github_provisioning_enabled(&self) -> ServiceResult<bool> {
        let value = self
            .setting("github_provisioning_enabled", GITHUB_PROVISIONING_KEY)
            .await?;
        Ok(value.as_deref() == Some("true"))
    }
}
