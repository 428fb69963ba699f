//! Projects-management screen controller.
//!
//! # Design
//! - Owns the filter, selection and page state of one screen instance and
//!   drives the backend facade injected at construction.
//! - Page loads are split into issue, fetch and apply steps so responses
//!   that lost the race against a newer filter change are dropped.
//! - Failures are scoped to the open dialog or to the list; none of them
//!   tears the screen down.

use std::rc::Rc;

use tracing::{debug, info, warn};
use vigil_api_models::{
    CurrentUser, FeatureFlags, GlobalPermission, Project, ProjectKey, ProjectPage,
    ProjectPermission, ProjectSearchQuery, Qualifier, Visibility,
};
use vigil_config::ConsoleConfig;
use vigil_core::{ServiceResult, Services};

use crate::features::projects::bulk::partition;
use crate::features::projects::dialogs::{
    CreateProjectForm, DeleteDialog, Dialog, RestoreAccessDialog, TemplateDialog,
    VisibilityDialog,
};
use crate::features::projects::error::ActionError;
use crate::features::projects::pagination::{PageController, PageKind, PageRequest};
use crate::features::projects::row_actions::{
    ActionSet, ProjectCapabilities, RowAction, resolve_actions, shows_local_badge,
};
use crate::features::projects::state::{
    CheckAllState, FilterState, FilterUpdate, ProjectsState, append_rows, check_all_state,
    clear_selection, has_more, remove_rows, row_count, select_all, select_project,
    select_selected_rows, select_visible_rows, set_rows, toggle_selection,
};
use crate::features::projects::submission::{Submission, Submitted};

/// Action menu resolved for one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowMenu {
    /// Row the menu belongs to.
    pub key: ProjectKey,
    /// Actions offered.
    pub actions: ActionSet,
}

/// Page request together with the query captured when it was issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageFetch {
    /// Sequencing data checked when the response arrives.
    pub request: PageRequest,
    /// Backend query for the filters active at issue time.
    pub query: ProjectSearchQuery,
}

impl PageFetch {
    /// Run the captured query against the catalogue.
    ///
    /// # Errors
    ///
    /// Propagates the facade failure.
    pub async fn send(&self, services: &Services) -> ServiceResult<ProjectPage> {
        services.catalog.search_projects(&self.query).await
    }
}

/// Render model of one table row.
#[derive(Clone, Debug, PartialEq)]
pub struct RowView {
    /// Project snapshot.
    pub project: Rc<Project>,
    /// Checkbox state.
    pub selected: bool,
    /// Whether the "local" badge is shown.
    pub local_badge: bool,
}

/// Controller of the projects-management screen.
#[derive(Debug)]
pub struct ProjectsScreen {
    services: Services,
    user: CurrentUser,
    features: FeatureFlags,
    qualifiers: Vec<Qualifier>,
    state: ProjectsState,
    pages: PageController,
    default_visibility: Visibility,
    main_branch: String,
    row_menu: Option<RowMenu>,
    dialog: Option<Dialog>,
    list_error: Option<String>,
}

impl ProjectsScreen {
    /// Build the screen, resolve instance settings and load the first page.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Backend`] when a settings lookup fails. A failed
    /// first page is reported through [`Self::list_error`] instead.
    pub async fn open(
        services: Services,
        user: CurrentUser,
        config: &ConsoleConfig,
    ) -> Result<Self, ActionError> {
        let provisioning = services.provisioning.github_provisioning_enabled().await?;
        let default_visibility = services.settings.default_visibility().await?;
        let main_branch = services.settings.main_branch_name().await?;
        let features = FeatureFlags {
            github_provisioning: config.features.github_provisioning && provisioning,
        };
        let page_size = config.page_size;

        let mut screen = Self {
            services,
            user,
            features,
            qualifiers: config.qualifiers.clone(),
            state: ProjectsState::default(),
            pages: PageController::new(page_size),
            default_visibility,
            main_branch,
            row_menu: None,
            dialog: None,
            list_error: None,
        };
        info!(
            login = %screen.user.login,
            github_provisioning = features.github_provisioning,
            page_size,
            "projects screen opened"
        );
        if let Err(err) = screen.load().await
            && !err.is_silent()
        {
            warn!(error = %err, "initial projects page failed");
        }
        Ok(screen)
    }

    /// Facade handles used by the screen.
    #[must_use]
    pub const fn services(&self) -> &Services {
        &self.services
    }

    /// Current user.
    #[must_use]
    pub const fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Effective instance features.
    #[must_use]
    pub const fn features(&self) -> FeatureFlags {
        self.features
    }

    /// Filter, selection and row state.
    #[must_use]
    pub const fn state(&self) -> &ProjectsState {
        &self.state
    }

    /// Active filters.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.state.filters
    }

    /// Qualifiers offered by the qualifier filter.
    #[must_use]
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    /// The qualifier filter is shown only when there is a choice.
    #[must_use]
    pub fn shows_qualifier_filter(&self) -> bool {
        self.qualifiers.len() > 1
    }

    /// The provisioned-only filter is shown only for projects.
    #[must_use]
    pub fn shows_provisioned_filter(&self) -> bool {
        self.state.filters.shows_provisioned_filter()
    }

    /// Visibility applied to new projects.
    #[must_use]
    pub const fn default_visibility(&self) -> Visibility {
        self.default_visibility
    }

    /// Open dialog, if any.
    #[must_use]
    pub const fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Open create-project form for editing.
    pub const fn create_form_mut(&mut self) -> Option<&mut CreateProjectForm> {
        match &mut self.dialog {
            Some(Dialog::CreateProject(form)) => Some(form),
            _ => None,
        }
    }

    /// Resolved action menu, if one is open.
    #[must_use]
    pub const fn row_menu(&self) -> Option<&RowMenu> {
        self.row_menu.as_ref()
    }

    /// Message of the last failed list load.
    #[must_use]
    pub fn list_error(&self) -> Option<&str> {
        self.list_error.as_deref()
    }

    /// Whether a page request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pages.is_loading()
    }

    /// Rows in list order with their render flags.
    #[must_use]
    pub fn rows(&self) -> Vec<RowView> {
        select_visible_rows(&self.state)
            .into_iter()
            .map(|project| RowView {
                selected: self.state.selected.contains(&project.key),
                local_badge: shows_local_badge(&project, self.features),
                project,
            })
            .collect()
    }

    /// Rendered table rows including the header.
    #[must_use]
    pub fn row_count(&self) -> usize {
        row_count(&self.state)
    }

    /// Whether "show more" is offered.
    #[must_use]
    pub fn has_more(&self) -> bool {
        has_more(&self.state)
    }

    // Paging

    /// Issue a request for a fresh first page of the active filters.
    pub fn begin_reload(&mut self) -> PageFetch {
        let request = self.pages.reset(&self.state.filters);
        self.page_fetch(request)
    }

    /// Issue a request for the next page, if one is due.
    pub fn begin_load_more(&mut self) -> Option<PageFetch> {
        let request = self.pages.load_more(
            &self.state.filters,
            self.state.visible_keys.len(),
            self.state.total,
        )?;
        Some(self.page_fetch(request))
    }

    fn page_fetch(&self, request: PageRequest) -> PageFetch {
        PageFetch {
            query: self.state.filters.to_query(request.page, request.page_size),
            request,
        }
    }

    /// Fetch the page described by `fetch` without touching screen state.
    ///
    /// # Errors
    ///
    /// Propagates the facade failure.
    pub async fn fetch(&self, fetch: &PageFetch) -> ServiceResult<ProjectPage> {
        fetch.send(&self.services).await
    }

    /// Apply the response of `request` unless a newer request superseded it.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Stale`] for superseded responses and
    /// [`ActionError::Backend`] when the latest request failed. A failed
    /// first page empties the table so no row outlives the filters it was
    /// listed under.
    pub fn apply_page(
        &mut self,
        request: &PageRequest,
        response: ServiceResult<ProjectPage>,
    ) -> Result<(), ActionError> {
        let page = match response {
            Ok(page) => page,
            Err(err) => {
                if !self.pages.is_pending(request) {
                    return Err(ActionError::Stale {
                        sequence: request.sequence,
                    });
                }
                self.pages.abandon(request);
                warn!(sequence = request.sequence, error = %err, "projects page failed");
                if request.kind == PageKind::Reset {
                    set_rows(&mut self.state, Vec::new(), 0);
                    self.row_menu = None;
                }
                self.list_error = Some(err.to_string());
                return Err(err.into());
            }
        };
        if !self.pages.accept(request, &self.state.filters) {
            return Err(ActionError::Stale {
                sequence: request.sequence,
            });
        }
        let count = page.projects.len();
        match request.kind {
            PageKind::Reset => set_rows(&mut self.state, page.projects, page.paging.total),
            PageKind::Append => append_rows(&mut self.state, page.projects, page.paging.total),
        }
        self.list_error = None;
        self.row_menu = None;
        debug!(
            sequence = request.sequence,
            page = request.page,
            count,
            total = page.paging.total,
            "projects page applied"
        );
        Ok(())
    }

    /// Reload one fresh page for the active filters.
    ///
    /// # Errors
    ///
    /// See [`Self::apply_page`].
    pub async fn load(&mut self) -> Result<(), ActionError> {
        let fetch = self.begin_reload();
        let response = self.fetch(&fetch).await;
        self.apply_page(&fetch.request, response)
    }

    /// Append the next page; a no-op when nothing is due.
    ///
    /// # Errors
    ///
    /// See [`Self::apply_page`].
    pub async fn load_more(&mut self) -> Result<(), ActionError> {
        let Some(fetch) = self.begin_load_more() else {
            return Ok(());
        };
        let response = self.fetch(&fetch).await;
        self.apply_page(&fetch.request, response)
    }

    // Filters

    /// Merge a filter update without loading; returns whether a reload is due.
    ///
    /// # Errors
    ///
    /// Rejects qualifiers the console is not configured for.
    pub fn update_filters(&mut self, update: FilterUpdate) -> Result<bool, ActionError> {
        if let Some(qualifier) = update.qualifier
            && !self.qualifiers.contains(&qualifier)
        {
            return Err(ActionError::Validation {
                reason: "qualifier is not enabled",
            });
        }
        let change = self.state.filters.apply(update);
        if change.qualifier_changed {
            clear_selection(&mut self.state);
        }
        if change.changed {
            self.row_menu = None;
            debug!(
                qualifier = self.state.filters.qualifier.code(),
                fingerprint = ?self.state.filters.fingerprint(),
                "project filters changed"
            );
        }
        Ok(change.changed)
    }

    /// Merge a filter update and load a fresh page.
    ///
    /// # Errors
    ///
    /// See [`Self::update_filters`] and [`Self::apply_page`].
    pub async fn set_filter(&mut self, update: FilterUpdate) -> Result<(), ActionError> {
        if self.update_filters(update)? {
            self.load().await?;
        }
        Ok(())
    }

    /// Replace the search text and load a fresh page.
    ///
    /// # Errors
    ///
    /// See [`Self::apply_page`].
    pub async fn set_search(&mut self, text: &str) -> Result<(), ActionError> {
        if self.update_search(text) {
            self.load().await?;
        }
        Ok(())
    }

    /// Replace the search text without loading; returns whether a reload is due.
    pub fn update_search(&mut self, text: &str) -> bool {
        let changed = self.state.filters.set_search(text);
        if changed {
            self.row_menu = None;
        }
        changed
    }

    // Selection

    /// Toggle one row; returns whether it is now selected.
    pub fn toggle(&mut self, key: &ProjectKey) -> bool {
        toggle_selection(&mut self.state, key)
    }

    /// Check every visible row.
    pub fn select_all(&mut self) {
        select_all(&mut self.state);
    }

    /// Uncheck every row.
    pub fn clear_selection(&mut self) {
        clear_selection(&mut self.state);
    }

    /// State of the check-all control.
    #[must_use]
    pub fn check_all_state(&self) -> CheckAllState {
        check_all_state(&self.state)
    }

    /// Number of checked rows.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.state.selected.len()
    }

    // Bulk permission templates

    /// Bulk apply is enabled while something is selected.
    #[must_use]
    pub fn bulk_apply_enabled(&self) -> bool {
        !self.state.selected.is_empty()
    }

    /// Open the bulk apply-template dialog over a snapshot of the selection.
    ///
    /// # Errors
    ///
    /// Fails when nothing is selected or the template catalogue cannot be read.
    pub async fn open_bulk_apply(&mut self) -> Result<(), ActionError> {
        if !self.bulk_apply_enabled() {
            return Err(ActionError::Validation {
                reason: "no project selected",
            });
        }
        let selected = select_selected_rows(&self.state);
        let split = partition(selected.iter().map(|project| &**project));
        let templates = self.services.permissions.permission_templates().await?;
        debug!(
            local = split.local.len(),
            managed = split.managed.len(),
            ineligible = split.ineligible.len(),
            "bulk apply dialog opened"
        );
        self.dialog = Some(Dialog::Template(TemplateDialog::bulk(split, templates)));
        Ok(())
    }

    /// Pick a template in the open template dialog.
    ///
    /// # Errors
    ///
    /// Fails when no template dialog is open or the id is unknown.
    pub fn select_template(&mut self, template_id: &str) -> Result<(), ActionError> {
        let Some(Dialog::Template(dialog)) = &mut self.dialog else {
            return Err(ActionError::NoDialog {
                expected: "permission template",
            });
        };
        if dialog.select(template_id) {
            Ok(())
        } else {
            Err(ActionError::Validation {
                reason: "unknown permission template",
            })
        }
    }

    /// Apply the chosen template and reload; the dialog stays open with the
    /// outcome. Returns the number of projects the template reached.
    ///
    /// # Errors
    ///
    /// Returns the validation or backend failure; the dialog keeps its state
    /// so the same submission can be retried.
    pub async fn submit_template_dialog(&mut self) -> Result<usize, ActionError> {
        const EXPECTED: ActionError = ActionError::NoDialog {
            expected: "permission template",
        };
        if !matches!(self.dialog, Some(Dialog::Template(_))) {
            return Err(EXPECTED);
        }
        match self.submit().await? {
            Submitted::TemplateApplied { count } => Ok(count),
            _ => Err(EXPECTED),
        }
    }

    // Row actions

    /// Resolve the action menu of one row from a fresh capability lookup.
    ///
    /// # Errors
    ///
    /// Fails when the row is not listed or a lookup fails.
    pub async fn open_row_menu(&mut self, key: &ProjectKey) -> Result<ActionSet, ActionError> {
        let project = select_project(&self.state, key).ok_or(ActionError::UnknownProject)?;
        let permissions = &self.services.permissions;
        let login = self.user.login.as_str();
        let browse = permissions
            .permission_users(key, ProjectPermission::Browse, login)
            .await?;
        let admin = permissions
            .permission_users(key, ProjectPermission::Admin, login)
            .await?;
        let capabilities = ProjectCapabilities {
            browse: !browse.users.is_empty(),
            admin: !admin.users.is_empty(),
        };
        let actions = resolve_actions(&project, &self.user, capabilities, self.features);
        debug!(project = %key, ?capabilities, ?actions, "row actions resolved");
        self.row_menu = Some(RowMenu {
            key: key.clone(),
            actions: actions.clone(),
        });
        Ok(actions)
    }

    /// Close the row menu.
    pub fn close_row_menu(&mut self) {
        self.row_menu = None;
    }

    fn offered(&self, key: &ProjectKey, action: RowAction) -> Result<Rc<Project>, ActionError> {
        let offered = self
            .row_menu
            .as_ref()
            .is_some_and(|menu| &menu.key == key && menu.actions.contains(action));
        if !offered {
            return Err(ActionError::PermissionDenied {
                action: action.label_key(),
            });
        }
        select_project(&self.state, key).ok_or(ActionError::UnknownProject)
    }

    /// Open the single-project apply-template dialog.
    ///
    /// # Errors
    ///
    /// Fails when the row menu does not offer the action or the catalogue
    /// cannot be read.
    pub async fn open_apply_template(&mut self, key: &ProjectKey) -> Result<(), ActionError> {
        let project = self.offered(key, RowAction::ApplyTemplate)?;
        let templates = self.services.permissions.permission_templates().await?;
        self.row_menu = None;
        self.dialog = Some(Dialog::Template(TemplateDialog::single(
            project.key.clone(),
            project.name.clone(),
            templates,
        )));
        Ok(())
    }

    /// Open the restore-access confirmation.
    ///
    /// # Errors
    ///
    /// Fails when the row menu does not offer the action.
    pub fn open_restore_access(&mut self, key: &ProjectKey) -> Result<(), ActionError> {
        let project = self.offered(key, RowAction::RestoreAccess)?;
        self.row_menu = None;
        self.dialog = Some(Dialog::RestoreAccess(RestoreAccessDialog::new(
            project.key.clone(),
            project.name.clone(),
        )));
        Ok(())
    }

    /// Grant the current user access and reload; closes the dialog on success.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the dialog stays open.
    pub async fn submit_restore_access(&mut self) -> Result<(), ActionError> {
        if !matches!(self.dialog, Some(Dialog::RestoreAccess(_))) {
            return Err(ActionError::NoDialog {
                expected: "restore access",
            });
        }
        self.submit().await.map(|_| ())
    }

    // Delete

    /// Delete is enabled while something is selected.
    #[must_use]
    pub fn delete_enabled(&self) -> bool {
        !self.state.selected.is_empty()
    }

    /// Open the delete confirmation for the selection.
    ///
    /// # Errors
    ///
    /// Fails when nothing is selected.
    pub fn open_delete(&mut self) -> Result<(), ActionError> {
        if !self.delete_enabled() {
            return Err(ActionError::Validation {
                reason: "no project selected",
            });
        }
        let keys = select_selected_rows(&self.state)
            .iter()
            .map(|project| project.key.clone())
            .collect();
        self.dialog = Some(Dialog::Delete(DeleteDialog::new(keys)));
        Ok(())
    }

    /// Delete the confirmed projects, clear the selection and reload.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the dialog stays open.
    pub async fn submit_delete(&mut self) -> Result<(), ActionError> {
        if !matches!(self.dialog, Some(Dialog::Delete(_))) {
            return Err(ActionError::NoDialog { expected: "delete" });
        }
        self.submit().await.map(|_| ())
    }

    // Default visibility

    /// Open the default-visibility dialog.
    pub fn open_default_visibility(&mut self) {
        self.dialog = Some(Dialog::Visibility(VisibilityDialog::new(
            self.default_visibility,
            self.features.github_provisioning,
        )));
    }

    /// Pick a visibility in the open dialog.
    ///
    /// # Errors
    ///
    /// Fails when the visibility dialog is not open.
    pub fn choose_visibility(&mut self, visibility: Visibility) -> Result<(), ActionError> {
        let Some(Dialog::Visibility(dialog)) = &mut self.dialog else {
            return Err(ActionError::NoDialog {
                expected: "default visibility",
            });
        };
        dialog.choice = visibility;
        Ok(())
    }

    /// Store the chosen default visibility, read it back and reload; closes
    /// the dialog on success.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the dialog stays open.
    pub async fn submit_default_visibility(&mut self) -> Result<(), ActionError> {
        if !matches!(self.dialog, Some(Dialog::Visibility(_))) {
            return Err(ActionError::NoDialog {
                expected: "default visibility",
            });
        }
        self.submit().await.map(|_| ())
    }

    // Create project

    /// Creation is offered to holders of the provisioning permission.
    #[must_use]
    pub fn can_create_project(&self) -> bool {
        self.user
            .has_global_permission(GlobalPermission::Provisioning)
    }

    /// Open the create-project form with the instance defaults.
    ///
    /// # Errors
    ///
    /// Fails when the user may not create projects.
    pub fn open_create_project(&mut self) -> Result<(), ActionError> {
        if !self.can_create_project() {
            return Err(ActionError::PermissionDenied {
                action: "qualifiers.create",
            });
        }
        self.dialog = Some(Dialog::CreateProject(CreateProjectForm::new(
            self.main_branch.clone(),
            self.default_visibility,
        )));
        Ok(())
    }

    /// Validate and create the project, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidProject`] without calling the backend
    /// when the form is invalid, or the backend failure.
    pub async fn submit_create_project(&mut self) -> Result<Project, ActionError> {
        const EXPECTED: ActionError = ActionError::NoDialog {
            expected: "create project",
        };
        if !matches!(self.dialog, Some(Dialog::CreateProject(_))) {
            return Err(EXPECTED);
        }
        match self.submit().await? {
            Submitted::ProjectCreated(project) => Ok(project),
            _ => Err(EXPECTED),
        }
    }

    /// Close the open dialog.
    pub fn cancel_dialog(&mut self) {
        self.dialog = None;
    }

    // Submission

    /// Move the open dialog to `Submitting` and snapshot the call it makes.
    ///
    /// # Errors
    ///
    /// Fails when no dialog is open, a submission is already in flight or
    /// the dialog content is invalid. The backend is never called then.
    pub fn begin_submit(&mut self) -> Result<Submission, ActionError> {
        let Some(dialog) = &mut self.dialog else {
            return Err(ActionError::NoDialog { expected: "any" });
        };
        let submission = match dialog {
            Dialog::Template(template) => {
                let (template_id, keys) = template.begin_submit()?;
                info!(template = %template_id, count = keys.len(), "applying permission template");
                Submission::ApplyTemplate { template_id, keys }
            }
            Dialog::CreateProject(_) => Submission::CreateProject(dialog.begin_create()?),
            Dialog::Delete(delete) => {
                let keys = delete.keys.clone();
                dialog.begin()?;
                Submission::Delete { keys }
            }
            Dialog::RestoreAccess(restore) => {
                let key = restore.key.clone();
                dialog.begin()?;
                Submission::RestoreAccess { key }
            }
            Dialog::Visibility(visibility) => {
                let choice = visibility.choice;
                dialog.begin()?;
                Submission::DefaultVisibility { choice }
            }
        };
        Ok(submission)
    }

    /// Settle the dialog with the facade outcome and apply its effect on the
    /// screen. Every success issues a reload, returned for the caller to run.
    ///
    /// # Errors
    ///
    /// Returns the backend failure after recording it on the dialog.
    pub fn finish_submit(
        &mut self,
        result: ServiceResult<Submitted>,
    ) -> Result<(Submitted, PageFetch), ActionError> {
        if result.as_ref().is_ok_and(Submitted::closes_dialog) {
            self.dialog = None;
        } else if let Some(dialog) = &mut self.dialog {
            dialog.finish(&result);
        }
        let submitted = result?;
        match &submitted {
            Submitted::TemplateApplied { count } => {
                info!(count, "permission template applied");
            }
            Submitted::Deleted { keys } => {
                info!(count = keys.len(), "projects deleted");
                remove_rows(&mut self.state, keys);
                clear_selection(&mut self.state);
            }
            Submitted::AccessRestored { key } => {
                info!(project = %key, login = %self.user.login, "access restored");
            }
            Submitted::DefaultVisibility(visibility) => {
                info!(visibility = visibility.as_str(), "default visibility changed");
                self.default_visibility = *visibility;
            }
            Submitted::ProjectCreated(project) => {
                info!(project = %project.key, "project created");
            }
        }
        Ok((submitted, self.begin_reload()))
    }

    /// Submit the open dialog and refresh the list.
    ///
    /// A failed refresh is reported through [`Self::list_error`]; the
    /// mutation itself already succeeded.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_submit`] and [`Self::finish_submit`].
    pub async fn submit(&mut self) -> Result<Submitted, ActionError> {
        let submission = self.begin_submit()?;
        let result = submission.send(&self.services).await;
        let (submitted, reload) = self.finish_submit(result)?;
        let response = self.fetch(&reload).await;
        if let Err(err) = self.apply_page(&reload.request, response)
            && !err.is_silent()
        {
            warn!(error = %err, "reload after submission failed");
        }
        Ok(submitted)
    }
}
