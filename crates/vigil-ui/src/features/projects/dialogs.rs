//! Dialog state machines for the projects screen.
//!
//! # Design
//! - Every dialog carries a [`DialogPhase`]; a backend failure moves it to
//!   `Failed` and keeps it open so the same submission can be retried.
//! - Dialogs hold snapshots (selected keys, chosen template) so late
//!   selection changes never alter an in-flight submission.

use vigil_api_models::{NewProject, PermissionTemplate, ProjectKey, Visibility};
use vigil_core::ServiceError;

use crate::features::projects::bulk::BulkPartition;
use crate::features::projects::error::{ActionError, CreateProjectError};
use crate::i18n::TranslationBundle;

/// Maximum length of a project display name.
pub const MAX_NAME_LENGTH: usize = 255;
/// Maximum length of a project key.
pub const MAX_KEY_LENGTH: usize = 400;

/// Submission lifecycle shared by every dialog.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum DialogPhase {
    /// Waiting for user input.
    #[default]
    Editing,
    /// A facade call is in flight.
    Submitting,
    /// The last submission succeeded.
    Succeeded,
    /// The last submission failed with the backend message.
    Failed(String),
}

impl DialogPhase {
    /// Whether a facade call is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// Error message to render inline, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    fn begin(&mut self) -> Result<(), ActionError> {
        if self.is_submitting() {
            return Err(ActionError::Validation {
                reason: "submission already in progress",
            });
        }
        *self = Self::Submitting;
        Ok(())
    }

    fn finish<T>(&mut self, result: &Result<T, ServiceError>) {
        *self = match result {
            Ok(_) => Self::Succeeded,
            Err(err) => Self::Failed(err.to_string()),
        };
    }
}

/// Projects a template dialog applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateTarget {
    /// Selection snapshot of the bulk action.
    Bulk(BulkPartition),
    /// One project picked from its row menu.
    Single {
        /// Project key.
        key: ProjectKey,
        /// Display name.
        name: String,
    },
}

impl TemplateTarget {
    /// Keys that receive the template.
    #[must_use]
    pub fn keys(&self) -> Vec<ProjectKey> {
        match self {
            Self::Bulk(partition) => partition.local.clone(),
            Self::Single { key, .. } => vec![key.clone()],
        }
    }
}

/// Bulk or single-project permission template dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateDialog {
    /// Projects receiving the template.
    pub target: TemplateTarget,
    /// Templates offered in the picker.
    pub templates: Vec<PermissionTemplate>,
    /// Chosen template id.
    pub selected: Option<String>,
    /// Submission phase.
    pub phase: DialogPhase,
}

impl TemplateDialog {
    /// Bulk dialog; the first template is preselected.
    #[must_use]
    pub fn bulk(partition: BulkPartition, templates: Vec<PermissionTemplate>) -> Self {
        let selected = templates.first().map(|template| template.id.clone());
        Self {
            target: TemplateTarget::Bulk(partition),
            templates,
            selected,
            phase: DialogPhase::Editing,
        }
    }

    /// Single-project dialog; a template must be picked explicitly.
    #[must_use]
    pub const fn single(key: ProjectKey, name: String, templates: Vec<PermissionTemplate>) -> Self {
        Self {
            target: TemplateTarget::Single { key, name },
            templates,
            selected: None,
            phase: DialogPhase::Editing,
        }
    }

    /// Pick a template; unknown ids are ignored.
    pub fn select(&mut self, template_id: &str) -> bool {
        if !self.templates.iter().any(|template| template.id == template_id) {
            return false;
        }
        self.selected = Some(template_id.to_string());
        true
    }

    /// Whether the Apply button is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        let has_targets = match &self.target {
            TemplateTarget::Bulk(partition) => partition.can_apply(),
            TemplateTarget::Single { .. } => true,
        };
        has_targets && self.selected.is_some() && !self.phase.is_submitting()
    }

    /// Enter `Submitting` and hand out the template and keys to send.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Validation`] when nothing can be applied.
    pub fn begin_submit(&mut self) -> Result<(String, Vec<ProjectKey>), ActionError> {
        if let TemplateTarget::Bulk(partition) = &self.target
            && !partition.can_apply()
        {
            return Err(ActionError::Validation {
                reason: "no project eligible for a permission template",
            });
        }
        let Some(template_id) = self.selected.clone() else {
            return Err(ActionError::Validation {
                reason: "no permission template selected",
            });
        };
        self.phase.begin()?;
        Ok((template_id, self.target.keys()))
    }

    /// Record the facade outcome.
    pub fn finish(&mut self, result: &Result<(), ServiceError>) {
        self.phase.finish(result);
    }

    /// Localised explanation lines for the dialog body.
    #[must_use]
    pub fn messages(&self, bundle: &TranslationBundle) -> Vec<String> {
        match &self.target {
            TemplateTarget::Bulk(partition) => partition.messages(bundle),
            TemplateTarget::Single { name, .. } => {
                vec![bundle.name_text("projects_role.apply_template.to_project", name)]
            }
        }
    }
}

/// Delete confirmation for the selected projects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteDialog {
    /// Keys to delete.
    pub keys: Vec<ProjectKey>,
    /// Submission phase.
    pub phase: DialogPhase,
}

impl DeleteDialog {
    /// Confirmation for `keys`.
    #[must_use]
    pub const fn new(keys: Vec<ProjectKey>) -> Self {
        Self {
            keys,
            phase: DialogPhase::Editing,
        }
    }

    /// Warning naming the number of projects.
    #[must_use]
    pub fn message(&self, bundle: &TranslationBundle) -> String {
        bundle.count_text(
            "projects_management.delete_selected_warning",
            self.keys.len(),
        )
    }
}

/// Restore-access confirmation for one project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreAccessDialog {
    /// Project key.
    pub key: ProjectKey,
    /// Display name.
    pub name: String,
    /// Submission phase.
    pub phase: DialogPhase,
}

impl RestoreAccessDialog {
    /// Confirmation for one project.
    #[must_use]
    pub const fn new(key: ProjectKey, name: String) -> Self {
        Self {
            key,
            name,
            phase: DialogPhase::Editing,
        }
    }

    /// Confirmation text.
    #[must_use]
    pub fn message(&self, bundle: &TranslationBundle) -> String {
        bundle.name_text("global_permissions.restore_access_message", &self.name)
    }
}

/// Default-visibility change dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityDialog {
    /// Visibility currently configured.
    pub current: Visibility,
    /// Visibility picked in the dialog.
    pub choice: Visibility,
    /// Use the GitHub-specific warning.
    pub github_warning: bool,
    /// Submission phase.
    pub phase: DialogPhase,
}

impl VisibilityDialog {
    /// Dialog preselecting the current visibility.
    #[must_use]
    pub const fn new(current: Visibility, github_warning: bool) -> Self {
        Self {
            current,
            choice: current,
            github_warning,
            phase: DialogPhase::Editing,
        }
    }

    /// Translation key of the warning paragraph.
    #[must_use]
    pub const fn warning_key(&self) -> &'static str {
        if self.github_warning {
            "settings.change_visibility.warning_github"
        } else {
            "settings.change_visibility.warning"
        }
    }
}

/// Create-project form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateProjectForm {
    /// Display name.
    pub display_name: String,
    /// Project key.
    pub key: String,
    /// Whether the key was edited by hand and no longer follows the name.
    pub key_touched: bool,
    /// Main branch name.
    pub main_branch: String,
    /// Visibility of the new project.
    pub visibility: Visibility,
    /// Submission phase.
    pub phase: DialogPhase,
}

impl CreateProjectForm {
    /// Empty form with the instance defaults.
    #[must_use]
    pub fn new(main_branch: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            display_name: String::new(),
            key: String::new(),
            key_touched: false,
            main_branch: main_branch.into(),
            visibility,
            phase: DialogPhase::Editing,
        }
    }

    /// Update the name; the key follows it until edited by hand.
    pub fn set_display_name(&mut self, name: &str) {
        self.display_name = name.to_string();
        if !self.key_touched {
            self.key = derive_key(name);
        }
    }

    /// Update the key and stop deriving it from the name.
    pub fn set_key(&mut self, key: &str) {
        self.key = key.to_string();
        self.key_touched = true;
    }

    /// Update the main branch name.
    pub fn set_main_branch(&mut self, branch: &str) {
        self.main_branch = branch.to_string();
    }

    /// Check the form and build the creation request.
    ///
    /// # Errors
    ///
    /// Returns the first rule the form violates.
    pub fn validate(&self) -> Result<NewProject, CreateProjectError> {
        let name = self.display_name.trim();
        if name.is_empty() {
            return Err(CreateProjectError::MissingField { field: "name" });
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(CreateProjectError::NameTooLong {
                max: MAX_NAME_LENGTH,
            });
        }
        validate_key(&self.key)?;
        let branch = self.main_branch.trim();
        if branch.is_empty() {
            return Err(CreateProjectError::MissingField {
                field: "main_branch",
            });
        }
        Ok(NewProject {
            name: name.to_string(),
            key: ProjectKey::new(self.key.clone()),
            main_branch: branch.to_string(),
            visibility: self.visibility,
        })
    }

    fn begin_submit(&mut self) -> Result<NewProject, ActionError> {
        let project = self.validate()?;
        self.phase.begin()?;
        Ok(project)
    }
}

const fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':')
}

fn validate_key(key: &str) -> Result<(), CreateProjectError> {
    if key.is_empty() {
        return Err(CreateProjectError::MissingField { field: "key" });
    }
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(CreateProjectError::KeyTooLong {
            max: MAX_KEY_LENGTH,
        });
    }
    if !key.chars().all(is_key_char) {
        return Err(CreateProjectError::KeyInvalidCharacters);
    }
    if key.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(CreateProjectError::KeyAllDigits);
    }
    Ok(())
}

/// Key suggested for a display name: invalid characters become `-`.
#[must_use]
pub fn derive_key(name: &str) -> String {
    name.trim()
        .chars()
        .map(|ch| if is_key_char(ch) { ch } else { '-' })
        .take(MAX_KEY_LENGTH)
        .collect()
}

/// The one dialog the screen may show at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dialog {
    /// Bulk or single apply-template.
    Template(TemplateDialog),
    /// Delete confirmation.
    Delete(DeleteDialog),
    /// Restore-access confirmation.
    RestoreAccess(RestoreAccessDialog),
    /// Default-visibility change.
    Visibility(VisibilityDialog),
    /// Create project.
    CreateProject(CreateProjectForm),
}

impl Dialog {
    /// Submission phase of the open dialog.
    #[must_use]
    pub const fn phase(&self) -> &DialogPhase {
        match self {
            Self::Template(dialog) => &dialog.phase,
            Self::Delete(dialog) => &dialog.phase,
            Self::RestoreAccess(dialog) => &dialog.phase,
            Self::Visibility(dialog) => &dialog.phase,
            Self::CreateProject(form) => &form.phase,
        }
    }

    pub(crate) fn phase_mut(&mut self) -> &mut DialogPhase {
        match self {
            Self::Template(dialog) => &mut dialog.phase,
            Self::Delete(dialog) => &mut dialog.phase,
            Self::RestoreAccess(dialog) => &mut dialog.phase,
            Self::Visibility(dialog) => &mut dialog.phase,
            Self::CreateProject(form) => &mut form.phase,
        }
    }

    /// Enter `Submitting` for dialogs whose payload needs no further checks.
    pub(crate) fn begin(&mut self) -> Result<(), ActionError> {
        self.phase_mut().begin()
    }

    /// Record the facade outcome.
    pub(crate) fn finish<T>(&mut self, result: &Result<T, ServiceError>) {
        self.phase_mut().finish(result);
    }

    /// Validate and enter `Submitting` for the create-project form.
    pub(crate) fn begin_create(&mut self) -> Result<NewProject, ActionError> {
        match self {
            Self::CreateProject(form) => form.begin_submit(),
            _ => Err(ActionError::NoDialog {
                expected: "create project",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocaleCode;

    fn templates() -> Vec<PermissionTemplate> {
        vec![
            PermissionTemplate {
                id: "template1".into(),
                name: "Permission Template 1".into(),
            },
            PermissionTemplate {
                id: "template2".into(),
                name: "Permission Template 2".into(),
            },
        ]
    }

    fn local_partition(keys: &[&str]) -> BulkPartition {
        BulkPartition {
            local: keys.iter().copied().map(ProjectKey::new).collect(),
            ..BulkPartition::default()
        }
    }

    #[test]
    fn bulk_dialog_preselects_first_template() {
        let dialog = TemplateDialog::bulk(local_partition(&["a"]), templates());
        assert_eq!(dialog.selected.as_deref(), Some("template1"));
        assert!(dialog.can_submit());
    }

    #[test]
    fn single_dialog_requires_a_choice() {
        let mut dialog =
            TemplateDialog::single(ProjectKey::new("a"), "A".into(), templates());
        assert!(!dialog.can_submit());
        assert!(matches!(
            dialog.begin_submit(),
            Err(ActionError::Validation { .. })
        ));
        assert!(!dialog.select("missing"));
        assert!(dialog.select("template2"));
        let (template, keys) = dialog.begin_submit().expect("submittable");
        assert_eq!(template, "template2");
        assert_eq!(keys, vec![ProjectKey::new("a")]);
        assert!(dialog.phase.is_submitting());
    }

    #[test]
    fn failed_submission_stays_open_for_retry() {
        let mut dialog = TemplateDialog::bulk(local_partition(&["a", "b"]), templates());
        dialog.begin_submit().expect("first submit");
        assert!(matches!(
            dialog.begin_submit(),
            Err(ActionError::Validation { .. })
        ));
        dialog.finish(&Err(ServiceError::rejected("apply_template", "boom")));
        assert_eq!(dialog.phase.error(), Some("boom"));
        let (_, keys) = dialog.begin_submit().expect("retry");
        assert_eq!(keys.len(), 2);
        dialog.finish(&Ok(()));
        assert_eq!(dialog.phase, DialogPhase::Succeeded);
    }

    #[test]
    fn only_managed_bulk_dialog_cannot_submit() {
        let partition = BulkPartition {
            managed: vec![ProjectKey::new("gh")],
            ..BulkPartition::default()
        };
        let mut dialog = TemplateDialog::bulk(partition, templates());
        assert!(!dialog.can_submit());
        assert!(dialog.begin_submit().is_err());
        assert_eq!(dialog.phase, DialogPhase::Editing);
    }

    #[test]
    fn delete_message_counts_keys() {
        let dialog = DeleteDialog::new(vec![ProjectKey::new("a"), ProjectKey::new("b")]);
        let bundle = TranslationBundle::new(LocaleCode::En);
        assert!(dialog.message(&bundle).contains("delete 2 selected"));
    }

    #[test]
    fn visibility_dialog_picks_warning_variant() {
        let dialog = VisibilityDialog::new(Visibility::Private, true);
        assert_eq!(dialog.choice, Visibility::Private);
        assert_eq!(
            dialog.warning_key(),
            "settings.change_visibility.warning_github"
        );
        let plain = VisibilityDialog::new(Visibility::Public, false);
        assert_eq!(plain.warning_key(), "settings.change_visibility.warning");
    }

    #[test]
    fn key_follows_name_until_edited() {
        let mut form = CreateProjectForm::new("main", Visibility::Public);
        form.set_display_name("My Project/1");
        assert_eq!(form.key, "My-Project-1");
        form.set_key("custom");
        form.set_display_name("Other");
        assert_eq!(form.key, "custom");
    }

    #[test]
    fn form_rules_are_checked_in_order() {
        let mut form = CreateProjectForm::new("main", Visibility::Public);
        assert_eq!(
            form.validate(),
            Err(CreateProjectError::MissingField { field: "name" })
        );
        form.set_display_name(&"n".repeat(MAX_NAME_LENGTH + 1));
        assert_eq!(
            form.validate(),
            Err(CreateProjectError::NameTooLong {
                max: MAX_NAME_LENGTH
            })
        );
        form.set_display_name("Name");
        form.set_key("");
        assert_eq!(
            form.validate(),
            Err(CreateProjectError::MissingField { field: "key" })
        );
        form.set_key(&"k".repeat(MAX_KEY_LENGTH + 1));
        assert_eq!(
            form.validate(),
            Err(CreateProjectError::KeyTooLong {
                max: MAX_KEY_LENGTH
            })
        );
        form.set_key("bad key");
        assert_eq!(
            form.validate(),
            Err(CreateProjectError::KeyInvalidCharacters)
        );
        form.set_key("12345");
        assert_eq!(form.validate(), Err(CreateProjectError::KeyAllDigits));
        form.set_key("org:name_1.0-x");
        form.set_main_branch("  ");
        assert_eq!(
            form.validate(),
            Err(CreateProjectError::MissingField {
                field: "main_branch"
            })
        );
        form.set_main_branch("develop");
        let project = form.validate().expect("valid form");
        assert_eq!(project.key.as_str(), "org:name_1.0-x");
        assert_eq!(project.main_branch, "develop");
    }

    #[test]
    fn invalid_form_never_enters_submitting() {
        let mut dialog = Dialog::CreateProject(CreateProjectForm::new("main", Visibility::Public));
        assert!(matches!(
            dialog.begin_create(),
            Err(ActionError::InvalidProject(_))
        ));
        assert_eq!(dialog.phase(), &DialogPhase::Editing);
    }
}
