//! Projects-management views.
//!
//! # Design
//! - Rendering reads a `ProjectsScreen` snapshot; every user intent is a
//!   [`Command`] emitted through one callback.
//! - [`apply_command`] is the only place that mutates the screen.

use chrono::NaiveDate;
use vigil_api_models::{Project, ProjectKey, Qualifier, Visibility};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::components::bulk_action_bar::BulkActionBar;
use crate::components::modal::Modal;
use crate::features::projects::dialogs::{CreateProjectForm, Dialog, DialogPhase, TemplateTarget};
use crate::features::projects::error::ActionError;
use crate::features::projects::row_actions::{RowAction, permissions_path};
use crate::features::projects::screen::{ProjectsScreen, RowView};
use crate::features::projects::state::{CheckAllState, FilterUpdate};
use crate::i18n::TranslationBundle;

/// User intents raised by the projects page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Merge a filter update.
    Filter(FilterUpdate),
    /// Replace the search text.
    Search(String),
    /// Append the next page.
    LoadMore,
    /// Toggle one row.
    Toggle(ProjectKey),
    /// Check or uncheck every visible row.
    ToggleAll,
    /// Open the bulk apply-template dialog.
    OpenBulkApply,
    /// Resolve and open a row menu.
    OpenRowMenu(ProjectKey),
    /// Open the single-project apply-template dialog.
    OpenApplyTemplate(ProjectKey),
    /// Open the restore-access confirmation.
    OpenRestoreAccess(ProjectKey),
    /// Pick a template.
    SelectTemplate(String),
    /// Open the delete confirmation.
    OpenDelete,
    /// Open the default-visibility dialog.
    OpenVisibility,
    /// Pick a default visibility.
    ChooseVisibility(Visibility),
    /// Open the create-project form.
    OpenCreate,
    /// Edit the project display name.
    EditName(String),
    /// Edit the project key.
    EditKey(String),
    /// Edit the main branch name.
    EditBranch(String),
    /// Submit the open dialog.
    Submit,
    /// Close the open dialog.
    Cancel,
}

/// Apply a command to the screen.
///
/// # Errors
///
/// Propagates the failure of the underlying screen action.
pub async fn apply_command(screen: &mut ProjectsScreen, command: Command) -> Result<(), ActionError> {
    match command {
        Command::Filter(update) => screen.set_filter(update).await,
        Command::Search(text) => screen.set_search(&text).await,
        Command::LoadMore => screen.load_more().await,
        Command::Toggle(key) => {
            screen.toggle(&key);
            Ok(())
        }
        Command::ToggleAll => {
            if screen.check_all_state() == CheckAllState::None {
                screen.select_all();
            } else {
                screen.clear_selection();
            }
            Ok(())
        }
        Command::OpenBulkApply => screen.open_bulk_apply().await,
        Command::OpenRowMenu(key) => screen.open_row_menu(&key).await.map(|_| ()),
        Command::OpenApplyTemplate(key) => screen.open_apply_template(&key).await,
        Command::OpenRestoreAccess(key) => screen.open_restore_access(&key),
        Command::SelectTemplate(id) => screen.select_template(&id),
        Command::OpenDelete => screen.open_delete(),
        Command::OpenVisibility => {
            screen.open_default_visibility();
            Ok(())
        }
        Command::ChooseVisibility(visibility) => screen.choose_visibility(visibility),
        Command::OpenCreate => screen.open_create_project(),
        Command::EditName(name) => edit_form(screen, |form| form.set_display_name(&name)),
        Command::EditKey(key) => edit_form(screen, |form| form.set_key(&key)),
        Command::EditBranch(branch) => edit_form(screen, |form| form.set_main_branch(&branch)),
        Command::Submit => screen.submit().await.map(|_| ()),
        Command::Cancel => {
            screen.cancel_dialog();
            Ok(())
        }
    }
}

fn edit_form(
    screen: &mut ProjectsScreen,
    edit: impl FnOnce(&mut CreateProjectForm),
) -> Result<(), ActionError> {
    let form = screen.create_form_mut().ok_or(ActionError::NoDialog {
        expected: "create project",
    })?;
    edit(form);
    Ok(())
}

/// Render the whole page.
#[must_use]
pub fn render(screen: &ProjectsScreen, bundle: &TranslationBundle, on_command: &Callback<Command>) -> Html {
    html! {
        <section class="projects-management">
            { render_header(screen, bundle, on_command) }
            { render_filters(screen, bundle, on_command) }
            { render_toolbar(screen, bundle, on_command) }
            { render_table(screen, bundle, on_command) }
            { render_footer(screen, bundle, on_command) }
            { screen.dialog().map_or_else(Html::default, |dialog| render_dialog(dialog, bundle, on_command)) }
        </section>
    }
}

fn emit(on_command: &Callback<Command>, command: Command) -> Callback<MouseEvent> {
    let on_command = on_command.clone();
    Callback::from(move |_| on_command.emit(command.clone()))
}

fn render_header(screen: &ProjectsScreen, bundle: &TranslationBundle, on_command: &Callback<Command>) -> Html {
    let visibility_label = bundle.text(
        &format!("visibility.{}", screen.default_visibility().as_str()),
        screen.default_visibility().as_str(),
    );
    html! {
        <header class="page-header">
            <h1>{bundle.text("projects_management.page", "Projects Management")}</h1>
            <div class="page-actions">
                <span>
                    {format!("{}: {visibility_label}", bundle.text("settings.default_visibility", "Default visibility"))}
                </span>
                <button class="btn btn-ghost" onclick={emit(on_command, Command::OpenVisibility)}>
                    {bundle.text("settings.change_visibility.label", "Change")}
                </button>
                if screen.can_create_project() {
                    <button class="btn btn-primary" onclick={emit(on_command, Command::OpenCreate)}>
                        {bundle.text("qualifiers.create", "Create Project")}
                    </button>
                }
            </div>
        </header>
    }
}

fn render_filters(screen: &ProjectsScreen, bundle: &TranslationBundle, on_command: &Callback<Command>) -> Html {
    let filters = screen.filters();
    let on_qualifier = {
        let on_command = on_command.clone();
        Callback::from(move |event: Event| {
            let select: HtmlSelectElement = event.target_unchecked_into();
            if let Some(qualifier) = Qualifier::from_code(&select.value()) {
                on_command.emit(Command::Filter(FilterUpdate {
                    qualifier: Some(qualifier),
                    ..FilterUpdate::default()
                }));
            }
        })
    };
    let on_visibility = {
        let on_command = on_command.clone();
        Callback::from(move |event: Event| {
            let select: HtmlSelectElement = event.target_unchecked_into();
            let visibility = match select.value().as_str() {
                "public" => Some(Visibility::Public),
                "private" => Some(Visibility::Private),
                _ => None,
            };
            on_command.emit(Command::Filter(FilterUpdate {
                visibility: Some(visibility),
                ..FilterUpdate::default()
            }));
        })
    };
    let on_date = {
        let on_command = on_command.clone();
        Callback::from(move |event: Event| {
            let input: HtmlInputElement = event.target_unchecked_into();
            let cutoff = NaiveDate::parse_from_str(&input.value(), "%Y-%m-%d").ok();
            on_command.emit(Command::Filter(FilterUpdate {
                analyzed_before: Some(cutoff),
                ..FilterUpdate::default()
            }));
        })
    };
    let on_provisioned = {
        let on_command = on_command.clone();
        Callback::from(move |event: Event| {
            let input: HtmlInputElement = event.target_unchecked_into();
            on_command.emit(Command::Filter(FilterUpdate {
                provisioned_only: Some(input.checked()),
                ..FilterUpdate::default()
            }));
        })
    };
    let on_search = {
        let on_command = on_command.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            on_command.emit(Command::Search(input.value()));
        })
    };
    let date_value = filters
        .analyzed_before
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    html! {
        <div class="filters">
            if screen.shows_qualifier_filter() {
                <select aria-label={bundle.text("projects_management.filter_by_component", "Type")} onchange={on_qualifier}>
                    { for screen.qualifiers().iter().map(|qualifier| html! {
                        <option value={qualifier.code()} selected={*qualifier == filters.qualifier}>
                            {bundle.text(&format!("qualifiers.{}", qualifier.code()), qualifier.code())}
                        </option>
                    }) }
                </select>
            }
            <select aria-label={bundle.text("projects_management.filter_by_visibility", "Visibility")} onchange={on_visibility}>
                <option value="" selected={filters.visibility.is_none()}>
                    {bundle.text("projects_management.any_visibility", "Any")}
                </option>
                { for [Visibility::Public, Visibility::Private].into_iter().map(|visibility| html! {
                    <option value={visibility.as_str()} selected={filters.visibility == Some(visibility)}>
                        {bundle.text(&format!("visibility.{}", visibility.as_str()), visibility.as_str())}
                    </option>
                }) }
            </select>
            <label>
                {bundle.text("projects_management.last_analysis_before", "Last analysis before")}
                <input type="date" value={date_value} onchange={on_date} />
            </label>
            if screen.shows_provisioned_filter() {
                <label title={bundle.text("projects_management.only_provisioned_help", "")}>
                    <input type="checkbox" checked={filters.provisioned_only} onchange={on_provisioned} />
                    {bundle.text("projects_management.only_provisioned", "Only provisioned")}
                </label>
            }
            <input
                type="search"
                placeholder={bundle.text("projects_management.search_placeholder", "Search")}
                value={filters.search.clone()}
                oninput={on_search}
            />
        </div>
    }
}

fn render_toolbar(screen: &ProjectsScreen, bundle: &TranslationBundle, on_command: &Callback<Command>) -> Html {
    let all_checked = screen.check_all_state() != CheckAllState::None;
    let toggle_label = if all_checked {
        bundle.text("projects_management.uncheck_all", "Uncheck all")
    } else {
        bundle.text("projects_management.check_all", "Check all")
    };
    html! {
        <BulkActionBar
            toggle_label={toggle_label}
            selected_label={bundle.count_text("projects_management.selected", screen.selected_count())}
            all_checked={all_checked}
            on_toggle_all={emit(on_command, Command::ToggleAll)}
        >
            <button
                class="btn"
                disabled={!screen.bulk_apply_enabled()}
                onclick={emit(on_command, Command::OpenBulkApply)}
            >
                {bundle.text("permission_templates.bulk_apply_permission_template.title", "Bulk apply")}
            </button>
            <button
                class="btn btn-error"
                disabled={!screen.delete_enabled()}
                onclick={emit(on_command, Command::OpenDelete)}
            >
                {bundle.text("projects_management.delete_selected", "Delete")}
            </button>
        </BulkActionBar>
    }
}

fn render_table(screen: &ProjectsScreen, bundle: &TranslationBundle, on_command: &Callback<Command>) -> Html {
    let rows = screen.rows();
    if rows.is_empty() {
        let message = screen.list_error().map_or_else(
            || bundle.text("projects_management.no_projects", "No projects"),
            |_| bundle.text("projects_management.load_failed", "Load failed"),
        );
        return html! { <p class="empty-state">{message}</p> };
    }
    html! {
        <table class="projects-table">
            <tbody>
                { for rows.iter().map(|row| render_row(screen, row, bundle, on_command)) }
            </tbody>
        </table>
    }
}

fn render_row(
    screen: &ProjectsScreen,
    row: &RowView,
    bundle: &TranslationBundle,
    on_command: &Callback<Command>,
) -> Html {
    let project: &Project = &row.project;
    let menu = screen
        .row_menu()
        .filter(|menu| menu.key == project.key)
        .map(|menu| menu.actions.actions().to_vec());
    let last_analysis = project.last_analysis_date.map_or_else(
        || bundle.text("projects_management.never_analyzed", "Never analyzed"),
        |date| date.format("%Y-%m-%d").to_string(),
    );
    html! {
        <tr key={project.key.as_str().to_string()}>
            <td>
                <input
                    type="checkbox"
                    aria-label={bundle.name_text("projects_management.select_project", &project.name)}
                    checked={row.selected}
                    onclick={emit(on_command, Command::Toggle(project.key.clone()))}
                />
            </td>
            <td>
                {project.name.clone()}
                if row.local_badge {
                    <span class="badge">{bundle.text("projects_management.local_badge", "local")}</span>
                }
            </td>
            <td>{bundle.text(&format!("visibility.{}", project.visibility.as_str()), project.visibility.as_str())}</td>
            <td>{project.key.as_str().to_string()}</td>
            <td>{last_analysis}</td>
            <td>
                <button
                    class="btn btn-ghost"
                    aria-label={bundle.name_text("projects_management.show_actions_for", &project.name)}
                    onclick={emit(on_command, Command::OpenRowMenu(project.key.clone()))}
                >
                    {"⋯"}
                </button>
                if let Some(actions) = menu {
                    <ul class="menu">
                        { for actions.into_iter().map(|action| render_action(project, action, bundle, on_command)) }
                    </ul>
                }
            </td>
        </tr>
    }
}

fn render_action(
    project: &Project,
    action: RowAction,
    bundle: &TranslationBundle,
    on_command: &Callback<Command>,
) -> Html {
    let label = bundle.text(action.label_key(), action.label_key());
    match action {
        RowAction::EditPermissions | RowAction::ShowPermissions => html! {
            <li><a href={permissions_path(project)}>{label}</a></li>
        },
        RowAction::ApplyTemplate => html! {
            <li><button onclick={emit(on_command, Command::OpenApplyTemplate(project.key.clone()))}>{label}</button></li>
        },
        RowAction::RestoreAccess => html! {
            <li><button onclick={emit(on_command, Command::OpenRestoreAccess(project.key.clone()))}>{label}</button></li>
        },
    }
}

fn render_footer(screen: &ProjectsScreen, bundle: &TranslationBundle, on_command: &Callback<Command>) -> Html {
    let shown = screen.rows().len();
    // An empty table already reports the failure in place of the rows.
    let append_error = screen.list_error().filter(|_| shown > 0).map(str::to_string);
    html! {
        <footer class="list-footer" aria-busy={screen.is_loading().to_string()}>
            <span>{bundle.count_text("projects_management.shown", shown)}</span>
            if screen.is_loading() {
                <span class="spinner" role="status">{bundle.text("projects_management.loading", "Loading")}</span>
            }
            if let Some(message) = append_error {
                <span class="alert alert-error" role="alert">{message}</span>
            }
            if screen.has_more() {
                <button
                    class="btn"
                    disabled={screen.is_loading()}
                    onclick={emit(on_command, Command::LoadMore)}
                >
                    {bundle.text("projects_management.show_more", "Show more")}
                </button>
            }
        </footer>
    }
}

fn render_dialog(dialog: &Dialog, bundle: &TranslationBundle, on_command: &Callback<Command>) -> Html {
    let on_submit = {
        let on_command = on_command.clone();
        Callback::from(move |()| on_command.emit(Command::Submit))
    };
    let on_close = {
        let on_command = on_command.clone();
        Callback::from(move |()| on_command.emit(Command::Cancel))
    };
    let error = dialog.phase().error().map(|message| AttrValue::from(message.to_string()));
    let submitting = dialog.phase().is_submitting();
    let cancel_label = bundle.text("actions.cancel", "Cancel");

    match dialog {
        Dialog::Template(template) => {
            let on_select = {
                let on_command = on_command.clone();
                Callback::from(move |event: Event| {
                    let select: HtmlSelectElement = event.target_unchecked_into();
                    on_command.emit(Command::SelectTemplate(select.value()));
                })
            };
            let (title, success) = match &template.target {
                TemplateTarget::Bulk(_) => (
                    bundle.text("permission_templates.bulk_apply_permission_template.title", "Bulk apply"),
                    None,
                ),
                TemplateTarget::Single { .. } => (
                    bundle.text("projects_role.apply_template.title", "Apply template"),
                    (template.phase == DialogPhase::Succeeded)
                        .then(|| AttrValue::from(bundle.text("projects_role.apply_template.success", ""))),
                ),
            };
            html! {
                <Modal
                    title={title}
                    error={error}
                    success={success}
                    submit_label={bundle.text("actions.apply", "Apply")}
                    cancel_label={cancel_label}
                    submit_disabled={!template.can_submit()}
                    on_submit={on_submit}
                    on_close={on_close}
                >
                    { for template.messages(bundle).into_iter().map(|line| html! { <p>{line}</p> }) }
                    <label>
                        {bundle.text("permission_templates.template", "Template")}
                        <select onchange={on_select}>
                            <option value="" selected={template.selected.is_none()} disabled=true>
                                {bundle.text("permission_templates.template_required", "")}
                            </option>
                            { for template.templates.iter().map(|option| html! {
                                <option
                                    value={option.id.clone()}
                                    selected={template.selected.as_deref() == Some(option.id.as_str())}
                                >
                                    {option.name.clone()}
                                </option>
                            }) }
                        </select>
                    </label>
                </Modal>
            }
        }
        Dialog::Delete(delete) => html! {
            <Modal
                title={bundle.text("projects_management.delete_title", "Delete")}
                error={error}
                submit_label={bundle.text("actions.delete", "Delete")}
                cancel_label={cancel_label}
                submit_disabled={submitting}
                on_submit={on_submit}
                on_close={on_close}
            >
                <p>{delete.message(bundle)}</p>
            </Modal>
        },
        Dialog::RestoreAccess(restore) => html! {
            <Modal
                title={bundle.text("global_permissions.restore_access", "Restore access")}
                error={error}
                submit_label={bundle.text("actions.restore", "Restore")}
                cancel_label={cancel_label}
                submit_disabled={submitting}
                on_submit={on_submit}
                on_close={on_close}
            >
                <p>{restore.message(bundle)}</p>
            </Modal>
        },
        Dialog::Visibility(visibility) => html! {
            <Modal
                title={bundle.text("settings.change_visibility.header", "Default visibility")}
                error={error}
                submit_label={bundle.text("settings.change_visibility.submit", "Change")}
                cancel_label={cancel_label}
                submit_disabled={submitting}
                on_submit={on_submit}
                on_close={on_close}
            >
                { for [Visibility::Public, Visibility::Private].into_iter().map(|option| html! {
                    <label>
                        <input
                            type="radio"
                            name="default-visibility"
                            checked={visibility.choice == option}
                            onclick={emit(on_command, Command::ChooseVisibility(option))}
                        />
                        {bundle.text(&format!("visibility.{}", option.as_str()), option.as_str())}
                    </label>
                }) }
                <p class="alert alert-warning">{bundle.text(visibility.warning_key(), "")}</p>
            </Modal>
        },
        Dialog::CreateProject(form) => {
            let text_input = |value: &str, make: fn(String) -> Command| {
                let on_command = on_command.clone();
                let oninput = Callback::from(move |event: InputEvent| {
                    let input: HtmlInputElement = event.target_unchecked_into();
                    on_command.emit(make(input.value()));
                });
                html! { <input type="text" required=true value={value.to_string()} {oninput} /> }
            };
            let validation = form
                .validate()
                .err()
                .map(|err| bundle.text(err.message_key(), ""));
            let success = (form.phase == DialogPhase::Succeeded).then(|| {
                AttrValue::from(bundle.text(
                    "projects_management.project_has_been_successfully_created",
                    "",
                ))
            });
            html! {
                <Modal
                    title={bundle.text("create_project.title", "Create a project")}
                    error={error}
                    success={success}
                    submit_label={bundle.text("actions.create", "Create")}
                    cancel_label={cancel_label}
                    submit_disabled={submitting || validation.is_some()}
                    on_submit={on_submit}
                    on_close={on_close}
                >
                    <label>{bundle.text("create_project.display_name", "Name")}{text_input(&form.display_name, Command::EditName)}</label>
                    <label>{bundle.text("create_project.project_key", "Key")}{text_input(&form.key, Command::EditKey)}</label>
                    <label>{bundle.text("create_project.main_branch_name", "Main branch")}{text_input(&form.main_branch, Command::EditBranch)}</label>
                    if let Some(message) = validation {
                        <p class="field-hint">{message}</p>
                    }
                </Modal>
            }
        }
    }
}
