//! Filtering, search, paging and staleness scenarios of the projects screen.

use std::rc::Rc;

use anyhow::Result;
use chrono::NaiveDate;
use vigil_api_models::{CurrentUser, ProjectKey, Qualifier, Visibility};
use vigil_config::ConsoleConfig;
use vigil_test_support::fixtures::{
    admin_user, console_config, default_projects, many_projects, services,
};
use vigil_test_support::{InMemoryBackend, Operation, init_test_logging};
use vigil_ui::ProjectsScreen;
use vigil_ui::features::projects::state::{CheckAllState, FilterUpdate};

async fn open_screen(backend: &Rc<InMemoryBackend>, user: CurrentUser) -> Result<ProjectsScreen> {
    init_test_logging();
    Ok(ProjectsScreen::open(services(backend), user, &console_config()).await?)
}

fn default_backend() -> Rc<InMemoryBackend> {
    Rc::new(
        InMemoryBackend::new("gooduser1")
            .with_projects(default_projects())
            .with_github_provisioning(true),
    )
}

fn keys(screen: &ProjectsScreen) -> Vec<String> {
    screen
        .rows()
        .iter()
        .map(|row| row.project.key.as_str().to_string())
        .collect()
}

fn cutoff() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2020, 1, 1).ok_or_else(|| anyhow::anyhow!("invalid date"))
}

#[tokio::test]
async fn filters_narrow_the_project_list() -> Result<()> {
    let backend = default_backend();
    let mut screen = open_screen(&backend, admin_user()).await?;
    assert_eq!(screen.row_count(), 5);

    screen
        .set_filter(FilterUpdate {
            visibility: Some(Some(Visibility::Private)),
            ..FilterUpdate::default()
        })
        .await?;
    assert_eq!(keys(&screen), ["project2", "project4"]);

    screen
        .set_filter(FilterUpdate {
            analyzed_before: Some(Some(cutoff()?)),
            ..FilterUpdate::default()
        })
        .await?;
    assert_eq!(keys(&screen), ["project4"]);

    screen
        .set_filter(FilterUpdate {
            visibility: Some(None),
            ..FilterUpdate::default()
        })
        .await?;
    assert_eq!(keys(&screen), ["project1", "project4"]);

    screen
        .set_filter(FilterUpdate {
            provisioned_only: Some(true),
            ..FilterUpdate::default()
        })
        .await?;
    assert_eq!(screen.row_count(), 2);
    assert!(screen.shows_provisioned_filter());
    Ok(())
}

#[tokio::test]
async fn switching_qualifier_hides_provisioned_filter() -> Result<()> {
    let backend = default_backend();
    let mut screen = open_screen(&backend, admin_user()).await?;
    assert!(screen.shows_qualifier_filter());
    screen
        .set_filter(FilterUpdate {
            provisioned_only: Some(true),
            ..FilterUpdate::default()
        })
        .await?;

    screen
        .set_filter(FilterUpdate {
            qualifier: Some(Qualifier::Portfolio),
            ..FilterUpdate::default()
        })
        .await?;
    assert!(!screen.shows_provisioned_filter());
    assert!(!screen.filters().provisioned_only);
    assert_eq!(keys(&screen), ["portfolio1", "portfolio2", "portfolio3"]);

    screen
        .set_filter(FilterUpdate {
            qualifier: Some(Qualifier::Application),
            ..FilterUpdate::default()
        })
        .await?;
    assert!(!screen.shows_provisioned_filter());
    assert_eq!(screen.row_count(), 4);

    let last_query = backend.searches().pop().ok_or_else(|| anyhow::anyhow!("no search"))?;
    assert_eq!(last_query.qualifier, Qualifier::Application);
    assert!(!last_query.on_provisioned_only);
    Ok(())
}

#[tokio::test]
async fn search_is_cleared_on_qualifier_switch() -> Result<()> {
    let backend = default_backend();
    let mut screen = open_screen(&backend, admin_user()).await?;

    screen.set_search("project 1").await?;
    assert_eq!(keys(&screen), ["project1"]);
    screen.set_search("  PROJECT4 ").await?;
    assert_eq!(keys(&screen), ["project4"]);

    screen
        .set_filter(FilterUpdate {
            qualifier: Some(Qualifier::Application),
            ..FilterUpdate::default()
        })
        .await?;
    assert_eq!(screen.filters().search, "");
    assert_eq!(screen.row_count(), 4);
    Ok(())
}

#[tokio::test]
async fn selection_follows_filters() -> Result<()> {
    let backend = default_backend();
    let mut screen = open_screen(&backend, admin_user()).await?;

    assert!(screen.toggle(&ProjectKey::new("project1")));
    assert!(screen.toggle(&ProjectKey::new("project2")));
    assert_eq!(screen.check_all_state(), CheckAllState::Partial);

    screen
        .set_filter(FilterUpdate {
            visibility: Some(Some(Visibility::Private)),
            ..FilterUpdate::default()
        })
        .await?;
    assert_eq!(screen.selected_count(), 1);
    assert!(screen.state().selected.contains(&ProjectKey::new("project2")));

    screen.select_all();
    assert_eq!(screen.check_all_state(), CheckAllState::All);
    screen
        .set_filter(FilterUpdate {
            qualifier: Some(Qualifier::Portfolio),
            ..FilterUpdate::default()
        })
        .await?;
    assert_eq!(screen.selected_count(), 0);
    assert!(!screen.toggle(&ProjectKey::new("project2")));
    Ok(())
}

#[tokio::test]
async fn load_more_appends_and_qualifier_switch_starts_over() -> Result<()> {
    let backend = Rc::new(InMemoryBackend::new("gooduser1").with_projects(many_projects(60)));
    let mut screen = open_screen(&backend, admin_user()).await?;
    assert_eq!(screen.row_count(), 51);
    assert!(screen.has_more());

    screen.load_more().await?;
    assert_eq!(screen.row_count(), 61);
    assert!(!screen.has_more());
    screen.load_more().await?;
    assert_eq!(screen.row_count(), 61);

    screen
        .set_filter(FilterUpdate {
            qualifier: Some(Qualifier::Portfolio),
            ..FilterUpdate::default()
        })
        .await?;
    assert_eq!(screen.row_count(), 51);
    assert!(keys(&screen).iter().all(|key| key.starts_with("vw-")));

    screen.load_more().await?;
    assert_eq!(screen.row_count(), 61);
    assert!(keys(&screen).iter().all(|key| key.starts_with("vw-")));
    Ok(())
}

#[tokio::test]
async fn superseded_pages_are_discarded() -> Result<()> {
    let backend = Rc::new(InMemoryBackend::new("gooduser1").with_projects(many_projects(60)));
    let mut screen = open_screen(&backend, admin_user()).await?;

    let projects_page = screen.begin_reload();
    screen.update_filters(FilterUpdate {
        qualifier: Some(Qualifier::Application),
        ..FilterUpdate::default()
    })?;
    let applications_page = screen.begin_reload();

    let late = screen.fetch(&projects_page).await;
    let fresh = screen.fetch(&applications_page).await;
    screen.apply_page(&applications_page.request, fresh)?;
    let err = screen
        .apply_page(&projects_page.request, late)
        .expect_err("superseded page");
    assert!(err.is_silent());

    assert_eq!(screen.row_count(), 51);
    assert!(keys(&screen).iter().all(|key| key.starts_with("app-")));
    assert!(!screen.is_loading());
    Ok(())
}

#[tokio::test]
async fn response_for_outdated_filters_is_discarded() -> Result<()> {
    let backend = Rc::new(InMemoryBackend::new("gooduser1").with_projects(many_projects(60)));
    let mut screen = open_screen(&backend, admin_user()).await?;

    let next_page = screen
        .begin_load_more()
        .ok_or_else(|| anyhow::anyhow!("second page expected"))?;
    let response = screen.fetch(&next_page).await;
    screen.update_filters(FilterUpdate {
        qualifier: Some(Qualifier::Portfolio),
        ..FilterUpdate::default()
    })?;
    let err = screen
        .apply_page(&next_page.request, response)
        .expect_err("outdated page");
    assert!(err.is_silent());
    assert_eq!(screen.row_count(), 51);

    screen.load().await?;
    assert!(keys(&screen).iter().all(|key| key.starts_with("vw-")));
    Ok(())
}

#[tokio::test]
async fn list_failure_is_reported_and_recovers() -> Result<()> {
    let backend = default_backend();
    backend.fail_next(Operation::SearchProjects, "search is down");
    let mut screen = open_screen(&backend, admin_user()).await?;
    assert_eq!(screen.list_error(), Some("search is down"));
    assert_eq!(screen.row_count(), 1);

    screen.load().await?;
    assert_eq!(screen.list_error(), None);
    assert_eq!(screen.row_count(), 5);
    Ok(())
}

#[tokio::test]
async fn failed_filter_change_leaves_no_rows_from_the_old_filters() -> Result<()> {
    let backend = default_backend();
    let mut screen = open_screen(&backend, admin_user()).await?;
    assert_eq!(screen.row_count(), 5);

    backend.fail_next(Operation::SearchProjects, "search is down");
    let err = screen
        .set_filter(FilterUpdate {
            qualifier: Some(Qualifier::Portfolio),
            ..FilterUpdate::default()
        })
        .await
        .expect_err("injected failure");
    assert_eq!(err.to_string(), "search is down");
    assert_eq!(screen.filters().qualifier, Qualifier::Portfolio);
    assert_eq!(screen.list_error(), Some("search is down"));
    assert!(screen.rows().is_empty());
    assert_eq!(screen.row_count(), 1);
    assert!(!screen.has_more());
    assert!(!screen.is_loading());

    screen.load().await?;
    assert_eq!(screen.list_error(), None);
    assert!(screen.rows().iter().all(|row| row.project.qualifier == Qualifier::Portfolio));
    Ok(())
}

#[tokio::test]
async fn local_badge_requires_provisioning_and_projects() -> Result<()> {
    let backend = default_backend();
    let mut screen = open_screen(&backend, admin_user()).await?;
    let badges = screen.rows().iter().filter(|row| row.local_badge).count();
    assert_eq!(badges, 3);

    screen
        .set_filter(FilterUpdate {
            qualifier: Some(Qualifier::Portfolio),
            ..FilterUpdate::default()
        })
        .await?;
    assert!(screen.rows().iter().all(|row| !row.local_badge));

    let disabled = Rc::new(
        InMemoryBackend::new("gooduser1")
            .with_projects(default_projects())
            .with_github_provisioning(false),
    );
    let screen = open_screen(&disabled, admin_user()).await?;
    assert!(!screen.features().github_provisioning);
    assert!(screen.rows().iter().all(|row| !row.local_badge));
    Ok(())
}

#[tokio::test]
async fn served_configuration_turns_on_github_features() -> Result<()> {
    init_test_logging();
    let backend = default_backend();

    let served = ConsoleConfig::from_optional_json(Some(
        r#"{"features": {"githubProvisioning": true}}"#,
    ))?;
    let screen = ProjectsScreen::open(services(&backend), admin_user(), &served).await?;
    assert!(screen.features().github_provisioning);
    assert!(screen.rows().iter().any(|row| row.local_badge));

    let absent = ConsoleConfig::from_optional_json(None)?;
    let screen = ProjectsScreen::open(services(&backend), admin_user(), &absent).await?;
    assert!(!screen.features().github_provisioning);
    assert!(screen.rows().iter().all(|row| !row.local_badge));
    Ok(())
}
