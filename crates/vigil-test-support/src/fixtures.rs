//! Projects, users, templates and configuration used by the scenario tests.

use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};
use vigil_api_models::{
    CurrentUser, FeatureFlags, GlobalPermission, PermissionTemplate, Project, ProjectKey, Qualifier, Visibility,
};
use vigil_config::ConsoleConfig;
use vigil_core::Services;

use crate::backend::InMemoryBackend;

/// Login of the default administrator.
pub const ADMIN_LOGIN: &str = "gooduser1";
/// Login of a user without the project-creation permission.
pub const VIEWER_LOGIN: &str = "gooduser2";

fn analysed_on(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|time| time.and_utc())
}

/// A project row with the given traits.
#[must_use]
pub fn project(key: &str, name: &str, qualifier: Qualifier) -> Project {
    Project {
        key: ProjectKey::new(key),
        name: name.to_string(),
        qualifier,
        visibility: Visibility::Public,
        managed: false,
        last_analysis_date: analysed_on(2023, 5, 1),
    }
}

/// The standard catalogue: four projects, three portfolios, three applications.
///
/// - `project1`: public, analysed 2019-06-10.
/// - `project2`: private, analysed 2021-03-01.
/// - `project3`: public, analysed 2022-11-20.
/// - `project4`: private, never analysed, managed.
#[must_use]
pub fn default_projects() -> Vec<Project> {
    let mut projects = vec![
        Project {
            last_analysis_date: analysed_on(2019, 6, 10),
            ..project("project1", "Project 1", Qualifier::Project)
        },
        Project {
            visibility: Visibility::Private,
            last_analysis_date: analysed_on(2021, 3, 1),
            ..project("project2", "Project 2", Qualifier::Project)
        },
        Project {
            last_analysis_date: analysed_on(2022, 11, 20),
            ..project("project3", "Project 3", Qualifier::Project)
        },
        Project {
            visibility: Visibility::Private,
            managed: true,
            last_analysis_date: None,
            ..project("project4", "Project 4", Qualifier::Project)
        },
    ];
    projects.extend((1..=3).map(|i| {
        project(
            &format!("portfolio{i}"),
            &format!("Portfolio {i}"),
            Qualifier::Portfolio,
        )
    }));
    projects.extend((1..=3).map(|i| {
        project(
            &format!("app{i}"),
            &format!("Application {i}"),
            Qualifier::Application,
        )
    }));
    projects
}

/// `count` locally managed projects named `Local project N`.
#[must_use]
pub fn local_projects(count: usize) -> Vec<Project> {
    (1..=count)
        .map(|i| project(&format!("local{i}"), &format!("Local project {i}"), Qualifier::Project))
        .collect()
}

/// `count` externally managed projects named `GitHub project N`.
#[must_use]
pub fn managed_projects(count: usize) -> Vec<Project> {
    (1..=count)
        .map(|i| Project {
            managed: true,
            ..project(&format!("github{i}"), &format!("GitHub project {i}"), Qualifier::Project)
        })
        .collect()
}

/// `per_qualifier` rows of each qualifier.
#[must_use]
pub fn many_projects(per_qualifier: usize) -> Vec<Project> {
    Qualifier::all()
        .into_iter()
        .flat_map(|qualifier| {
            (1..=per_qualifier).map(move |i| {
                let code = qualifier.code().to_lowercase();
                project(
                    &format!("{code}-{i:03}"),
                    &format!("{} {i:03}", qualifier.code()),
                    qualifier,
                )
            })
        })
        .collect()
}

/// Two permission templates.
#[must_use]
pub fn templates() -> Vec<PermissionTemplate> {
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

/// Local administrator allowed to create projects.
#[must_use]
pub fn admin_user() -> CurrentUser {
    CurrentUser {
        login: ADMIN_LOGIN.into(),
        local: true,
        global_permissions: vec![GlobalPermission::Admin, GlobalPermission::Provisioning],
    }
}

/// Local administrator without the project-creation permission.
#[must_use]
pub fn viewer_user() -> CurrentUser {
    CurrentUser {
        login: VIEWER_LOGIN.into(),
        local: true,
        global_permissions: vec![GlobalPermission::Admin],
    }
}

/// Account provided by GitHub rather than the local directory.
#[must_use]
pub fn github_user() -> CurrentUser {
    CurrentUser {
        local: false,
        ..admin_user()
    }
}

/// Default console configuration with GitHub provisioning allowed.
#[must_use]
pub fn console_config() -> ConsoleConfig {
    ConsoleConfig {
        features: FeatureFlags {
            github_provisioning: true,
        },
        ..ConsoleConfig::default()
    }
}

/// Share one backend behind every facade handle.
#[must_use]
pub fn services(backend: &Rc<InMemoryBackend>) -> Services {
    Services::from_backend(Rc::clone(backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalogue_covers_every_qualifier() {
        let projects = default_projects();
        for qualifier in Qualifier::all() {
            assert!(projects.iter().any(|project| project.qualifier == qualifier));
        }
        assert_eq!(projects.iter().filter(|project| project.managed).count(), 1);
    }

    #[test]
    fn many_projects_uses_unique_keys() {
        let projects = many_projects(60);
        assert_eq!(projects.len(), 180);
        let mut keys: Vec<_> = projects.iter().map(|project| project.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 180);
    }
}
