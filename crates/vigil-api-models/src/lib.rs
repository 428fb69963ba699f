#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::multiple_crate_versions)]
//! Shared data model for the Vigil projects management console.
//!
//! These types travel between the backend facade, the REST client and the UI
//! state so the wire vocabulary (`TRK`, `VW`, `APP`, `public`, `private`) is
//! defined in exactly one place.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stable project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Wrap a raw key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the raw key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProjectKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of manageable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Qualifier {
    /// Regular analysed project.
    #[default]
    #[serde(rename = "TRK")]
    Project,
    /// Portfolio aggregating projects.
    #[serde(rename = "VW")]
    Portfolio,
    /// Application aggregating projects.
    #[serde(rename = "APP")]
    Application,
}

impl Qualifier {
    /// All qualifiers in display order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Project, Self::Portfolio, Self::Application]
    }

    /// Wire code used by the REST API.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Project => "TRK",
            Self::Portfolio => "VW",
            Self::Application => "APP",
        }
    }

    /// Parse a wire code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().into_iter().find(|qualifier| qualifier.code() == code)
    }
}

/// Project visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Browsable by anyone.
    #[default]
    Public,
    /// Browsable only by users granted access.
    Private,
}

impl Visibility {
    /// Wire value used by the REST API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// Snapshot of a project as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Stable key.
    pub key: ProjectKey,
    /// Display name.
    pub name: String,
    /// Entity kind.
    pub qualifier: Qualifier,
    /// Visibility of the project.
    pub visibility: Visibility,
    /// Whether permissions are governed by an external provisioning system.
    #[serde(default)]
    pub managed: bool,
    /// Timestamp of the last analysis, absent when never analysed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analysis_date: Option<DateTime<Utc>>,
}

impl Project {
    /// Provisioned projects exist but have never been analysed.
    #[must_use]
    pub const fn is_provisioned(&self) -> bool {
        self.last_analysis_date.is_none()
    }

    /// Whether the project passes an "analysed before" cutoff.
    ///
    /// Never-analysed projects always pass.
    #[must_use]
    pub fn analysed_before(&self, cutoff: NaiveDate) -> bool {
        self.last_analysis_date
            .is_none_or(|analysed| analysed.date_naive() < cutoff)
    }
}

/// Named bundle of permission grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionTemplate {
    /// Template identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Instance-wide permissions held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalPermission {
    /// Administer the instance.
    Admin,
    /// Create projects.
    Provisioning,
    /// Administer quality gates.
    Gateadmin,
    /// Administer quality profiles.
    Profileadmin,
}

/// Per-project permissions consulted by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectPermission {
    /// Browse the project.
    #[serde(rename = "user")]
    Browse,
    /// Administer the project.
    #[serde(rename = "admin")]
    Admin,
}

impl ProjectPermission {
    /// Wire value used by the REST API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browse => "user",
            Self::Admin => "admin",
        }
    }
}

/// Currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// Login name.
    pub login: String,
    /// Whether the account is local rather than provided by an external identity provider.
    pub local: bool,
    /// Instance-wide permissions.
    #[serde(default)]
    pub global_permissions: Vec<GlobalPermission>,
}

impl CurrentUser {
    /// Whether the user holds the given instance-wide permission.
    #[must_use]
    pub fn has_global_permission(&self, permission: GlobalPermission) -> bool {
        self.global_permissions.contains(&permission)
    }
}

/// Instance features that change the console behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    /// GitHub provisioning is available and enabled on the instance.
    pub github_provisioning: bool,
}

/// Query sent to the backend when listing projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSearchQuery {
    /// Entity kind to list.
    pub qualifier: Qualifier,
    /// Optional visibility restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    /// Keep projects never analysed or analysed strictly before this day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_before: Option<NaiveDate>,
    /// Keep only never-analysed projects.
    #[serde(default)]
    pub on_provisioned_only: bool,
    /// Case-insensitive name/key fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// 1-based page index.
    pub page: u32,
    /// Page size.
    pub page_size: u32,
}

impl ProjectSearchQuery {
    /// Whether a project satisfies every predicate of the query (paging excluded).
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        if project.qualifier != self.qualifier {
            return false;
        }
        if self
            .visibility
            .is_some_and(|visibility| project.visibility != visibility)
        {
            return false;
        }
        if self
            .analyzed_before
            .is_some_and(|cutoff| !project.analysed_before(cutoff))
        {
            return false;
        }
        if self.on_provisioned_only && !project.is_provisioned() {
            return false;
        }
        match self.q.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                project.name.to_lowercase().contains(&needle)
                    || project.key.as_str().to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Paging metadata echoed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// 1-based page index.
    pub page_index: u32,
    /// Page size.
    pub page_size: u32,
    /// Total number of matching entries.
    pub total: u32,
}

/// One page of projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPage {
    /// Paging metadata.
    pub paging: Paging,
    /// Projects on this page.
    #[serde(rename = "components")]
    pub projects: Vec<Project>,
}

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    /// Display name.
    pub name: String,
    /// Project key.
    pub key: ProjectKey,
    /// Main branch name.
    pub main_branch: String,
    /// Initial visibility.
    pub visibility: Visibility,
}

/// User holding a given permission on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionUser {
    /// Login name.
    pub login: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Users holding a given permission on a project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionUsers {
    /// Matching users.
    pub users: Vec<PermissionUser>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn project(name: &str, analysed: Option<DateTime<Utc>>) -> Project {
        Project {
            key: ProjectKey::new(name.to_lowercase().replace(' ', "")),
            name: name.to_string(),
            qualifier: Qualifier::Project,
            visibility: Visibility::Public,
            managed: false,
            last_analysis_date: analysed,
        }
    }

    fn query() -> ProjectSearchQuery {
        ProjectSearchQuery {
            qualifier: Qualifier::Project,
            visibility: None,
            analyzed_before: None,
            on_provisioned_only: false,
            q: None,
            page: 1,
            page_size: 50,
        }
    }

    #[test]
    fn qualifier_codes_round_trip() {
        for qualifier in Qualifier::all() {
            assert_eq!(Qualifier::from_code(qualifier.code()), Some(qualifier));
        }
        assert_eq!(Qualifier::from_code("DIR"), None);
    }

    #[test]
    fn qualifier_serialises_as_wire_code() {
        let json = serde_json::to_string(&Qualifier::Portfolio).ok();
        assert_eq!(json.as_deref(), Some("\"VW\""));
    }

    #[test]
    fn analysed_before_keeps_never_analysed_projects() {
        let cutoff = NaiveDate::from_ymd_opt(2019, 1, 5).unwrap_or_default();
        let old = Utc.with_ymd_and_hms(2019, 1, 1, 10, 0, 0).single();
        let recent = Utc.with_ymd_and_hms(2019, 1, 5, 7, 0, 0).single();
        assert!(project("Old", old).analysed_before(cutoff));
        assert!(!project("Recent", recent).analysed_before(cutoff));
        assert!(project("Never", None).analysed_before(cutoff));
    }

    #[test]
    fn search_matches_name_or_key_case_insensitively() {
        let mut search = query();
        search.q = Some("  PROVISION ".to_string());
        assert!(search.matches(&project("Provisioned One", None)));
        assert!(!search.matches(&project("Other", None)));

        let mut by_key = project("Other", None);
        by_key.key = ProjectKey::new("provision-key");
        assert!(search.matches(&by_key));
    }

    #[test]
    fn query_filters_on_qualifier_visibility_and_provisioning() {
        let mut search = query();
        let mut portfolio = project("Portfolio", None);
        portfolio.qualifier = Qualifier::Portfolio;
        assert!(!search.matches(&portfolio));

        search.visibility = Some(Visibility::Private);
        assert!(!search.matches(&project("Public", None)));

        search.visibility = None;
        search.on_provisioned_only = true;
        let analysed = Utc.with_ymd_and_hms(2018, 6, 1, 0, 0, 0).single();
        assert!(!search.matches(&project("Analysed", analysed)));
        assert!(search.matches(&project("Provisioned", None)));
    }

    #[test]
    fn current_user_permission_lookup() {
        let user = CurrentUser {
            login: "admin".into(),
            local: true,
            global_permissions: vec![GlobalPermission::Provisioning],
        };
        assert!(user.has_global_permission(GlobalPermission::Provisioning));
        assert!(!user.has_global_permission(GlobalPermission::Admin));
    }
}
