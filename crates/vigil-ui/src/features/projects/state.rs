//! Projects list state: filters, loaded rows and the bulk-selection set.
//!
//! # Design
//! - Rows are read-only snapshots from the backend; local edits only happen
//!   through reloads after a mutating call.
//! - The selection only ever references visible rows.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use chrono::NaiveDate;
use vigil_api_models::{Project, ProjectKey, ProjectSearchQuery, Qualifier, Visibility};

/// Selection set used for bulk project actions.
pub type SelectionSet = BTreeSet<ProjectKey>;

/// Filter predicates applied to the projects list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct FilterState {
    /// Entity kind being listed.
    pub qualifier: Qualifier,
    /// Optional visibility restriction.
    pub visibility: Option<Visibility>,
    /// Keep projects never analysed or analysed before this day.
    pub analyzed_before: Option<NaiveDate>,
    /// Keep only never-analysed projects; only meaningful for projects.
    pub provisioned_only: bool,
    /// Free-text name/key search.
    pub search: String,
}

/// Partial filter update; `None` leaves the field untouched.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FilterUpdate {
    /// Replace the qualifier.
    pub qualifier: Option<Qualifier>,
    /// Replace (or clear) the visibility restriction.
    pub visibility: Option<Option<Visibility>>,
    /// Replace (or clear) the analysis cutoff.
    pub analyzed_before: Option<Option<NaiveDate>>,
    /// Replace the provisioned-only toggle.
    pub provisioned_only: Option<bool>,
}

/// Outcome of merging a filter update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterChange {
    /// Any predicate changed.
    pub changed: bool,
    /// The qualifier changed.
    pub qualifier_changed: bool,
}

/// Identifies one filter configuration; pages fetched under another
/// fingerprint are never shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl FilterState {
    /// Merge a partial update.
    ///
    /// Switching qualifier clears the search text, and leaving `Project`
    /// clears the provisioned-only toggle.
    pub fn apply(&mut self, update: FilterUpdate) -> FilterChange {
        let before = self.clone();
        let qualifier_changed = update
            .qualifier
            .is_some_and(|qualifier| qualifier != self.qualifier);

        if let Some(qualifier) = update.qualifier {
            self.qualifier = qualifier;
        }
        if let Some(visibility) = update.visibility {
            self.visibility = visibility;
        }
        if let Some(cutoff) = update.analyzed_before {
            self.analyzed_before = cutoff;
        }
        if let Some(provisioned_only) = update.provisioned_only {
            self.provisioned_only = provisioned_only;
        }
        if qualifier_changed {
            self.search.clear();
        }
        if !self.shows_provisioned_filter() {
            self.provisioned_only = false;
        }

        FilterChange {
            changed: *self != before,
            qualifier_changed,
        }
    }

    /// Replace the search text; returns whether it changed.
    pub fn set_search(&mut self, text: &str) -> bool {
        if self.search == text {
            return false;
        }
        self.search = text.to_string();
        true
    }

    /// The provisioned-only control exists only while listing projects.
    #[must_use]
    pub fn shows_provisioned_filter(&self) -> bool {
        self.qualifier == Qualifier::Project
    }

    /// Hash of every predicate.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        Fingerprint(hasher.finish())
    }

    /// Backend query for the given 1-based page.
    #[must_use]
    pub fn to_query(&self, page: u32, page_size: u32) -> ProjectSearchQuery {
        let search = self.search.trim();
        ProjectSearchQuery {
            qualifier: self.qualifier,
            visibility: self.visibility,
            analyzed_before: self.analyzed_before,
            on_provisioned_only: self.provisioned_only,
            q: (!search.is_empty()).then(|| search.to_string()),
            page,
            page_size,
        }
    }
}

/// Tri-state of the "check all" control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckAllState {
    /// Nothing selected.
    None,
    /// Some visible rows selected.
    Partial,
    /// Every visible row selected.
    All,
}

/// Current projects slice held by the screen.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ProjectsState {
    /// Map of project rows by key.
    pub by_key: HashMap<ProjectKey, Rc<Project>>,
    /// Ordered list of visible project keys.
    pub visible_keys: Vec<ProjectKey>,
    /// Multi-select set for bulk actions.
    pub selected: SelectionSet,
    /// Active filter state.
    pub filters: FilterState,
    /// Total number of projects matching the filters on the backend.
    pub total: u32,
}

/// Replace list rows with a fresh first page.
pub fn set_rows(state: &mut ProjectsState, rows: Vec<Project>, total: u32) {
    state.visible_keys = rows.iter().map(|row| row.key.clone()).collect();
    state.by_key = rows
        .into_iter()
        .map(|row| (row.key.clone(), Rc::new(row)))
        .collect();
    state.total = total;
    state.selected.retain(|key| state.by_key.contains_key(key));
}

/// Append a further page to the loaded rows.
pub fn append_rows(state: &mut ProjectsState, rows: Vec<Project>, total: u32) {
    for row in rows {
        if !state.by_key.contains_key(&row.key) {
            state.visible_keys.push(row.key.clone());
        }
        state.by_key.insert(row.key.clone(), Rc::new(row));
    }
    state.total = total;
}

/// Drop rows removed on the backend.
pub fn remove_rows(state: &mut ProjectsState, keys: &[ProjectKey]) {
    let mut removed: u32 = 0;
    for key in keys {
        if state.by_key.remove(key).is_some() {
            removed += 1;
        }
        state.selected.remove(key);
    }
    state.visible_keys.retain(|key| state.by_key.contains_key(key));
    state.total = state.total.saturating_sub(removed);
}

/// Toggle a visible row in the selection; returns whether it is now selected.
pub fn toggle_selection(state: &mut ProjectsState, key: &ProjectKey) -> bool {
    if !state.by_key.contains_key(key) {
        return false;
    }
    if state.selected.remove(key) {
        false
    } else {
        state.selected.insert(key.clone());
        true
    }
}

/// Select every visible row.
pub fn select_all(state: &mut ProjectsState) {
    state.selected = state.visible_keys.iter().cloned().collect();
}

/// Clear the selection.
pub fn clear_selection(state: &mut ProjectsState) {
    state.selected.clear();
}

/// State of the "check all" control.
#[must_use]
pub fn check_all_state(state: &ProjectsState) -> CheckAllState {
    if state.selected.is_empty() {
        CheckAllState::None
    } else if state.selected.len() == state.visible_keys.len() {
        CheckAllState::All
    } else {
        CheckAllState::Partial
    }
}

/// Read the visible rows in list order.
#[must_use]
pub fn select_visible_rows(state: &ProjectsState) -> Vec<Rc<Project>> {
    state
        .visible_keys
        .iter()
        .filter_map(|key| state.by_key.get(key).cloned())
        .collect()
}

/// Read the selected rows in list order.
#[must_use]
pub fn select_selected_rows(state: &ProjectsState) -> Vec<Rc<Project>> {
    state
        .visible_keys
        .iter()
        .filter(|key| state.selected.contains(*key))
        .filter_map(|key| state.by_key.get(key).cloned())
        .collect()
}

/// Read a row by key.
#[must_use]
pub fn select_project(state: &ProjectsState, key: &ProjectKey) -> Option<Rc<Project>> {
    state.by_key.get(key).cloned()
}

/// Rendered table rows, including the header row.
#[must_use]
pub fn row_count(state: &ProjectsState) -> usize {
    state.visible_keys.len() + 1
}

/// Whether the backend holds rows beyond the loaded ones.
#[must_use]
pub fn has_more(state: &ProjectsState) -> bool {
    state.visible_keys.len() < state.total as usize
}
