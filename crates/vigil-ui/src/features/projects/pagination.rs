//! Load-more pagination with sequence-based staleness checks.
//!
//! # Design
//! - Every request carries a monotonically increasing sequence number and
//!   the fingerprint of the filters it was issued for.
//! - A response is applied only if it answers the latest request and its
//!   fingerprint still matches the active filters; anything else is stale.

use tracing::debug;

use crate::features::projects::state::{FilterState, Fingerprint};

/// Whether a page replaces or extends the loaded rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    /// First page for a (new) filter configuration.
    Reset,
    /// Next page for the current filter configuration.
    Append,
}

/// One outstanding page fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Issue order of the request.
    pub sequence: u64,
    /// Filters the request was issued for.
    pub fingerprint: Fingerprint,
    /// 1-based page index.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Replace or extend.
    pub kind: PageKind,
}

/// Tracks loaded pages for the active filter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageController {
    page_size: u32,
    fingerprint: Option<Fingerprint>,
    loaded_pages: u32,
    next_sequence: u64,
    pending: Option<PageRequest>,
}

impl PageController {
    /// Controller fetching `page_size` rows per page.
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self {
            page_size,
            fingerprint: None,
            loaded_pages: 0,
            next_sequence: 0,
            pending: None,
        }
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Pages applied for the current fingerprint.
    #[must_use]
    pub const fn loaded_pages(&self) -> u32 {
        self.loaded_pages
    }

    /// Upper bound of rows shown for the current fingerprint.
    #[must_use]
    pub const fn loaded_capacity(&self) -> u32 {
        self.loaded_pages.saturating_mul(self.page_size)
    }

    /// Whether a request is awaiting its response.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start over with one fresh page for `filters`.
    ///
    /// Any request still in flight becomes stale.
    pub fn reset(&mut self, filters: &FilterState) -> PageRequest {
        let fingerprint = filters.fingerprint();
        self.fingerprint = Some(fingerprint);
        self.loaded_pages = 0;
        self.issue(fingerprint, 1, PageKind::Reset)
    }

    /// Request the next page for `filters`, if one is due.
    ///
    /// Returns `None` while another request is in flight, before the first
    /// page landed, when the filters moved on without a reset, or when every
    /// row is already loaded.
    pub fn load_more(
        &mut self,
        filters: &FilterState,
        loaded_rows: usize,
        total: u32,
    ) -> Option<PageRequest> {
        let fingerprint = filters.fingerprint();
        if self.pending.is_some()
            || self.loaded_pages == 0
            || self.fingerprint != Some(fingerprint)
            || loaded_rows >= total as usize
        {
            return None;
        }
        Some(self.issue(fingerprint, self.loaded_pages + 1, PageKind::Append))
    }

    /// Accept or discard a response for `request` given the active filters.
    ///
    /// Returns `true` when the caller should apply the rows.
    pub fn accept(&mut self, request: &PageRequest, filters: &FilterState) -> bool {
        let current = filters.fingerprint();
        let latest = self
            .pending
            .is_some_and(|pending| pending.sequence == request.sequence);
        if !latest || request.fingerprint != current || self.fingerprint != Some(current) {
            debug!(
                sequence = request.sequence,
                page = request.page,
                "discarding stale projects page"
            );
            return false;
        }
        self.pending = None;
        self.loaded_pages = request.page;
        true
    }

    /// Whether `request` is the latest one still awaiting its response.
    #[must_use]
    pub fn is_pending(&self, request: &PageRequest) -> bool {
        self.pending
            .is_some_and(|pending| pending.sequence == request.sequence)
    }

    /// Forget the in-flight request after a failed fetch.
    pub fn abandon(&mut self, request: &PageRequest) {
        if self.is_pending(request) {
            self.pending = None;
        }
    }

    fn issue(&mut self, fingerprint: Fingerprint, page: u32, kind: PageKind) -> PageRequest {
        self.next_sequence += 1;
        let request = PageRequest {
            sequence: self.next_sequence,
            fingerprint,
            page,
            page_size: self.page_size,
            kind,
        };
        debug!(sequence = request.sequence, page, ?kind, "requesting projects page");
        self.pending = Some(request);
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::projects::state::FilterUpdate;
    use vigil_api_models::Qualifier;

    #[test]
    fn reset_then_load_more_walks_pages() {
        let filters = FilterState::default();
        let mut pages = PageController::new(50);
        let first = pages.reset(&filters);
        assert_eq!((first.page, first.kind), (1, PageKind::Reset));
        assert!(pages.load_more(&filters, 0, 180).is_none());
        assert!(pages.accept(&first, &filters));
        assert_eq!(pages.loaded_capacity(), 50);

        let second = pages.load_more(&filters, 50, 60);
        let second = second.as_ref();
        assert_eq!(second.map(|req| (req.page, req.kind)), Some((2, PageKind::Append)));
        assert!(second.is_some_and(|req| pages.accept(req, &filters)));
        assert_eq!(pages.loaded_pages(), 2);
        assert!(pages.load_more(&filters, 60, 60).is_none());
    }

    #[test]
    fn filter_change_makes_in_flight_pages_stale() {
        let mut filters = FilterState::default();
        let mut pages = PageController::new(50);
        let first = pages.reset(&filters);
        assert!(pages.accept(&first, &filters));
        let more = pages.load_more(&filters, 50, 180);
        assert!(more.is_some());

        filters.apply(FilterUpdate {
            qualifier: Some(Qualifier::Portfolio),
            ..FilterUpdate::default()
        });
        let fresh = pages.reset(&filters);
        if let Some(more) = more {
            assert!(!pages.accept(&more, &filters));
        }
        assert!(pages.is_loading());
        assert!(pages.accept(&fresh, &filters));
        assert_eq!(pages.loaded_pages(), 1);
    }

    #[test]
    fn later_reset_wins_over_earlier_one_regardless_of_arrival() {
        let mut filters = FilterState::default();
        let mut pages = PageController::new(50);
        let first = pages.reset(&filters);
        filters.set_search("abc");
        let second = pages.reset(&filters);
        assert!(second.sequence > first.sequence);
        assert!(pages.accept(&second, &filters));
        assert!(!pages.accept(&first, &filters));
    }

    #[test]
    fn abandoned_request_allows_retry() {
        let filters = FilterState::default();
        let mut pages = PageController::new(10);
        let first = pages.reset(&filters);
        pages.abandon(&first);
        assert!(!pages.is_loading());
        assert!(!pages.accept(&first, &filters));
    }
}
