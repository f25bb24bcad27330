//! Application view-state and the closed set of UI intents.
//!
//! All mutable routing state lives in one [`ViewState`] owned by the
//! controller — nothing is module-level, so tests can run any number of
//! independent instances. The presenter layer communicates back through
//! [`Intent`] values only; there is no callback wiring.

use chrono::{DateTime, Utc};
use url::Url;

use crate::pagination::Pager;
use crate::predictions::Pick;
use crate::route::Location;

// ============================================================================
// Views
// ============================================================================

/// Top-level view. Feed/Search is not a separate state: it is the Home
/// rendering branch taken when a query or category filter is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    MatchCenter,
}

/// Which scrollable view a pagination request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagedView {
    Home,
    Browse,
}

// ============================================================================
// Intents
// ============================================================================

/// Fields for creating a match record from user input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchDraft {
    pub league: String,
    pub home: String,
    pub away: String,
    /// Kickoff as a millisecond timestamp.
    pub kickoff: Option<i64>,
}

/// The closed set of UI events the controller consumes.
///
/// Every user interaction — nav clicks, search submits, scroll sentinels,
/// match-center edits — arrives as exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Plain Home link: clears the article route, filter and query.
    NavigateHome,
    /// Category link: clears the article route, sets the feed filter.
    NavigateFeed(String),
    /// Match Center link: clears the article route, filter and query.
    NavigateMatchCenter,
    /// Search form submit.
    SubmitSearch(String),
    /// Internal article link click: pushes an article route URL.
    OpenArticle {
        key: String,
        source_url: Option<String>,
    },
    /// The reader view's back button: force plain Home.
    ReaderBack,
    /// Browser history navigation: re-evaluate from the URL alone.
    HistoryBack,
    HistoryForward,
    /// Scroll sentinel fired for the given view.
    RequestNextPage(PagedView),
    /// Periodic timer, resume or reconnect: idempotent re-dispatch.
    Refresh,
    SaveMatch(MatchDraft),
    SelectMatch(String),
    SelectPick { id: String, pick: Pick },
    /// Raw confidence input; sanitized and clamped on (debounced) commit.
    SetConfidence { id: String, raw: String },
    /// Notes edit; committed after the debounce quiet period.
    SetNotes { id: String, notes: String },
    DeleteMatch(String),
}

// ============================================================================
// View State
// ============================================================================

/// The process-wide routing state, one instance per controller.
#[derive(Debug)]
pub struct ViewState {
    pub view: View,
    /// Selected category filter; empty means "no filter".
    pub feed_filter: String,
    /// Current search query (mirrors the `q` URL parameter).
    pub query: String,
    pub home_pager: Pager,
    pub browse_pager: Pager,
    /// At most one load dispatch runs at a time; overlapping triggers are
    /// dropped, not queued.
    inflight: bool,
    /// Dispatch generation; async completions tagged with an older value
    /// are discarded before they can touch the presenter.
    generation: u64,
    pub location: Location,
    /// Selected match record in the Match Center, if any.
    pub selected_match: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl ViewState {
    pub fn new(start_url: Url) -> Self {
        Self {
            view: View::Home,
            feed_filter: String::new(),
            query: String::new(),
            home_pager: Pager::home(),
            browse_pager: Pager::browse(),
            inflight: false,
            generation: 0,
            location: Location::new(start_url),
            selected_match: None,
            last_refreshed: None,
        }
    }

    /// Try to enter a dispatch. Returns the new generation, or `None` when
    /// a dispatch is already in flight (the trigger is dropped).
    pub fn begin_dispatch(&mut self) -> Option<u64> {
        if self.inflight {
            return None;
        }
        self.inflight = true;
        self.generation += 1;
        Some(self.generation)
    }

    pub fn finish_dispatch(&mut self) {
        self.inflight = false;
    }

    pub fn is_inflight(&self) -> bool {
        self.inflight
    }

    /// True when `generation` is still the live dispatch.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Test hook: mark a dispatch as already running.
    #[cfg(test)]
    pub fn force_inflight(&mut self) {
        self.inflight = true;
    }
}
