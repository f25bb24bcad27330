//! Presentation seam: typed page models and the `Presenter` trait.
//!
//! The controller never touches output devices. Each dispatch branch builds
//! exactly one page model and hands it to the [`Presenter`], which fully
//! owns and replaces its render target before returning. The binary ships
//! [`TextPresenter`]; tests substitute recording implementations.

mod text;

pub use text::TextPresenter;

use chrono::{DateTime, Utc};

use crate::api::{Article, ReaderArticle};
use crate::predictions::MatchRecord;

// ============================================================================
// Page Models
// ============================================================================

/// The composed Home dashboard.
#[derive(Debug, Clone, Default)]
pub struct HomePage {
    /// Highest breaking-score item, when any item exists.
    pub breaking: Option<Article>,
    /// Top stories, hero block (first four).
    pub hero: Vec<Article>,
    /// Top stories past the hero block.
    pub more: Vec<Article>,
    /// Text-only latest rail.
    pub latest: Vec<Article>,
    /// Total composed items (before sub-selection).
    pub total: usize,
}

/// The Feed/Search result list.
#[derive(Debug, Clone)]
pub struct FeedPage {
    /// Section label ("Politics", "Results", "News", ...).
    pub label: String,
    pub items: Vec<Article>,
    /// True when this render extends the previous list rather than
    /// replacing a different view.
    pub append: bool,
    /// True when a search query produced this page (affects status copy).
    pub from_search: bool,
}

/// The full article reader.
#[derive(Debug, Clone)]
pub struct ArticlePage {
    pub article: ReaderArticle,
    /// Proxied hero image URL, when one was resolved and is not logoish.
    pub hero_image: Option<String>,
    /// Original source link, for the no-content fallback.
    pub source_url: Option<String>,
}

/// The Match Center shell.
#[derive(Debug, Clone, Default)]
pub struct MatchCenterPage {
    /// Saved records, newest first.
    pub records: Vec<MatchRecord>,
    /// Currently selected record id, if any.
    pub selected: Option<String>,
}

// ============================================================================
// Presenter
// ============================================================================

/// Render-layer collaborator.
///
/// Implementations own their output target completely: each `render_*`
/// call replaces the previous view, never mixes two. Scroll methods exist
/// so the controller can preserve the Home scroll position across the
/// re-render a page-size increase triggers; presenters without a scrollable
/// surface keep the defaults.
pub trait Presenter {
    fn render_home(&mut self, page: HomePage);
    fn render_feed(&mut self, page: FeedPage);
    fn render_article(&mut self, page: ArticlePage);
    fn render_match_center(&mut self, page: MatchCenterPage);

    /// Transient status line ("Loading…", "3 result(s)", validation text).
    fn set_status(&mut self, message: &str);

    /// Update the "last refreshed" marker; called once per completed
    /// dispatch.
    fn mark_refreshed(&mut self, at: DateTime<Utc>);

    /// Current scroll offset of the active view, in presenter units.
    fn scroll_offset(&self) -> usize {
        0
    }

    /// Restore a previously captured scroll offset after a re-render.
    fn restore_scroll(&mut self, _offset: usize) {}
}
