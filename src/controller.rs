//! View controller: single-flight dispatch and intent handling.
//!
//! One [`Controller`] owns the [`ViewState`], the API client, the match
//! store and the presenter. Every UI event arrives as an [`Intent`];
//! every screen change goes out as exactly one page model. The `inflight`
//! flag drops overlapping dispatch triggers, and each dispatch carries a
//! generation number so a completion that outlives its dispatch can never
//! overwrite a newer view.

use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::Instant;

use crate::api::{ApiClient, ArticleQuery};
use crate::app::{Intent, MatchDraft, PagedView, View, ViewState};
use crate::compose;
use crate::predictions::{sanitize_confidence, MatchPatch, MatchStore, Pick};
use crate::render::{ArticlePage, FeedPage, HomePage, MatchCenterPage, Presenter};
use crate::route::{self, ArticleRoute};

/// Home never fetches fewer than this many items per category.
const HOME_PER_FEED_MIN: usize = 6;
/// Hero block size within top stories.
const HOME_HERO_COUNT: usize = 4;
/// Text-only latest rail size.
const HOME_LATEST_COUNT: usize = 7;
/// Top-stories pool taken from the composed feed.
const HOME_TOP_POOL: usize = 150;
/// Quiet period before a confidence/notes edit commits to the store.
const EDIT_DEBOUNCE: Duration = Duration::from_millis(250);

// ============================================================================
// Debounced Field Edits
// ============================================================================

#[derive(Debug, Clone)]
enum FieldEdit {
    Confidence(String),
    Notes(String),
}

impl FieldEdit {
    fn kind(&self) -> u8 {
        match self {
            FieldEdit::Confidence(_) => 0,
            FieldEdit::Notes(_) => 1,
        }
    }
}

#[derive(Debug)]
struct PendingEdit {
    record_id: String,
    edit: FieldEdit,
    due: Instant,
}

/// Pending per-field edits, flushed by the tick loop after a quiet period.
///
/// Last write wins: re-editing the same field of the same record replaces
/// the pending value and restarts its deadline.
#[derive(Debug, Default)]
struct DebouncedEdits {
    pending: Vec<PendingEdit>,
}

impl DebouncedEdits {
    fn queue(&mut self, record_id: &str, edit: FieldEdit) {
        self.pending
            .retain(|p| !(p.record_id == record_id && p.edit.kind() == edit.kind()));
        self.pending.push(PendingEdit {
            record_id: record_id.to_string(),
            edit,
            due: Instant::now() + EDIT_DEBOUNCE,
        });
    }

    /// Drain edits whose quiet period has elapsed.
    fn take_due(&mut self, now: Instant) -> Vec<(String, FieldEdit)> {
        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|p| p.due <= now);
        self.pending = pending;
        due.into_iter().map(|p| (p.record_id, p.edit)).collect()
    }

    /// Drain everything regardless of deadline (shutdown flush).
    fn take_all(&mut self) -> Vec<(String, FieldEdit)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|p| (p.record_id, p.edit))
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct Controller<P: Presenter> {
    pub state: ViewState,
    client: ApiClient,
    store: MatchStore,
    presenter: P,
    home_feeds: Vec<String>,
    edits: DebouncedEdits,
}

impl<P: Presenter> Controller<P> {
    pub fn new(
        state: ViewState,
        client: ApiClient,
        store: MatchStore,
        presenter: P,
        home_feeds: Vec<String>,
    ) -> Self {
        Self {
            state,
            client,
            store,
            presenter,
            home_feeds,
            edits: DebouncedEdits::default(),
        }
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    // ========================================================================
    // Intent Handling
    // ========================================================================

    pub async fn handle(&mut self, intent: Intent) {
        tracing::debug!(intent = ?intent, "Handling intent");
        match intent {
            Intent::NavigateHome => {
                self.push_stripped(true);
                self.state.view = View::Home;
                self.state.feed_filter.clear();
                self.state.query.clear();
                self.state.home_pager.reset();
                self.dispatch().await;
            }
            Intent::NavigateFeed(feed) => {
                self.push_stripped(false);
                self.state.view = View::Home;
                self.state.feed_filter = feed.trim().to_lowercase();
                self.dispatch().await;
            }
            Intent::NavigateMatchCenter => {
                self.push_stripped(true);
                self.state.view = View::MatchCenter;
                self.state.feed_filter.clear();
                self.state.query.clear();
                self.dispatch().await;
            }
            Intent::SubmitSearch(query) => {
                let query = query.trim().to_string();
                let url = route::without_article(self.state.location.current());
                self.state.location.push(route::with_query(&url, &query));
                self.state.view = View::Home;
                self.state.query = query;
                self.dispatch().await;
            }
            Intent::OpenArticle { key, source_url } => {
                let url = route::with_article(
                    self.state.location.current(),
                    &key,
                    source_url.as_deref(),
                );
                self.state.location.push(url);
                self.dispatch().await;
            }
            Intent::ReaderBack => {
                // Coming out of a shared link there may be no history to pop;
                // force a plain Home instead.
                self.push_stripped(true);
                self.state.view = View::Home;
                self.state.feed_filter.clear();
                self.state.query.clear();
                self.dispatch().await;
            }
            Intent::HistoryBack => {
                if self.state.location.back() {
                    self.sync_query_from_url();
                    self.dispatch().await;
                }
            }
            Intent::HistoryForward => {
                if self.state.location.forward() {
                    self.sync_query_from_url();
                    self.dispatch().await;
                }
            }
            Intent::RequestNextPage(view) => self.request_next_page(view).await,
            Intent::Refresh => self.dispatch().await,
            Intent::SaveMatch(draft) => self.save_match(draft),
            Intent::SelectMatch(id) => {
                self.state.selected_match = self.store.get(&id).map(|r| r.id);
                self.show_match_center();
            }
            Intent::SelectPick { id, pick } => {
                let mut patch = MatchPatch::for_record(&id);
                patch.pick = Some(pick);
                self.store.upsert(patch);
                self.show_match_center();
            }
            Intent::SetConfidence { id, raw } => {
                self.edits.queue(&id, FieldEdit::Confidence(raw));
            }
            Intent::SetNotes { id, notes } => {
                self.edits.queue(&id, FieldEdit::Notes(notes));
            }
            Intent::DeleteMatch(id) => {
                self.store.remove(&id);
                if self.state.selected_match.as_deref() == Some(id.as_str()) {
                    self.state.selected_match = None;
                }
                self.show_match_center();
            }
        }
    }

    /// Strip the article route (and optionally the query) from the URL and
    /// push the result as a new history entry.
    fn push_stripped(&mut self, clear_query: bool) {
        let mut url = route::without_article(self.state.location.current());
        if clear_query {
            url = route::with_query(&url, "");
        }
        self.state.location.push(url);
    }

    /// Browser-style navigation re-derives the query from the URL alone.
    fn sync_query_from_url(&mut self) {
        self.state.query =
            route::search_query(self.state.location.current()).unwrap_or_default();
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Single entry point for every load. Drops the trigger when a dispatch
    /// is already in flight; otherwise runs exactly one render branch and
    /// stamps the last-refreshed marker.
    pub async fn dispatch(&mut self) {
        let Some(generation) = self.state.begin_dispatch() else {
            tracing::debug!("Dispatch already in flight, dropping trigger");
            return;
        };

        self.dispatch_branch(generation).await;

        let now = Utc::now();
        self.state.last_refreshed = Some(now);
        self.presenter.mark_refreshed(now);
        self.state.finish_dispatch();
    }

    async fn dispatch_branch(&mut self, generation: u64) {
        // Article route wins over all other state
        if let Some(article) = route::article_route(self.state.location.current()) {
            self.show_article(generation, article).await;
            return;
        }

        match self.state.view {
            View::MatchCenter => self.show_match_center(),
            View::Home => {
                if self.state.query.trim().is_empty() && self.state.feed_filter.is_empty() {
                    self.load_home(generation).await;
                } else {
                    self.load_feed(generation, false).await;
                }
            }
        }
    }

    // ========================================================================
    // Home
    // ========================================================================

    async fn load_home(&mut self, generation: u64) {
        self.state.browse_pager.disarm();
        self.presenter.set_status("Loading…");

        let per_feed = self
            .state
            .home_pager
            .limit()
            .clamp(HOME_PER_FEED_MIN, self.state.home_pager.ceiling());

        // Per-category fetches run concurrently; the merge below is
        // deterministic no matter which completes first.
        let client = &self.client;
        let fetches = self.home_feeds.iter().map(|feed| {
            let query = ArticleQuery {
                feed: Some(feed.clone()),
                query: None,
                limit: per_feed,
            };
            async move { client.articles_relaxed(&query).await }
        });
        let lists = join_all(fetches).await;

        if !self.state.is_current(generation) {
            tracing::debug!(generation, "Discarding stale home load");
            return;
        }

        let composed = compose::compose_home(lists, &self.home_feeds);
        let now = Utc::now();
        let breaking = compose::select_breaking(&composed, now).cloned();
        let mut top = compose::select_top_stories(&composed, HOME_TOP_POOL);
        let more = top.split_off(top.len().min(HOME_HERO_COUNT));
        let latest = compose::select_latest_text_only(&composed, HOME_LATEST_COUNT);

        self.presenter.set_status("");
        self.presenter.render_home(HomePage {
            breaking,
            hero: top,
            more,
            latest,
            total: composed.len(),
        });
        self.state.home_pager.arm();
    }

    // ========================================================================
    // Feed / Search
    // ========================================================================

    async fn load_feed(&mut self, generation: u64, append: bool) {
        self.state.home_pager.disarm();
        if !append {
            self.state.browse_pager.reset();
            self.presenter.set_status("Loading…");
        }

        let query_text = self.state.query.trim().to_string();
        let items = self
            .client
            .articles_relaxed(&ArticleQuery {
                feed: Some(self.state.feed_filter.clone()).filter(|f| !f.is_empty()),
                query: Some(query_text.clone()).filter(|q| !q.is_empty()),
                limit: self.state.browse_pager.limit(),
            })
            .await;

        if !self.state.is_current(generation) {
            tracing::debug!(generation, "Discarding stale feed load");
            return;
        }

        let from_search = !query_text.is_empty();
        let count = items.len();
        self.presenter.render_feed(FeedPage {
            label: self.feed_label(from_search),
            items,
            append,
            from_search,
        });
        self.presenter.set_status(&if from_search {
            format!("{count} result(s)")
        } else {
            format!("{count} latest")
        });
        self.state.browse_pager.arm();
    }

    fn feed_label(&self, from_search: bool) -> String {
        let filter = self.state.feed_filter.trim();
        if !filter.is_empty() {
            // Title-case the category tag
            let mut chars = filter.chars();
            return match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            };
        }
        if from_search {
            "Results".to_string()
        } else {
            "News".to_string()
        }
    }

    // ========================================================================
    // Article Reader
    // ========================================================================

    async fn show_article(&mut self, generation: u64, route: ArticleRoute) {
        self.state.home_pager.disarm();
        self.state.browse_pager.disarm();
        self.presenter.set_status("Loading article…");

        let reader = self
            .client
            .reader(route.source_url.as_deref(), &route.key)
            .await;
        if !self.state.is_current(generation) {
            tracing::debug!(generation, "Discarding stale article load");
            return;
        }

        // Hero image: payload image first, then best-effort pick_image;
        // branding images are rejected either way.
        let mut hero = reader
            .image_url
            .clone()
            .filter(|u| !compose::is_logoish(u));
        if hero.is_none() {
            if let Some(source_url) = route.source_url.as_deref() {
                hero = self
                    .client
                    .pick_image(source_url)
                    .await
                    .filter(|u| !compose::is_logoish(u));
                if !self.state.is_current(generation) {
                    return;
                }
            }
        }
        let hero_image = hero.map(|u| self.client.proxied_image(&u).to_string());

        self.presenter.set_status("");
        self.presenter.render_article(ArticlePage {
            article: reader,
            hero_image,
            source_url: route.source_url,
        });
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    async fn request_next_page(&mut self, view: PagedView) {
        // Sentinel triggers arriving mid-load are suppressed outright
        if self.state.is_inflight() {
            return;
        }
        match view {
            PagedView::Home => {
                if self.state.home_pager.advance().is_none() {
                    return;
                }
                // Home "append" re-runs the whole composition; the scroll
                // position is read before and restored after the re-render.
                let offset = self.presenter.scroll_offset();
                self.dispatch().await;
                self.presenter.restore_scroll(offset);
            }
            PagedView::Browse => {
                if self.state.browse_pager.advance().is_none() {
                    return;
                }
                let Some(generation) = self.state.begin_dispatch() else {
                    return;
                };
                self.load_feed(generation, true).await;
                let now = Utc::now();
                self.state.last_refreshed = Some(now);
                self.presenter.mark_refreshed(now);
                self.state.finish_dispatch();
            }
        }
    }

    // ========================================================================
    // Match Center
    // ========================================================================

    fn show_match_center(&mut self) {
        self.state.home_pager.disarm();
        self.state.browse_pager.disarm();
        self.presenter.render_match_center(MatchCenterPage {
            records: self.store.list(),
            selected: self.state.selected_match.clone(),
        });
    }

    fn save_match(&mut self, draft: MatchDraft) {
        if draft.home.trim().is_empty() || draft.away.trim().is_empty() {
            self.presenter.set_status("Home & Away team are required.");
            return;
        }

        let record = self.store.upsert(MatchPatch {
            id: None,
            league: Some(draft.league.trim().to_string()),
            home: Some(draft.home.trim().to_string()),
            away: Some(draft.away.trim().to_string()),
            kickoff: Some(draft.kickoff),
            pick: Some(Pick::None),
            confidence: None,
            notes: Some(String::new()),
        });
        self.state.selected_match = Some(record.id);
        self.presenter.set_status("Saved.");
        self.show_match_center();
    }

    // ========================================================================
    // Ticks
    // ========================================================================

    /// Periodic tick: commit debounced edits whose quiet period elapsed.
    pub fn tick(&mut self) {
        let due = self.edits.take_due(Instant::now());
        self.commit_edits(due);
    }

    /// Shutdown flush: commit everything still pending.
    pub fn flush_pending_edits(&mut self) {
        let all = self.edits.take_all();
        self.commit_edits(all);
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    fn commit_edits(&mut self, edits: Vec<(String, FieldEdit)>) {
        if edits.is_empty() {
            return;
        }
        for (record_id, edit) in edits {
            let mut patch = MatchPatch::for_record(&record_id);
            match edit {
                FieldEdit::Confidence(raw) => {
                    patch.confidence = Some(sanitize_confidence(&raw));
                }
                FieldEdit::Notes(notes) => patch.notes = Some(notes),
            }
            self.store.upsert(patch);
        }
        // Reflect committed edits when the Match Center is on screen
        if self.state.view == View::MatchCenter
            && route::article_route(self.state.location.current()).is_none()
        {
            self.show_match_center();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Presenter;
    use chrono::DateTime;
    use std::path::PathBuf;
    use url::Url;

    /// Presenter double recording every call.
    #[derive(Default)]
    struct Recording {
        homes: Vec<HomePage>,
        feeds: Vec<FeedPage>,
        articles: Vec<ArticlePage>,
        match_centers: Vec<MatchCenterPage>,
        statuses: Vec<String>,
        refreshed: usize,
        scroll: usize,
        restored: Vec<usize>,
    }

    impl Presenter for Recording {
        fn render_home(&mut self, page: HomePage) {
            self.homes.push(page);
        }
        fn render_feed(&mut self, page: FeedPage) {
            self.feeds.push(page);
        }
        fn render_article(&mut self, page: ArticlePage) {
            self.articles.push(page);
        }
        fn render_match_center(&mut self, page: MatchCenterPage) {
            self.match_centers.push(page);
        }
        fn set_status(&mut self, message: &str) {
            self.statuses.push(message.to_string());
        }
        fn mark_refreshed(&mut self, _at: DateTime<Utc>) {
            self.refreshed += 1;
        }
        fn scroll_offset(&self) -> usize {
            self.scroll
        }
        fn restore_scroll(&mut self, offset: usize) {
            self.restored.push(offset);
        }
    }

    fn temp_store(name: &str) -> (MatchStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("newsdesk_controller_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("matches.json");
        let _ = std::fs::remove_file(&path);
        (MatchStore::new(path), dir)
    }

    /// Controller against an unreachable backend: every fetch degrades to
    /// empty, which is exactly what these state-machine tests need.
    fn controller(name: &str) -> (Controller<Recording>, PathBuf) {
        let (store, dir) = temp_store(name);
        let state = ViewState::new(Url::parse("https://newsdesk.test/").unwrap());
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let feeds = vec!["politics".to_string(), "football".to_string()];
        (
            Controller::new(state, client, store, Recording::default(), feeds),
            dir,
        )
    }

    #[tokio::test]
    async fn test_inflight_dispatch_dropped() {
        let (mut c, dir) = controller("single_flight");
        c.state.force_inflight();

        c.dispatch().await;

        assert_eq!(c.presenter().homes.len(), 0);
        assert_eq!(c.presenter().refreshed, 0);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_dispatch_renders_exactly_one_branch() {
        let (mut c, dir) = controller("one_branch");
        c.dispatch().await;

        let p = c.presenter();
        assert_eq!(p.homes.len(), 1);
        assert_eq!(p.feeds.len(), 0);
        assert_eq!(p.articles.len(), 0);
        assert_eq!(p.match_centers.len(), 0);
        assert_eq!(p.refreshed, 1);
        assert!(c.state.last_refreshed.is_some());
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_article_route_wins_over_view_state() {
        let (mut c, dir) = controller("article_wins");
        c.state.view = View::MatchCenter;
        c.handle(Intent::OpenArticle {
            key: "story-1".to_string(),
            source_url: None,
        })
        .await;

        let p = c.presenter();
        assert_eq!(p.articles.len(), 1);
        assert_eq!(p.match_centers.len(), 0);
        assert_eq!(p.articles[0].article.title, "story-1");
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_search_routes_into_feed_branch() {
        let (mut c, dir) = controller("search_branch");
        c.handle(Intent::SubmitSearch("transfer".to_string())).await;

        let p = c.presenter();
        assert_eq!(p.homes.len(), 0);
        assert_eq!(p.feeds.len(), 1);
        assert!(p.feeds[0].from_search);
        assert_eq!(p.feeds[0].label, "Results");
        assert!(p.statuses.contains(&"0 result(s)".to_string()));
        // Query landed in the URL
        assert_eq!(
            route::search_query(c.state.location.current()).as_deref(),
            Some("transfer")
        );
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_reader_back_forces_plain_home() {
        let (mut c, dir) = controller("reader_back");
        c.handle(Intent::SubmitSearch("q".to_string())).await;
        c.handle(Intent::OpenArticle {
            key: "k".to_string(),
            source_url: None,
        })
        .await;

        c.handle(Intent::ReaderBack).await;

        assert_eq!(c.state.view, View::Home);
        assert_eq!(c.state.query, "");
        assert_eq!(c.state.feed_filter, "");
        assert!(route::article_route(c.state.location.current()).is_none());
        // Last render is the plain Home branch
        assert_eq!(c.presenter().homes.len(), 1);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_history_back_reevaluates_from_url() {
        let (mut c, dir) = controller("history_back");
        c.dispatch().await;
        c.handle(Intent::OpenArticle {
            key: "k".to_string(),
            source_url: None,
        })
        .await;
        assert_eq!(c.presenter().articles.len(), 1);

        c.handle(Intent::HistoryBack).await;

        // Back to a URL without an article route: home renders again
        assert_eq!(c.presenter().homes.len(), 2);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_home_pagination_preserves_scroll() {
        let (mut c, dir) = controller("home_scroll");
        c.dispatch().await;
        c.presenter.scroll = 42;

        c.handle(Intent::RequestNextPage(PagedView::Home)).await;

        assert_eq!(c.state.home_pager.limit(), 36);
        assert_eq!(c.presenter().homes.len(), 2);
        assert_eq!(c.presenter().restored, vec![42]);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_browse_pagination_appends_without_reset() {
        let (mut c, dir) = controller("browse_append");
        c.handle(Intent::NavigateFeed("politics".to_string())).await;
        assert_eq!(c.state.browse_pager.limit(), 12);

        c.handle(Intent::RequestNextPage(PagedView::Browse)).await;

        assert_eq!(c.state.browse_pager.limit(), 24);
        let p = c.presenter();
        assert_eq!(p.feeds.len(), 2);
        assert!(p.feeds[1].append);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_pagination_suppressed_while_inflight() {
        let (mut c, dir) = controller("paginate_inflight");
        c.handle(Intent::NavigateFeed("politics".to_string())).await;
        c.state.force_inflight();

        c.handle(Intent::RequestNextPage(PagedView::Browse)).await;

        assert_eq!(c.state.browse_pager.limit(), 12);
        assert_eq!(c.presenter().feeds.len(), 1);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_save_match_requires_teams() {
        let (mut c, dir) = controller("save_validation");
        c.handle(Intent::SaveMatch(MatchDraft {
            home: "Arsenal".to_string(),
            away: "  ".to_string(),
            ..MatchDraft::default()
        }))
        .await;

        assert!(c
            .presenter()
            .statuses
            .contains(&"Home & Away team are required.".to_string()));
        assert_eq!(c.presenter().match_centers.len(), 0);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_save_match_selects_and_renders() {
        let (mut c, dir) = controller("save_ok");
        c.handle(Intent::SaveMatch(MatchDraft {
            home: "Arsenal".to_string(),
            away: "Chelsea".to_string(),
            league: "EPL".to_string(),
            kickoff: None,
        }))
        .await;

        let p = c.presenter();
        assert!(p.statuses.contains(&"Saved.".to_string()));
        assert_eq!(p.match_centers.len(), 1);
        assert_eq!(p.match_centers[0].records.len(), 1);
        assert_eq!(p.match_centers[0].selected, c.state.selected_match);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_confidence_edit_debounces_and_clamps() {
        let (mut c, dir) = controller("debounce_conf");
        c.state.view = View::MatchCenter;
        c.handle(Intent::SaveMatch(MatchDraft {
            home: "A".to_string(),
            away: "B".to_string(),
            ..MatchDraft::default()
        }))
        .await;
        let id = c.state.selected_match.clone().unwrap();

        c.handle(Intent::SetConfidence {
            id: id.clone(),
            raw: "150".to_string(),
        })
        .await;

        // Before the quiet period nothing is committed
        tokio::time::advance(Duration::from_millis(100)).await;
        c.tick();
        assert_eq!(c.store.get(&id).unwrap().confidence, None);

        tokio::time::advance(Duration::from_millis(200)).await;
        c.tick();
        assert_eq!(c.store.get(&id).unwrap().confidence, Some(100));
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_last_write_wins() {
        let (mut c, dir) = controller("debounce_last");
        c.handle(Intent::SaveMatch(MatchDraft {
            home: "A".to_string(),
            away: "B".to_string(),
            ..MatchDraft::default()
        }))
        .await;
        let id = c.state.selected_match.clone().unwrap();

        c.handle(Intent::SetConfidence {
            id: id.clone(),
            raw: "40".to_string(),
        })
        .await;
        tokio::time::advance(Duration::from_millis(200)).await;
        // Re-edit restarts the quiet period with the newer value
        c.handle(Intent::SetConfidence {
            id: id.clone(),
            raw: "65".to_string(),
        })
        .await;
        tokio::time::advance(Duration::from_millis(100)).await;
        c.tick();
        assert_eq!(c.store.get(&id).unwrap().confidence, None);

        tokio::time::advance(Duration::from_millis(200)).await;
        c.tick();
        assert_eq!(c.store.get(&id).unwrap().confidence, Some(65));
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_notes_and_confidence_debounce_independently() {
        let (mut c, dir) = controller("debounce_fields");
        c.handle(Intent::SaveMatch(MatchDraft {
            home: "A".to_string(),
            away: "B".to_string(),
            ..MatchDraft::default()
        }))
        .await;
        let id = c.state.selected_match.clone().unwrap();

        c.handle(Intent::SetNotes {
            id: id.clone(),
            notes: "solid home form".to_string(),
        })
        .await;
        c.handle(Intent::SetConfidence {
            id: id.clone(),
            raw: "-5".to_string(),
        })
        .await;

        tokio::time::advance(Duration::from_millis(300)).await;
        c.tick();

        let record = c.store.get(&id).unwrap();
        assert_eq!(record.notes, "solid home form");
        assert_eq!(record.confidence, Some(5)); // "-" stripped, within range
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_shutdown_flush_commits_pending() {
        let (mut c, dir) = controller("flush");
        c.handle(Intent::SaveMatch(MatchDraft {
            home: "A".to_string(),
            away: "B".to_string(),
            ..MatchDraft::default()
        }))
        .await;
        let id = c.state.selected_match.clone().unwrap();

        c.handle(Intent::SetNotes {
            id: id.clone(),
            notes: "n".to_string(),
        })
        .await;
        assert!(c.has_pending_edits());

        c.flush_pending_edits();
        assert!(!c.has_pending_edits());
        assert_eq!(c.store.get(&id).unwrap().notes, "n");
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_delete_match_clears_selection() {
        let (mut c, dir) = controller("delete");
        c.handle(Intent::SaveMatch(MatchDraft {
            home: "A".to_string(),
            away: "B".to_string(),
            ..MatchDraft::default()
        }))
        .await;
        let id = c.state.selected_match.clone().unwrap();

        c.handle(Intent::DeleteMatch(id.clone())).await;

        assert_eq!(c.state.selected_match, None);
        assert!(c.store.get(&id).is_none());
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_navigation_disarms_departing_sentinels() {
        let (mut c, dir) = controller("sentinel_teardown");
        c.dispatch().await;
        assert!(c.state.home_pager.is_armed());

        c.handle(Intent::NavigateMatchCenter).await;
        assert!(!c.state.home_pager.is_armed());
        assert!(!c.state.browse_pager.is_armed());
        std::fs::remove_dir_all(dir).ok();
    }
}
