//! Shared test fixtures: a recording presenter and controller builders.

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use url::Url;

use newsdesk::api::ApiClient;
use newsdesk::app::ViewState;
use newsdesk::controller::Controller;
use newsdesk::predictions::MatchStore;
use newsdesk::render::{ArticlePage, FeedPage, HomePage, MatchCenterPage, Presenter};

/// Presenter double that records every page model and status message.
#[derive(Default)]
pub struct RecordingPresenter {
    pub homes: Vec<HomePage>,
    pub feeds: Vec<FeedPage>,
    pub articles: Vec<ArticlePage>,
    pub match_centers: Vec<MatchCenterPage>,
    pub statuses: Vec<String>,
    pub refreshed: usize,
    pub scroll: usize,
    pub restored: Vec<usize>,
}

impl Presenter for RecordingPresenter {
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

/// Controller wired to `api_base` with an isolated match store.
///
/// The returned `TempDir` keeps the store directory alive for the test.
pub fn controller_for(api_base: &str) -> (Controller<RecordingPresenter>, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let store = MatchStore::new(dir.path().join("matches.json"));
    let state = ViewState::new(Url::parse("app://newsdesk/").unwrap());
    let client = ApiClient::new(api_base).expect("client");
    let home_feeds = vec![
        "politics".to_string(),
        "football".to_string(),
        "celebrity".to_string(),
    ];
    (
        Controller::new(state, client, store, RecordingPresenter::default(), home_feeds),
        dir,
    )
}
