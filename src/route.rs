//! URL routing: the query parameters the controller owns.
//!
//! The core owns exactly three query parameters — `article` (internal
//! article key), `u` (original source URL) and `q` (search query) — and
//! must parse, construct and strip them without disturbing unrelated
//! parameters. Everything else on the URL belongs to someone else.
//!
//! [`Location`] models the browser-style address bar plus history stack:
//! navigation pushes entries (truncating any forward history), back/forward
//! move the cursor, and dispatch re-evaluates purely from the current URL.

use url::Url;

const ARTICLE_PARAM: &str = "article";
const SOURCE_PARAM: &str = "u";
const QUERY_PARAM: &str = "q";

// ============================================================================
// Article Route
// ============================================================================

/// The article route carried in the URL, when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRoute {
    /// Internal article key (slug-id). Non-empty by construction.
    pub key: String,
    /// Original source URL, used to fetch full content from the backend.
    pub source_url: Option<String>,
}

/// Extract the article route, if the URL carries a non-empty `article` key.
pub fn article_route(url: &Url) -> Option<ArticleRoute> {
    let mut key = None;
    let mut source_url = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            ARTICLE_PARAM if !v.trim().is_empty() => key = Some(v.into_owned()),
            SOURCE_PARAM if !v.trim().is_empty() => source_url = Some(v.into_owned()),
            _ => {}
        }
    }
    key.map(|key| ArticleRoute { key, source_url })
}

/// The search query parameter, when present and non-empty.
pub fn search_query(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == QUERY_PARAM)
        .map(|(_, v)| v.trim().to_string())
        .filter(|q| !q.is_empty())
}

// ============================================================================
// URL Construction
// ============================================================================

/// Rebuild `url` keeping every query pair except those `drop` matches,
/// then appending `add`.
fn rewrite_query(url: &Url, drop: &[&str], add: &[(&str, &str)]) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !drop.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut next = url.clone();
    next.set_query(None);
    if !kept.is_empty() || !add.is_empty() {
        let mut pairs = next.query_pairs_mut();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        for (k, v) in add {
            pairs.append_pair(k, v);
        }
    }
    next
}

/// URL for an internal article link: sets `article` and (when known) `u`,
/// replacing any previous article route on the URL.
pub fn with_article(url: &Url, key: &str, source_url: Option<&str>) -> Url {
    let mut add = vec![(ARTICLE_PARAM, key)];
    if let Some(src) = source_url {
        add.push((SOURCE_PARAM, src));
    }
    rewrite_query(url, &[ARTICLE_PARAM, SOURCE_PARAM], &add)
}

/// URL with the article route stripped; unrelated parameters survive.
pub fn without_article(url: &Url) -> Url {
    rewrite_query(url, &[ARTICLE_PARAM, SOURCE_PARAM], &[])
}

/// URL with the search query set (or cleared when empty).
pub fn with_query(url: &Url, query: &str) -> Url {
    if query.trim().is_empty() {
        rewrite_query(url, &[QUERY_PARAM], &[])
    } else {
        rewrite_query(url, &[QUERY_PARAM], &[(QUERY_PARAM, query.trim())])
    }
}

// ============================================================================
// Location / History
// ============================================================================

/// Browser-style location: a history stack with a cursor.
///
/// `push` behaves like `history.pushState` (truncates forward entries);
/// `back`/`forward` move the cursor and report whether they moved. The
/// controller re-derives all routing state from [`Location::current`].
#[derive(Debug, Clone)]
pub struct Location {
    entries: Vec<Url>,
    index: usize,
}

impl Location {
    pub fn new(start: Url) -> Self {
        Self {
            entries: vec![start],
            index: 0,
        }
    }

    pub fn current(&self) -> &Url {
        &self.entries[self.index]
    }

    /// Push a new entry, discarding any forward history.
    pub fn push(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index += 1;
    }

    /// Replace the current entry in place (no history growth).
    pub fn replace(&mut self, url: Url) {
        self.entries[self.index] = url;
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
