use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use lru::LruCache;
use reqwest::redirect::Policy;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use super::types::{Article, RawArticle, ReaderArticle};

/// Reader payloads kept in memory; keyed by source-URL digest.
const READER_CACHE_ENTRIES: usize = 64;
/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Error Types
// ============================================================================

/// Errors crossing the HTTP boundary.
///
/// Callers on the composition path never see these — list fetches go
/// through [`ApiClient::articles_relaxed`], which degrades to empty.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, body decode).
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The configured API base URL could not be parsed.
    #[error("Invalid API base URL: {0}")]
    InvalidBase(#[from] url::ParseError),
}

// ============================================================================
// Queries
// ============================================================================

/// Parameters for a `/articles` list fetch.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    /// Category filter; `None` browses across feeds.
    pub feed: Option<String>,
    /// Free-text search query.
    pub query: Option<String>,
    /// Item limit (the pagination cursor for the issuing view).
    pub limit: usize,
}

// ============================================================================
// Client
// ============================================================================

/// Create a redirect policy with loop detection and limited hops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }
        attempt.follow()
    })
}

/// HTTP client for the backend article API.
///
/// All requests are cache-busted with a `_t` millisecond parameter so
/// intermediate caches never serve stale feeds. Reader payloads are cached
/// in memory (LRU) keyed by a digest of the source URL.
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    reader_cache: Mutex<LruCache<[u8; 32], ReaderArticle>>,
}

impl ApiClient {
    pub fn new(api_base: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(api_base)?;
        // Joining relative paths requires a trailing slash on the base
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache_size = NonZeroUsize::new(READER_CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            base,
            http,
            reader_cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        // Relative literals always join onto the normalized base
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    /// Append the cache-busting `_t` parameter.
    fn cache_bust(url: &mut Url) {
        url.query_pairs_mut()
            .append_pair("_t", &Utc::now().timestamp_millis().to_string());
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, mut url: Url) -> Result<T, ApiError> {
        Self::cache_bust(&mut url);
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    // ========================================================================
    // Article Lists
    // ========================================================================

    /// Fetch an article list from `/articles`.
    pub async fn articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, ApiError> {
        let mut url = self.endpoint("articles");
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(feed) = query.feed.as_deref().filter(|f| !f.is_empty()) {
                pairs.append_pair("feed", feed);
            }
            if let Some(q) = query.query.as_deref().filter(|q| !q.is_empty()) {
                pairs.append_pair("q", q);
            }
            pairs.append_pair("limit", &query.limit.to_string());
        }

        let raw: Vec<RawArticle> = self.get_json(url).await?;
        Ok(raw.into_iter().map(RawArticle::normalize).collect())
    }

    /// Fetch an article list, degrading any failure to an empty list.
    ///
    /// This is the composition path: a category whose fetch fails simply
    /// contributes nothing to the merge.
    pub async fn articles_relaxed(&self, query: &ArticleQuery) -> Vec<Article> {
        match self.articles(query).await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(
                    feed = query.feed.as_deref().unwrap_or(""),
                    error = %e,
                    "Article fetch failed, substituting empty list"
                );
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Reader
    // ========================================================================

    /// Fetch the reader payload for a source URL.
    ///
    /// Tries `/article`, `/read` and `/extract` in order; the first
    /// successful JSON object wins. Returns `None` when every endpoint
    /// fails or no source URL is known — the caller still renders a
    /// fallback page from the route. Successful payloads are cached.
    pub async fn reader(&self, source_url: Option<&str>, fallback_title: &str) -> ReaderArticle {
        let Some(source_url) = source_url.filter(|u| !u.trim().is_empty()) else {
            return ReaderArticle::from_payload(RawArticle::default(), fallback_title);
        };

        let key = reader_cache_key(source_url);
        if let Ok(mut cache) = self.reader_cache.lock() {
            if let Some(cached) = cache.get(&key) {
                tracing::debug!(url = %source_url, "Reader payload served from cache");
                return cached.clone();
            }
        }

        for path in ["article", "read", "extract"] {
            let mut url = self.endpoint(path);
            url.query_pairs_mut().append_pair("url", source_url);
            match self.get_json::<RawArticle>(url).await {
                Ok(raw) => {
                    let reader = ReaderArticle::from_payload(raw, fallback_title);
                    if let Ok(mut cache) = self.reader_cache.lock() {
                        cache.put(key, reader.clone());
                    }
                    return reader;
                }
                Err(e) => {
                    tracing::debug!(endpoint = path, error = %e, "Reader endpoint failed, trying next");
                }
            }
        }

        tracing::warn!(url = %source_url, "All reader endpoints failed");
        ReaderArticle::from_payload(RawArticle::default(), fallback_title)
    }

    /// Best-effort image resolution via `/pick_image`. Failures yield `None`.
    pub async fn pick_image(&self, source_url: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct PickImage {
            #[serde(rename = "imageUrl")]
            image_url: Option<String>,
        }

        let mut url = self.endpoint("pick_image");
        url.query_pairs_mut().append_pair("url", source_url);
        match self.get_json::<PickImage>(url).await {
            Ok(picked) => picked.image_url.filter(|u| !u.trim().is_empty()),
            Err(e) => {
                tracing::debug!(url = %source_url, error = %e, "pick_image failed");
                None
            }
        }
    }

    // ========================================================================
    // URL Construction
    // ========================================================================

    /// Proxy URL for displaying a remote image through the backend.
    pub fn proxied_image(&self, image_url: &str) -> Url {
        let mut url = self.endpoint("img");
        url.query_pairs_mut().append_pair("url", image_url);
        url
    }

    /// Canonical shareable permalink for an article.
    ///
    /// Prefers the backend SSR page `/r/<id>` (which carries social
    /// metadata); articles without an id fall back to their source URL.
    pub fn permalink(&self, article: &Article) -> Option<Url> {
        if let Some(id) = article.id.as_deref() {
            let mut url = self.endpoint("r");
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.push(id);
            }
            return Some(url);
        }
        article.url.as_deref().and_then(|u| Url::parse(u).ok())
    }
}

fn reader_cache_key(source_url: &str) -> [u8; 32] {
    Sha256::digest(source_url.as_bytes()).into()
}

// ============================================================================
// Tests
// ============================================================================
