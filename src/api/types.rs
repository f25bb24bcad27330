use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Articles whose timestamps are present but unparseable rank as very old.
const UNPARSEABLE_AGE_MINUTES: f64 = 1.0e9;

// ============================================================================
// Timestamps
// ============================================================================

/// A timestamp field from the wire, which may be absent or malformed.
///
/// The distinction matters for ranking: a missing `published_at` falls back
/// to `ingested_at` and then to "now" (zero age), while a malformed one
/// yields a very large age and effectively no recency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Missing,
    Invalid,
    At(DateTime<Utc>),
}

impl Timestamp {
    /// Parse an optional wire string. Empty/whitespace counts as missing.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(s) = raw else {
            return Timestamp::Missing;
        };
        let s = s.trim();
        if s.is_empty() {
            return Timestamp::Missing;
        }
        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Timestamp::At(t.with_timezone(&Utc));
        }
        if let Ok(t) = DateTime::parse_from_rfc2822(s) {
            return Timestamp::At(t.with_timezone(&Utc));
        }
        Timestamp::Invalid
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::At(t) => Some(*t),
            _ => None,
        }
    }

    /// Millisecond sort key; missing and malformed both sort oldest.
    pub fn sort_millis(&self) -> i64 {
        self.at().map(|t| t.timestamp_millis()).unwrap_or(0)
    }
}

// ============================================================================
// Wire Payload
// ============================================================================

/// Raw article payload as the backend serves it.
///
/// The backend is duck-typed: content may arrive under any of five keys,
/// the image under two, the summary under two, and `id` as string or
/// number. All fields are optional; [`RawArticle::normalize`] resolves the
/// alternates by explicit priority into one strict [`Article`].
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RawArticle {
    pub id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub feed: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(rename = "ingestedAt")]
    pub ingested_at: Option<String>,
    pub content: Option<String>,
    pub body: Option<String>,
    pub text: Option<String>,
    pub article: Option<String>,
    pub html: Option<String>,
}

impl RawArticle {
    /// Normalize into the strict article shape used everywhere past the
    /// fetch boundary.
    pub fn normalize(self) -> Article {
        let published_at = Timestamp::parse(self.published_at.as_deref());
        let ingested_at = Timestamp::parse(self.ingested_at.as_deref());
        Article {
            id: self.id.as_ref().and_then(id_to_string),
            title: self.title.unwrap_or_default(),
            summary: first_nonempty([self.summary, self.description]).unwrap_or_default(),
            feed: self
                .feed
                .map(|f| f.trim().to_lowercase())
                .unwrap_or_default(),
            image_url: first_nonempty([self.image_url, self.image]),
            url: first_nonempty([self.url]),
            source: self.source.unwrap_or_default(),
            author: first_nonempty([self.author]),
            published_at,
            ingested_at,
            content: first_nonempty([self.content, self.body, self.text, self.article, self.html]),
        }
    }
}

fn id_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First alternate that is present and non-blank after trimming.
fn first_nonempty<const N: usize>(alternates: [Option<String>; N]) -> Option<String> {
    alternates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

// ============================================================================
// Normalized Article
// ============================================================================

/// A normalized article: one canonical field per concern, alternates
/// resolved, category tag lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Opaque stable identifier, used for routing and permalinks.
    pub id: Option<String>,
    pub title: String,
    pub summary: String,
    /// Category tag (lowercased), empty when the backend sent none.
    pub feed: String,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub source: String,
    pub author: Option<String>,
    pub published_at: Timestamp,
    pub ingested_at: Timestamp,
    /// Canonical extracted content, resolved content → body → text →
    /// article → html.
    pub content: Option<String>,
}

impl Article {
    /// Age in minutes for ranking. `published_at` falls back to
    /// `ingested_at` and then to `now` (zero age); a malformed timestamp
    /// yields a very large age.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> f64 {
        let age_of = |t: DateTime<Utc>| ((now - t).num_seconds() as f64 / 60.0).max(0.0);
        match self.published_at {
            Timestamp::At(t) => age_of(t),
            Timestamp::Invalid => UNPARSEABLE_AGE_MINUTES,
            Timestamp::Missing => match self.ingested_at {
                Timestamp::At(t) => age_of(t),
                Timestamp::Invalid => UNPARSEABLE_AGE_MINUTES,
                Timestamp::Missing => 0.0,
            },
        }
    }

    /// Millisecond sort key for descending-recency ordering.
    pub fn sort_millis(&self) -> i64 {
        match self.published_at {
            Timestamp::Missing => self.ingested_at.sort_millis(),
            _ => self.published_at.sort_millis(),
        }
    }
}

// ============================================================================
// Reader Payload
// ============================================================================

/// The single-article payload shown in the reader view.
///
/// Built from whatever the reader endpoints returned, with the list-view
/// article (or the bare route) as fallback for fields the extractor missed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderArticle {
    pub title: String,
    pub source: String,
    pub author: Option<String>,
    pub published_at: Timestamp,
    pub image_url: Option<String>,
    pub summary: String,
    /// Extracted full text; `None` when the extractor had nothing, in which
    /// case the presenter falls back to summary + a source pointer.
    pub content: Option<String>,
}

impl ReaderArticle {
    /// Merge a raw reader payload with fallback values from the route.
    ///
    /// The payload wins field by field; the fallback title (usually the
    /// article key from the URL) fills in when extraction came back empty.
    pub fn from_payload(raw: RawArticle, fallback_title: &str) -> Self {
        let normalized = raw.normalize();
        let title = if normalized.title.trim().is_empty() {
            if fallback_title.trim().is_empty() {
                "Article".to_string()
            } else {
                fallback_title.to_string()
            }
        } else {
            normalized.title
        };
        Self {
            title,
            source: normalized.source,
            author: normalized.author,
            published_at: match normalized.published_at {
                Timestamp::Missing => normalized.ingested_at,
                other => other,
            },
            image_url: normalized.image_url,
            summary: normalized.summary,
            content: normalized
                .content
                .filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
