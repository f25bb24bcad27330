//! Home-feed composition: merge, dedup, and ranking heuristics.
//!
//! Everything here is pure: given already-fetched article lists the
//! composer produces one interleaved, deduplicated sequence plus the named
//! sub-selections (breaking pick, top stories, text-only latest). Failed
//! fetches show up as empty input lists; the composer itself never fails.
//!
//! The classification heuristics (hot keywords, logo-ish images) are plain
//! predicate functions over keyword lists held as module data, so they can
//! be verified independently of any feed.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::collections::VecDeque;

use crate::api::Article;

// ============================================================================
// Heuristic Data
// ============================================================================

/// Keywords that mark an item as breaking-news-adjacent. Each keyword found
/// in the title+summary text contributes a flat score bonus.
const HOT_KEYWORDS: &[&str] = &[
    "breaking",
    "alert",
    "just in",
    "live",
    "exclusive",
    "major",
    "update",
    "confirmed",
    "crisis",
];

/// Substrings that mark an image URL as branding rather than content.
const LOGOISH_KEYWORDS: &[&str] = &[
    "logo",
    "favicon",
    "sprite",
    "placeholder",
    "default",
    "brand",
];

/// Score bonus per matched hot keyword.
const HOT_KEYWORD_BONUS: f64 = 120.0;
/// Recency score starts here and decays one point per minute of age.
const RECENCY_CEILING_MINUTES: f64 = 600.0;
/// Title length contributes at most this many points.
const TITLE_LENGTH_CAP: f64 = 60.0;
/// Bonus for carrying a real (non-logo) image.
const IMAGE_BONUS: f64 = 40.0;

// ============================================================================
// Predicates
// ============================================================================

/// True when an image URL looks like branding/decoration rather than
/// article content: known keyword substrings, or an `.svg` extension.
pub fn is_logoish(url: &str) -> bool {
    let s = url.to_lowercase();
    LOGOISH_KEYWORDS.iter().any(|k| s.contains(k)) || s.ends_with(".svg")
}

/// True when the article carries an image classified as real content.
pub fn has_content_image(article: &Article) -> bool {
    article
        .image_url
        .as_deref()
        .is_some_and(|u| !u.trim().is_empty() && !is_logoish(u))
}

/// Number of distinct hot keywords present in the lowercased text.
pub fn hot_keyword_hits(text: &str) -> usize {
    HOT_KEYWORDS.iter().filter(|k| text.contains(*k)).count()
}

/// Dedup key: lowercased, trimmed title. `None` for empty titles, which are
/// suppressed from composed results entirely.
pub fn normalized_title(article: &Article) -> Option<String> {
    let key = article.title.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

// ============================================================================
// Merge / Interleave
// ============================================================================

/// Compose the home feed from per-category fetch results.
///
/// Flattens the lists, sorts by descending recency (stable, so bucket order
/// is recency order), round-robin interleaves the known categories, appends
/// leftovers and uncategorized items, and dedups by normalized title.
pub fn compose_home(lists: Vec<Vec<Article>>, category_order: &[String]) -> Vec<Article> {
    let mut all: Vec<Article> = lists.into_iter().flatten().collect();
    all.sort_by_key(|a| std::cmp::Reverse(a.sort_millis()));
    merge_by_category(all, category_order)
}

/// Round-robin interleave by category tag.
///
/// Walks `category_order` repeatedly, popping one item per non-empty bucket
/// each pass, until every bucket drains; items whose tag matches no bucket
/// are appended afterwards in their incoming order. Title-dedup is applied
/// once, at the end, first occurrence wins.
pub fn merge_by_category(items: Vec<Article>, category_order: &[String]) -> Vec<Article> {
    let mut buckets: Vec<VecDeque<Article>> =
        category_order.iter().map(|_| VecDeque::new()).collect();
    let mut rest = Vec::new();

    for article in items {
        match category_order.iter().position(|c| *c == article.feed) {
            Some(idx) => buckets[idx].push_back(article),
            None => rest.push(article),
        }
    }

    let mut merged = Vec::new();
    loop {
        let mut added = false;
        for bucket in buckets.iter_mut() {
            if let Some(article) = bucket.pop_front() {
                merged.push(article);
                added = true;
            }
        }
        if !added {
            break;
        }
    }
    merged.extend(rest);

    dedup_by_title(merged)
}

/// Drop empty-titled items and title-duplicates, keeping first occurrences.
pub fn dedup_by_title(items: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|a| match normalized_title(a) {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}

// ============================================================================
// Sub-selections
// ============================================================================

/// Breaking-news score for one article.
///
/// Recency (up to 600, decaying a point per minute of age) + 120 per hot
/// keyword matched in title+summary + title length capped at 60 + 40 for a
/// real image.
pub fn breaking_score(article: &Article, now: DateTime<Utc>) -> f64 {
    let text = format!(
        "{} {}",
        article.title.to_lowercase(),
        article.summary.to_lowercase()
    );

    let mut score = (RECENCY_CEILING_MINUTES - article.age_minutes(now)).max(0.0);
    score += HOT_KEYWORD_BONUS * hot_keyword_hits(&text) as f64;
    score += (article.title.chars().count() as f64).min(TITLE_LENGTH_CAP);
    if has_content_image(article) {
        score += IMAGE_BONUS;
    }
    score
}

/// The single highest-scoring item. Ties go to the earlier item in
/// sequence order (stable).
pub fn select_breaking(items: &[Article], now: DateTime<Utc>) -> Option<&Article> {
    let mut best: Option<(&Article, f64)> = None;
    for article in items {
        let score = breaking_score(article, now);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((article, score)),
        }
    }
    best.map(|(a, _)| a)
}

/// First `n` items after title-dedup, in existing order.
pub fn select_top_stories(items: &[Article], n: usize) -> Vec<Article> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|a| normalized_title(a).is_some_and(|key| seen.insert(key)))
        .take(n)
        .cloned()
        .collect()
}

/// First `n` title-deduped items with no usable image (absent or logoish).
pub fn select_latest_text_only(items: &[Article], n: usize) -> Vec<Article> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|a| !has_content_image(a))
        .filter(|a| normalized_title(a).is_some_and(|key| seen.insert(key)))
        .take(n)
        .cloned()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
