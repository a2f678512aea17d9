//! News item types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum stored title length.
pub const MAX_TITLE_LENGTH: usize = 500;
/// Maximum stored description length.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
/// Maximum stored content length.
pub const MAX_CONTENT_LENGTH: usize = 10_000;
/// Maximum stored URL length.
pub const MAX_URL_LENGTH: usize = 1000;
/// Maximum stored source and author length.
pub const MAX_SOURCE_LENGTH: usize = 255;

/// A collected news article.
#[derive(Debug, Clone, Serialize)]
pub struct NewsItem {
    pub id: i64,
    pub competitor_id: Option<i64>,
    /// Competitor name (joined).
    pub competitor_name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: String,
    pub source: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
    /// Whether the analyzer has looked at this item.
    pub is_processed: bool,
    /// Whether the analyzer judged this item relevant.
    pub is_relevant: bool,
}

/// New news item for insertion.
#[derive(Debug, Clone, Default)]
pub struct NewNewsItem {
    pub competitor_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: String,
    pub source: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// An article as returned by a news source, before filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: String,
    pub source: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Filter for listing news items.
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    pub competitor_id: Option<i64>,
    /// Only items collected within this many days.
    pub days: Option<i64>,
    pub relevant_only: bool,
}

/// Outcome of collecting news for one competitor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionReport {
    pub competitor_id: i64,
    pub competitor_name: String,
    /// Articles returned by all sources.
    pub fetched: usize,
    /// Articles skipped as duplicates.
    pub duplicates_skipped: usize,
    /// Articles dropped by the finance, age or mention filters.
    pub filtered: usize,
    /// Newly stored items.
    pub new_items: Vec<NewsItem>,
}
