//! News collection across all sources.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::filter::{is_finance_news, is_similar_title, search_terms};
use super::repository::NewsRepository;
use super::sources::{fetch_feed, fetch_newsapi, google_news_url};
use super::types::{
    Article, CollectionReport, NewNewsItem, MAX_CONTENT_LENGTH, MAX_DESCRIPTION_LENGTH,
    MAX_SOURCE_LENGTH, MAX_TITLE_LENGTH, MAX_URL_LENGTH,
};
use crate::competitor::{Competitor, CompetitorRepository};
use crate::config::NewsConfig;
use crate::datetime::days_before_now;
use crate::fetch::{truncate_chars, truncate_opt, Fetcher};
use crate::{Database, Result};

/// Window for title-similarity duplicate checks.
const DEDUP_WINDOW_DAYS: i64 = 7;

/// Collects competitor news from feeds, Google News and NewsAPI.
pub struct NewsCollector {
    db: Arc<Database>,
    fetcher: Fetcher,
    config: NewsConfig,
}

impl NewsCollector {
    /// Create a new collector.
    pub fn new(db: Arc<Database>, fetcher: Fetcher, config: NewsConfig) -> Self {
        Self {
            db,
            fetcher,
            config,
        }
    }

    /// Gather raw articles for a competitor from every configured source.
    ///
    /// Source failures are logged and skipped.
    async fn gather(&self, terms: &[String], days_back: i64) -> Vec<Article> {
        let mut articles = Vec::new();

        for feed in &self.config.rss_feeds {
            match fetch_feed(&self.fetcher, &feed.url, &feed.name).await {
                Ok(found) => {
                    info!("Found {} articles from {}", found.len(), feed.name);
                    articles.extend(found);
                }
                Err(e) => error!("Error fetching RSS feed {}: {}", feed.url, e),
            }
        }

        if self.config.google_news_enabled {
            for term in terms {
                let url = google_news_url(&self.config.google_news_url, term);
                match fetch_feed(&self.fetcher, &url, "Google News").await {
                    Ok(found) => {
                        info!("Found {} articles from Google News for '{}'", found.len(), term);
                        articles.extend(found);
                    }
                    Err(e) => error!("Error fetching Google News for '{}': {}", term, e),
                }
            }
        }

        if let Some(api_key) = self.config.newsapi_key() {
            let from = days_before_now(days_back);
            for term in terms {
                match fetch_newsapi(&self.fetcher, &self.config.newsapi_url, api_key, term, from)
                    .await
                {
                    Ok(found) => {
                        info!("Found {} articles from NewsAPI for '{}'", found.len(), term);
                        articles.extend(found);
                    }
                    Err(e) => error!("Error fetching from NewsAPI for '{}': {}", term, e),
                }
            }
        }

        articles
    }

    /// Collect and store new articles about one competitor.
    pub async fn collect_competitor(
        &self,
        competitor: &Competitor,
        days_back: i64,
    ) -> Result<CollectionReport> {
        let terms = search_terms(&competitor.name);
        let articles = self.gather(&terms, days_back).await;
        let repo = NewsRepository::new(self.db.pool());
        let mut recent_titles = repo.recent_titles(DEDUP_WINDOW_DAYS).await?;

        let mut report = CollectionReport {
            competitor_id: competitor.id,
            competitor_name: competitor.name.clone(),
            fetched: articles.len(),
            ..Default::default()
        };

        for article in articles {
            let title = article.title.trim();
            let url = article.url.trim();
            if title.is_empty() || url.is_empty() {
                report.filtered += 1;
                continue;
            }

            if repo.exists_by_url(url).await?
                || is_similar_title(title, recent_titles.iter().map(String::as_str))
            {
                report.duplicates_skipped += 1;
                continue;
            }

            let description = article.description.as_deref();
            if is_finance_news(title, description) {
                debug!("Filtered finance news: {}", truncate_chars(title, 50));
                report.filtered += 1;
                continue;
            }

            let item = NewNewsItem {
                competitor_id: Some(competitor.id),
                title: truncate_chars(title, MAX_TITLE_LENGTH),
                description: truncate_opt(description, MAX_DESCRIPTION_LENGTH),
                content: truncate_opt(article.content.as_deref(), MAX_CONTENT_LENGTH),
                url: truncate_chars(url, MAX_URL_LENGTH),
                source: truncate_opt(article.source.as_deref(), MAX_SOURCE_LENGTH),
                author: truncate_opt(article.author.as_deref(), MAX_SOURCE_LENGTH),
                published_at: article.published_at,
            };

            match repo.create(&item).await {
                Ok(stored) => {
                    recent_titles.push(stored.title.clone());
                    report.new_items.push(stored);
                }
                Err(e) => {
                    // Truncated URLs can collide with an existing row
                    warn!("Could not store article {}: {}", item.url, e);
                    report.duplicates_skipped += 1;
                }
            }
        }

        info!(
            "Collected {} new articles for {} ({} fetched, {} duplicates, {} filtered)",
            report.new_items.len(),
            competitor.name,
            report.fetched,
            report.duplicates_skipped,
            report.filtered
        );
        Ok(report)
    }

    /// Collect news for every active competitor.
    ///
    /// A failing competitor is logged and reported with no new items.
    pub async fn collect_all(&self, days_back: i64) -> Result<Vec<CollectionReport>> {
        let competitors = CompetitorRepository::new(self.db.pool())
            .list_active()
            .await?;

        let mut reports = Vec::with_capacity(competitors.len());
        for competitor in &competitors {
            match self.collect_competitor(competitor, days_back).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Error collecting news for {}: {}", competitor.name, e);
                    reports.push(CollectionReport {
                        competitor_id: competitor.id,
                        competitor_name: competitor.name.clone(),
                        ..Default::default()
                    });
                }
            }
        }

        Ok(reports)
    }
}
