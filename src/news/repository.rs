//! News item repository.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::types::{NewNewsItem, NewsFilter, NewsItem};
use crate::datetime::{days_ago, parse_db_datetime, to_db_string};
use crate::db::{DbPool, SQL_FALSE, SQL_TRUE};
use crate::{Result, RivalError};

const NEWS_COLUMNS: &str = "n.id, n.competitor_id, c.name AS competitor_name, n.title, \
     n.description, n.content, n.url, n.source, n.author, n.published_at, n.collected_at, \
     n.is_processed, n.is_relevant";

#[derive(Debug, Clone, sqlx::FromRow)]
struct NewsRow {
    id: i64,
    competitor_id: Option<i64>,
    competitor_name: Option<String>,
    title: String,
    description: Option<String>,
    content: Option<String>,
    url: String,
    source: Option<String>,
    author: Option<String>,
    published_at: Option<String>,
    collected_at: String,
    is_processed: bool,
    is_relevant: bool,
}

impl From<NewsRow> for NewsItem {
    fn from(row: NewsRow) -> Self {
        NewsItem {
            id: row.id,
            competitor_id: row.competitor_id,
            competitor_name: row.competitor_name,
            title: row.title,
            description: row.description,
            content: row.content,
            url: row.url,
            source: row.source,
            author: row.author,
            published_at: row.published_at.and_then(|s| parse_db_datetime(&s)),
            collected_at: parse_db_datetime(&row.collected_at).unwrap_or_else(Utc::now),
            is_processed: row.is_processed,
            is_relevant: row.is_relevant,
        }
    }
}

/// Repository for news items.
pub struct NewsRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> NewsRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a news item.
    pub async fn create(&self, item: &NewNewsItem) -> Result<NewsItem> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO news_items
                (competitor_id, title, description, content, url, source, author, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(item.competitor_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.content)
        .bind(&item.url)
        .bind(&item.source)
        .bind(&item.author)
        .bind(item.published_at.as_ref().map(to_db_string))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("News item".into()))
    }

    /// Get a news item by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<NewsItem>> {
        let query = format!(
            "SELECT {NEWS_COLUMNS} FROM news_items n \
             LEFT JOIN competitors c ON c.id = n.competitor_id WHERE n.id = $1"
        );
        let row = sqlx::query_as::<_, NewsRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(NewsItem::from))
    }

    /// Check whether an item with this URL exists.
    pub async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM news_items WHERE url = $1)")
                .bind(url)
                .fetch_one(self.pool)
                .await
                .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(exists)
    }

    /// Titles of items collected in the last `days`.
    pub async fn recent_titles(&self, days: i64) -> Result<Vec<String>> {
        let titles: Vec<String> =
            sqlx::query_scalar("SELECT title FROM news_items WHERE collected_at >= $1")
                .bind(days_ago(days))
                .fetch_all(self.pool)
                .await
                .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(titles)
    }

    fn push_filter(query: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &NewsFilter) {
        query.push(" WHERE 1 = 1");
        if let Some(competitor_id) = filter.competitor_id {
            query.push(" AND n.competitor_id = ");
            query.push_bind(competitor_id);
        }
        if let Some(days) = filter.days {
            query.push(" AND n.collected_at >= ");
            query.push_bind(days_ago(days));
        }
        if filter.relevant_only {
            query.push(format!(" AND n.is_relevant = {SQL_TRUE}"));
        }
    }

    /// List items matching a filter, newest publication first.
    pub async fn list(&self, filter: &NewsFilter, offset: i64, limit: i64) -> Result<Vec<NewsItem>> {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(format!(
            "SELECT {NEWS_COLUMNS} FROM news_items n LEFT JOIN competitors c ON c.id = n.competitor_id"
        ));
        Self::push_filter(&mut query, filter);
        query.push(" ORDER BY COALESCE(n.published_at, n.collected_at) DESC, n.id DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query
            .build_query_as::<NewsRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(NewsItem::from).collect())
    }

    /// Count items matching a filter.
    pub async fn count(&self, filter: &NewsFilter) -> Result<i64> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM news_items n");
        Self::push_filter(&mut query, filter);

        let count: i64 = query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Items not yet seen by the analyzer, oldest first.
    pub async fn list_unprocessed(&self, limit: i64) -> Result<Vec<NewsItem>> {
        let query = format!(
            "SELECT {NEWS_COLUMNS} FROM news_items n \
             LEFT JOIN competitors c ON c.id = n.competitor_id \
             WHERE n.is_processed = {SQL_FALSE} ORDER BY n.collected_at ASC, n.id ASC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, NewsRow>(&query)
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(NewsItem::from).collect())
    }

    /// Relevant items with no insight yet, newest first.
    pub async fn list_relevant_without_insight(&self, limit: i64) -> Result<Vec<NewsItem>> {
        let query = format!(
            r#"
            SELECT {NEWS_COLUMNS}
            FROM news_items n
            LEFT JOIN competitors c ON c.id = n.competitor_id
            LEFT JOIN insights i ON i.news_item_id = n.id
            WHERE n.is_relevant = {SQL_TRUE} AND i.id IS NULL
            ORDER BY n.collected_at DESC, n.id DESC
            LIMIT $1
            "#
        );
        let rows = sqlx::query_as::<_, NewsRow>(&query)
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(NewsItem::from).collect())
    }

    /// Record the analyzer's verdict.
    pub async fn mark_processed(&self, id: i64, is_relevant: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE news_items SET is_processed = 1, is_relevant = $1 WHERE id = $2")
                .bind(is_relevant)
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
