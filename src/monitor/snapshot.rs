//! Page snapshot types and repository.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::competitor::PageType;
use crate::datetime::{hours_ago, parse_db_datetime};
use crate::db::{DbPool, SQL_TRUE};
use crate::{Result, RivalError};

/// A captured state of a monitored page.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub id: i64,
    pub monitored_url_id: i64,
    pub content_hash: String,
    /// Raw HTML (truncated).
    #[serde(skip_serializing)]
    pub content: Option<String>,
    /// Extracted page text (truncated).
    pub extracted_text: Option<String>,
    /// Whether the page differed from the previous capture.
    pub has_changes: bool,
    pub diff_summary: Option<String>,
    pub diff_content: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// New snapshot for creation.
#[derive(Debug, Clone, Default)]
pub struct NewSnapshot {
    pub monitored_url_id: i64,
    pub content_hash: String,
    pub content: Option<String>,
    pub extracted_text: Option<String>,
    pub has_changes: bool,
    pub diff_summary: Option<String>,
    pub diff_content: Option<String>,
}

/// A detected change joined with its page and competitor.
#[derive(Debug, Clone, Serialize)]
pub struct PageChange {
    pub snapshot_id: i64,
    pub url_id: i64,
    pub url: String,
    pub url_name: Option<String>,
    pub page_type: PageType,
    pub competitor_id: i64,
    pub competitor_name: String,
    pub diff_summary: Option<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SnapshotRow {
    id: i64,
    monitored_url_id: i64,
    content_hash: String,
    content: Option<String>,
    extracted_text: Option<String>,
    has_changes: bool,
    diff_summary: Option<String>,
    diff_content: Option<String>,
    captured_at: String,
}

impl From<SnapshotRow> for PageSnapshot {
    fn from(row: SnapshotRow) -> Self {
        PageSnapshot {
            id: row.id,
            monitored_url_id: row.monitored_url_id,
            content_hash: row.content_hash,
            content: row.content,
            extracted_text: row.extracted_text,
            has_changes: row.has_changes,
            diff_summary: row.diff_summary,
            diff_content: row.diff_content,
            captured_at: parse_db_datetime(&row.captured_at).unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PageChangeRow {
    snapshot_id: i64,
    url_id: i64,
    url: String,
    url_name: Option<String>,
    page_type: String,
    competitor_id: i64,
    competitor_name: String,
    diff_summary: Option<String>,
    captured_at: String,
}

impl From<PageChangeRow> for PageChange {
    fn from(row: PageChangeRow) -> Self {
        PageChange {
            snapshot_id: row.snapshot_id,
            url_id: row.url_id,
            url: row.url,
            url_name: row.url_name,
            page_type: row.page_type.parse().unwrap_or_default(),
            competitor_id: row.competitor_id,
            competitor_name: row.competitor_name,
            diff_summary: row.diff_summary,
            captured_at: parse_db_datetime(&row.captured_at).unwrap_or_else(Utc::now),
        }
    }
}

const SNAPSHOT_COLUMNS: &str = "s.id, s.monitored_url_id, s.content_hash, s.content, \
     s.extracted_text, s.has_changes, s.diff_summary, s.diff_content, s.captured_at";

/// Repository for page snapshots.
pub struct SnapshotRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SnapshotRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a snapshot.
    pub async fn create(&self, snapshot: &NewSnapshot) -> Result<PageSnapshot> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO page_snapshots
                (monitored_url_id, content_hash, content, extracted_text,
                 has_changes, diff_summary, diff_content)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(snapshot.monitored_url_id)
        .bind(&snapshot.content_hash)
        .bind(&snapshot.content)
        .bind(&snapshot.extracted_text)
        .bind(snapshot.has_changes)
        .bind(&snapshot.diff_summary)
        .bind(&snapshot.diff_content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Snapshot".into()))
    }

    /// Get a snapshot by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<PageSnapshot>> {
        let query = format!("SELECT {SNAPSHOT_COLUMNS} FROM page_snapshots s WHERE s.id = $1");
        let row = sqlx::query_as::<_, SnapshotRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(PageSnapshot::from))
    }

    /// List snapshots of a URL, newest first.
    pub async fn list_by_url(&self, url_id: i64, limit: i64) -> Result<Vec<PageSnapshot>> {
        let query = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM page_snapshots s \
             WHERE s.monitored_url_id = $1 ORDER BY s.captured_at DESC, s.id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, SnapshotRow>(&query)
            .bind(url_id)
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(PageSnapshot::from).collect())
    }

    /// List changed snapshots that have no page-change alert yet, oldest first.
    pub async fn list_unanalyzed_changes(&self) -> Result<Vec<PageSnapshot>> {
        let query = format!(
            r#"
            SELECT {SNAPSHOT_COLUMNS}
            FROM page_snapshots s
            LEFT JOIN alerts a ON a.source_type = 'page_change' AND a.source_id = s.id
            WHERE s.has_changes = {SQL_TRUE} AND a.id IS NULL
            ORDER BY s.captured_at ASC, s.id ASC
            "#
        );
        let rows = sqlx::query_as::<_, SnapshotRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(PageSnapshot::from).collect())
    }

    /// Changes captured in the last `hours`, newest first.
    pub async fn recent_changes(&self, hours: i64, limit: i64) -> Result<Vec<PageChange>> {
        let query = format!(
            r#"
            SELECT s.id AS snapshot_id, u.id AS url_id, u.url, u.name AS url_name, u.page_type,
                   c.id AS competitor_id, c.name AS competitor_name,
                   s.diff_summary, s.captured_at
            FROM page_snapshots s
            JOIN monitored_urls u ON u.id = s.monitored_url_id
            JOIN competitors c ON c.id = u.competitor_id
            WHERE s.has_changes = {SQL_TRUE} AND s.captured_at >= $1
            ORDER BY s.captured_at DESC, s.id DESC
            LIMIT $2
            "#
        );
        let rows = sqlx::query_as::<_, PageChangeRow>(&query)
            .bind(hours_ago(hours))
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(PageChange::from).collect())
    }
}
