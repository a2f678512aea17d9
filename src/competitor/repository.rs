//! Competitor and monitored URL repositories.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::types::{
    Competitor, CompetitorSummary, CompetitorUpdate, MonitoredUrl, MonitoredUrlUpdate,
    NewCompetitor, NewMonitoredUrl, PageType,
};
use crate::datetime::parse_db_datetime;
use crate::db::{DbPool, SQL_NOW, SQL_TRUE};
use crate::{Result, RivalError};

const COMPETITOR_COLUMNS: &str =
    "c.id, c.name, c.description, c.website, c.logo_url, c.is_active, c.created_at, c.updated_at";

const URL_COLUMNS: &str = "u.id, u.competitor_id, u.url, u.name, u.page_type, \
     u.check_interval_hours, u.last_checked_at, u.last_content_hash, u.last_content, \
     u.is_active, u.last_error, u.consecutive_errors, u.created_at, u.updated_at";

/// Row type for competitor from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CompetitorRow {
    id: i64,
    name: String,
    description: Option<String>,
    website: Option<String>,
    logo_url: Option<String>,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl From<CompetitorRow> for Competitor {
    fn from(row: CompetitorRow) -> Self {
        Competitor {
            id: row.id,
            name: row.name,
            description: row.description,
            website: row.website,
            logo_url: row.logo_url,
            is_active: row.is_active,
            created_at: parse_db_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for competitor with counters.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CompetitorSummaryRow {
    #[sqlx(flatten)]
    competitor: CompetitorRow,
    url_count: i64,
    alert_count: i64,
}

impl From<CompetitorSummaryRow> for CompetitorSummary {
    fn from(row: CompetitorSummaryRow) -> Self {
        CompetitorSummary {
            competitor: row.competitor.into(),
            url_count: row.url_count,
            alert_count: row.alert_count,
        }
    }
}

/// Row type for monitored URL from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct MonitoredUrlRow {
    id: i64,
    competitor_id: i64,
    url: String,
    name: Option<String>,
    page_type: String,
    check_interval_hours: i64,
    last_checked_at: Option<String>,
    last_content_hash: Option<String>,
    last_content: Option<String>,
    is_active: bool,
    last_error: Option<String>,
    consecutive_errors: i64,
    created_at: String,
    updated_at: String,
}

impl From<MonitoredUrlRow> for MonitoredUrl {
    fn from(row: MonitoredUrlRow) -> Self {
        MonitoredUrl {
            id: row.id,
            competitor_id: row.competitor_id,
            url: row.url,
            name: row.name,
            page_type: row.page_type.parse().unwrap_or(PageType::Other),
            check_interval_hours: row.check_interval_hours,
            last_checked_at: row.last_checked_at.and_then(|s| parse_db_datetime(&s)),
            last_content_hash: row.last_content_hash,
            last_content: row.last_content,
            is_active: row.is_active,
            last_error: row.last_error,
            consecutive_errors: row.consecutive_errors,
            created_at: parse_db_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for competitor operations.
pub struct CompetitorRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> CompetitorRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new competitor.
    pub async fn create(&self, competitor: &NewCompetitor) -> Result<Competitor> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO competitors (name, description, website, logo_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&competitor.name)
        .bind(&competitor.description)
        .bind(&competitor.website)
        .bind(&competitor.logo_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Competitor".into()))
    }

    /// Get a competitor by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Competitor>> {
        let query = format!("SELECT {COMPETITOR_COLUMNS} FROM competitors c WHERE c.id = $1");
        let row = sqlx::query_as::<_, CompetitorRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(Competitor::from))
    }

    /// Get a competitor by name (case-insensitive).
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Competitor>> {
        let query = format!(
            "SELECT {COMPETITOR_COLUMNS} FROM competitors c WHERE c.name = $1 COLLATE NOCASE"
        );
        let row = sqlx::query_as::<_, CompetitorRow>(&query)
            .bind(name)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(Competitor::from))
    }

    /// List active competitors ordered by name.
    pub async fn list_active(&self) -> Result<Vec<Competitor>> {
        let query = format!(
            "SELECT {COMPETITOR_COLUMNS} FROM competitors c WHERE c.is_active = {SQL_TRUE} ORDER BY c.name ASC"
        );
        let rows = sqlx::query_as::<_, CompetitorRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Competitor::from).collect())
    }

    /// List competitors with URL and open alert counters.
    pub async fn list_with_counts(&self, include_inactive: bool) -> Result<Vec<CompetitorSummary>> {
        let filter = if include_inactive {
            String::new()
        } else {
            format!("WHERE c.is_active = {SQL_TRUE}")
        };
        let query = format!(
            r#"
            SELECT {COMPETITOR_COLUMNS},
                   (SELECT COUNT(*) FROM monitored_urls u
                    WHERE u.competitor_id = c.id AND u.is_active = {SQL_TRUE}) AS url_count,
                   (SELECT COUNT(*) FROM alerts a
                    WHERE a.competitor_id = c.id AND a.status = 'new') AS alert_count
            FROM competitors c
            {filter}
            ORDER BY c.name ASC
            "#
        );
        let rows = sqlx::query_as::<_, CompetitorSummaryRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(CompetitorSummary::from).collect())
    }

    /// Get a single competitor with counters.
    pub async fn get_summary(&self, id: i64) -> Result<Option<CompetitorSummary>> {
        let query = format!(
            r#"
            SELECT {COMPETITOR_COLUMNS},
                   (SELECT COUNT(*) FROM monitored_urls u
                    WHERE u.competitor_id = c.id AND u.is_active = {SQL_TRUE}) AS url_count,
                   (SELECT COUNT(*) FROM alerts a
                    WHERE a.competitor_id = c.id AND a.status = 'new') AS alert_count
            FROM competitors c
            WHERE c.id = $1
            "#
        );
        let row = sqlx::query_as::<_, CompetitorSummaryRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(CompetitorSummary::from))
    }

    /// Update a competitor.
    pub async fn update(&self, id: i64, update: &CompetitorUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE competitors SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.clone());
        }
        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }
        if let Some(ref website) = update.website {
            separated.push("website = ");
            separated.push_bind_unseparated(website.clone());
        }
        if let Some(ref logo_url) = update.logo_url {
            separated.push("logo_url = ");
            separated.push_bind_unseparated(logo_url.clone());
        }
        if let Some(is_active) = update.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }
        separated.push(format!("updated_at = {SQL_NOW}"));

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a competitor by clearing its active flag.
    pub async fn deactivate(&self, id: i64) -> Result<bool> {
        self.update(id, &CompetitorUpdate::new().with_active(false))
            .await
    }

    /// Count active competitors.
    pub async fn count_active(&self) -> Result<i64> {
        let query = format!("SELECT COUNT(*) FROM competitors WHERE is_active = {SQL_TRUE}");
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(count)
    }
}

/// Repository for monitored URL operations.
pub struct MonitoredUrlRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> MonitoredUrlRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Add a URL to monitor.
    pub async fn create(&self, url: &NewMonitoredUrl) -> Result<MonitoredUrl> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO monitored_urls (competitor_id, url, name, page_type, check_interval_hours)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(url.competitor_id)
        .bind(&url.url)
        .bind(&url.name)
        .bind(url.page_type.as_str())
        .bind(url.check_interval_hours)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Monitored URL".into()))
    }

    /// Get a URL by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<MonitoredUrl>> {
        let query = format!("SELECT {URL_COLUMNS} FROM monitored_urls u WHERE u.id = $1");
        let row = sqlx::query_as::<_, MonitoredUrlRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(MonitoredUrl::from))
    }

    /// List URLs of a competitor (including inactive).
    pub async fn list_by_competitor(&self, competitor_id: i64) -> Result<Vec<MonitoredUrl>> {
        let query = format!(
            "SELECT {URL_COLUMNS} FROM monitored_urls u WHERE u.competitor_id = $1 ORDER BY u.id ASC"
        );
        let rows = sqlx::query_as::<_, MonitoredUrlRow>(&query)
            .bind(competitor_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(MonitoredUrl::from).collect())
    }

    /// List active URLs belonging to active competitors.
    pub async fn list_active(&self) -> Result<Vec<MonitoredUrl>> {
        let query = format!(
            r#"
            SELECT {URL_COLUMNS}
            FROM monitored_urls u
            JOIN competitors c ON c.id = u.competitor_id
            WHERE u.is_active = {SQL_TRUE} AND c.is_active = {SQL_TRUE}
            ORDER BY u.last_checked_at ASC NULLS FIRST, u.id ASC
            "#
        );
        let rows = sqlx::query_as::<_, MonitoredUrlRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(MonitoredUrl::from).collect())
    }

    /// Update a URL.
    pub async fn update(&self, id: i64, update: &MonitoredUrlUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE monitored_urls SET ");
        let mut separated = query.separated(", ");

        if let Some(ref url) = update.url {
            separated.push("url = ");
            separated.push_bind_unseparated(url.clone());
        }
        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.clone());
        }
        if let Some(page_type) = update.page_type {
            separated.push("page_type = ");
            separated.push_bind_unseparated(page_type.as_str());
        }
        if let Some(hours) = update.check_interval_hours {
            separated.push("check_interval_hours = ");
            separated.push_bind_unseparated(hours);
        }
        if let Some(is_active) = update.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }
        separated.push(format!("updated_at = {SQL_NOW}"));

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a successful check that produced new content.
    pub async fn record_content(&self, id: i64, hash: &str, content: &str) -> Result<bool> {
        let query = format!(
            r#"
            UPDATE monitored_urls
            SET last_content_hash = $1,
                last_content = $2,
                last_checked_at = {SQL_NOW},
                last_error = NULL,
                consecutive_errors = 0,
                updated_at = {SQL_NOW}
            WHERE id = $3
            "#
        );
        let result = sqlx::query(&query)
            .bind(hash)
            .bind(content)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a successful check without content changes.
    pub async fn record_unchanged(&self, id: i64) -> Result<bool> {
        let query = format!(
            r#"
            UPDATE monitored_urls
            SET last_checked_at = {SQL_NOW},
                last_error = NULL,
                consecutive_errors = 0,
                updated_at = {SQL_NOW}
            WHERE id = $1
            "#
        );
        let result = sqlx::query(&query)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a failed check.
    pub async fn record_error(&self, id: i64, error: &str) -> Result<bool> {
        let query = format!(
            r#"
            UPDATE monitored_urls
            SET consecutive_errors = consecutive_errors + 1,
                last_error = $1,
                last_checked_at = {SQL_NOW},
                updated_at = {SQL_NOW}
            WHERE id = $2
            "#
        );
        let result = sqlx::query(&query)
            .bind(error)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a URL and its snapshots.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM monitored_urls WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count active URLs of active competitors.
    pub async fn count_active(&self) -> Result<i64> {
        let query = format!(
            r#"
            SELECT COUNT(*) FROM monitored_urls u
            JOIN competitors c ON c.id = u.competitor_id
            WHERE u.is_active = {SQL_TRUE} AND c.is_active = {SQL_TRUE}
            "#
        );
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    async fn create_competitor(db: &Database, name: &str) -> Competitor {
        CompetitorRepository::new(db.pool())
            .create(&NewCompetitor::new(name).with_website("https://example.com"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_competitor() {
        let db = setup_db().await;
        let repo = CompetitorRepository::new(db.pool());

        let competitor = repo
            .create(
                &NewCompetitor::new("Keysight Technologies")
                    .with_description("Test and measurement")
                    .with_website("https://keysight.com"),
            )
            .await
            .unwrap();

        assert!(competitor.id > 0);
        assert_eq!(competitor.name, "Keysight Technologies");
        assert_eq!(competitor.description.as_deref(), Some("Test and measurement"));
        assert!(competitor.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = setup_db().await;
        create_competitor(&db, "Klein Tools").await;

        let result = CompetitorRepository::new(db.pool())
            .create(&NewCompetitor::new("Klein Tools"))
            .await;
        assert!(matches!(result, Err(RivalError::Database(_))));
    }

    #[tokio::test]
    async fn test_get_by_name_case_insensitive() {
        let db = setup_db().await;
        let created = create_competitor(&db, "Megger").await;

        let found = CompetitorRepository::new(db.pool())
            .get_by_name("megger")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let db = setup_db().await;
        let created = create_competitor(&db, "Extech").await;
        let repo = CompetitorRepository::new(db.pool());

        let updated = repo
            .update(
                created.id,
                &CompetitorUpdate::new().with_description(Some("Handheld meters".into())),
            )
            .await
            .unwrap();
        assert!(updated);
        assert!(!repo.update(created.id, &CompetitorUpdate::new()).await.unwrap());

        assert!(repo.deactivate(created.id).await.unwrap());
        let competitor = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert!(!competitor.is_active);
        assert_eq!(competitor.description.as_deref(), Some("Handheld meters"));
        assert!(repo.list_active().await.unwrap().is_empty());
        assert_eq!(repo.count_active().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_with_counts() {
        let db = setup_db().await;
        let a = create_competitor(&db, "Alpha").await;
        create_competitor(&db, "Beta").await;

        let urls = MonitoredUrlRepository::new(db.pool());
        urls.create(&NewMonitoredUrl::new(a.id, "https://alpha.example.com"))
            .await
            .unwrap();
        let inactive = urls
            .create(&NewMonitoredUrl::new(a.id, "https://alpha.example.com/old"))
            .await
            .unwrap();
        urls.update(inactive.id, &MonitoredUrlUpdate::new().disable())
            .await
            .unwrap();

        let list = CompetitorRepository::new(db.pool())
            .list_with_counts(false)
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].competitor.name, "Alpha");
        assert_eq!(list[0].url_count, 1);
        assert_eq!(list[0].alert_count, 0);
        assert_eq!(list[1].url_count, 0);
    }

    #[tokio::test]
    async fn test_monitored_url_lifecycle() {
        let db = setup_db().await;
        let competitor = create_competitor(&db, "Fluke Rival").await;
        let repo = MonitoredUrlRepository::new(db.pool());

        let url = repo
            .create(
                &NewMonitoredUrl::new(competitor.id, "https://rival.example.com/pricing")
                    .with_name("Pricing")
                    .with_page_type(PageType::Pricing)
                    .with_check_interval_hours(12),
            )
            .await
            .unwrap();
        assert_eq!(url.page_type, PageType::Pricing);
        assert_eq!(url.check_interval_hours, 12);
        assert!(url.last_checked_at.is_none());

        repo.record_error(url.id, "timeout").await.unwrap();
        repo.record_error(url.id, "timeout again").await.unwrap();
        let failed = repo.get_by_id(url.id).await.unwrap().unwrap();
        assert_eq!(failed.consecutive_errors, 2);
        assert_eq!(failed.last_error.as_deref(), Some("timeout again"));
        assert!(failed.last_checked_at.is_some());

        repo.record_content(url.id, "abc", "hello").await.unwrap();
        let ok = repo.get_by_id(url.id).await.unwrap().unwrap();
        assert_eq!(ok.consecutive_errors, 0);
        assert!(ok.last_error.is_none());
        assert_eq!(ok.last_content_hash.as_deref(), Some("abc"));
        assert_eq!(ok.last_content.as_deref(), Some("hello"));

        assert_eq!(repo.list_by_competitor(competitor.id).await.unwrap().len(), 1);
        assert!(repo.delete(url.id).await.unwrap());
        assert!(repo.get_by_id(url.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive_competitors() {
        let db = setup_db().await;
        let competitor = create_competitor(&db, "Dormant").await;
        let repo = MonitoredUrlRepository::new(db.pool());
        repo.create(&NewMonitoredUrl::new(competitor.id, "https://dormant.example.com"))
            .await
            .unwrap();
        assert_eq!(repo.list_active().await.unwrap().len(), 1);

        CompetitorRepository::new(db.pool())
            .deactivate(competitor.id)
            .await
            .unwrap();
        assert!(repo.list_active().await.unwrap().is_empty());
        assert_eq!(repo.count_active().await.unwrap(), 0);
    }
}
