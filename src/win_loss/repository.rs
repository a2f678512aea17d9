//! Win/loss repository.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::types::{NewWinLossRecord, Outcome, WinLossFilter, WinLossRecord, WinLossStats};
use crate::datetime::{days_ago, parse_db_datetime, to_db_string};
use crate::db::json::{string_list, to_json_text};
use crate::db::DbPool;
use crate::{Result, RivalError};

const RECORD_COLUMNS: &str = "w.id, w.competitor_id, c.name AS competitor_name, w.deal_name, \
     w.deal_value, w.deal_currency, w.outcome, w.outcome_date, w.customer_name, \
     w.customer_industry, w.customer_size, w.customer_region, w.primary_loss_reason, \
     w.loss_reasons, w.win_reasons, w.decision_makers, w.competitor_positioning, \
     w.key_learnings, w.sales_rep, w.created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
struct WinLossRow {
    id: i64,
    competitor_id: i64,
    competitor_name: Option<String>,
    deal_name: Option<String>,
    deal_value: Option<f64>,
    deal_currency: String,
    outcome: String,
    outcome_date: String,
    customer_name: Option<String>,
    customer_industry: Option<String>,
    customer_size: Option<String>,
    customer_region: Option<String>,
    primary_loss_reason: Option<String>,
    loss_reasons: String,
    win_reasons: String,
    decision_makers: String,
    competitor_positioning: Option<String>,
    key_learnings: Option<String>,
    sales_rep: Option<String>,
    created_at: String,
}

impl From<WinLossRow> for WinLossRecord {
    fn from(row: WinLossRow) -> Self {
        WinLossRecord {
            id: row.id,
            competitor_id: row.competitor_id,
            competitor_name: row.competitor_name,
            deal_name: row.deal_name,
            deal_value: row.deal_value,
            deal_currency: row.deal_currency,
            outcome: row.outcome.parse().unwrap_or(Outcome::NoDecision),
            outcome_date: parse_db_datetime(&row.outcome_date).unwrap_or_else(Utc::now),
            customer_name: row.customer_name,
            customer_industry: row.customer_industry,
            customer_size: row.customer_size,
            customer_region: row.customer_region,
            primary_loss_reason: row.primary_loss_reason,
            loss_reasons: string_list(&row.loss_reasons),
            win_reasons: string_list(&row.win_reasons),
            decision_makers: string_list(&row.decision_makers),
            competitor_positioning: row.competitor_positioning,
            key_learnings: row.key_learnings,
            sales_rep: row.sales_rep,
            created_at: parse_db_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for win/loss records.
pub struct WinLossRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> WinLossRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Record a deal outcome.
    pub async fn create(&self, record: &NewWinLossRecord) -> Result<WinLossRecord> {
        let outcome_date = to_db_string(&record.outcome_date.unwrap_or_else(Utc::now));
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO win_loss_records (
                competitor_id, deal_name, deal_value, deal_currency, outcome, outcome_date,
                customer_name, customer_industry, customer_size, customer_region,
                primary_loss_reason, loss_reasons, win_reasons, decision_makers,
                competitor_positioning, key_learnings, sales_rep
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id
            "#,
        )
        .bind(record.competitor_id)
        .bind(&record.deal_name)
        .bind(record.deal_value)
        .bind(record.deal_currency.as_deref().unwrap_or("USD"))
        .bind(record.outcome.as_str())
        .bind(outcome_date)
        .bind(&record.customer_name)
        .bind(&record.customer_industry)
        .bind(&record.customer_size)
        .bind(&record.customer_region)
        .bind(&record.primary_loss_reason)
        .bind(to_json_text(&record.loss_reasons)?)
        .bind(to_json_text(&record.win_reasons)?)
        .bind(to_json_text(&record.decision_makers)?)
        .bind(&record.competitor_positioning)
        .bind(&record.key_learnings)
        .bind(&record.sales_rep)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Win/loss record".into()))
    }

    /// Get a record by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<WinLossRecord>> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM win_loss_records w \
             LEFT JOIN competitors c ON c.id = w.competitor_id WHERE w.id = $1"
        );
        let row = sqlx::query_as::<_, WinLossRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(WinLossRecord::from))
    }

    /// List records by outcome date, newest first.
    pub async fn list(&self, filter: &WinLossFilter) -> Result<Vec<WinLossRecord>> {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(format!(
            "SELECT {RECORD_COLUMNS} FROM win_loss_records w \
             LEFT JOIN competitors c ON c.id = w.competitor_id WHERE w.outcome_date >= "
        ));
        query.push_bind(days_ago(filter.days));
        if let Some(competitor_id) = filter.competitor_id {
            query.push(" AND w.competitor_id = ");
            query.push_bind(competitor_id);
        }
        if let Some(outcome) = filter.outcome {
            query.push(" AND w.outcome = ");
            query.push_bind(outcome.as_str());
        }
        query.push(" ORDER BY w.outcome_date DESC, w.id DESC");

        let rows = query
            .build_query_as::<WinLossRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(WinLossRecord::from).collect())
    }

    /// Aggregate records in the window, ignoring the outcome filter.
    pub async fn stats(&self, competitor_id: Option<i64>, days: i64) -> Result<WinLossStats> {
        let records = self
            .list(&WinLossFilter {
                competitor_id,
                outcome: None,
                days,
            })
            .await?;
        Ok(WinLossStats::from_records(&records))
    }
}
