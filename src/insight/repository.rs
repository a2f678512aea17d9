//! Insight repository.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::types::{Insight, InsightSummary, NewInsight, HIGH_SCORE};
use crate::datetime::{days_ago, parse_db_datetime};
use crate::db::json::{json_object, string_list, to_json_text};
use crate::db::{DbPool, SQL_FALSE, SQL_NOW, SQL_TRUE};
use crate::{Result, RivalError};

/// High-impact insights listed in the dashboard summary.
const HIGH_IMPACT_LIMIT: i64 = 5;

const INSIGHT_COLUMNS: &str = "i.id, i.alert_id, i.news_item_id, i.competitor_id, \
     c.name AS competitor_name, i.title, i.executive_summary, i.competitor_product, \
     i.our_product, i.comparison_summary, i.competitor_advantages, i.our_advantages, \
     i.pricing_comparison, i.feature_comparison, i.sales_insights, i.marketing_insights, \
     i.product_insights, i.engineering_insights, i.executive_insights, i.immediate_actions, \
     i.short_term_actions, i.long_term_actions, i.impact_score, i.urgency_score, \
     i.confidence_score, i.is_reviewed, i.reviewed_by, i.reviewed_at, i.notes, \
     i.created_at, i.updated_at";

const INSIGHT_FROM: &str = "FROM insights i LEFT JOIN competitors c ON c.id = i.competitor_id";

#[derive(Debug, Clone, sqlx::FromRow)]
struct InsightRow {
    id: i64,
    alert_id: Option<i64>,
    news_item_id: Option<i64>,
    competitor_id: Option<i64>,
    competitor_name: Option<String>,
    title: String,
    executive_summary: Option<String>,
    competitor_product: Option<String>,
    our_product: Option<String>,
    comparison_summary: Option<String>,
    competitor_advantages: String,
    our_advantages: String,
    pricing_comparison: Option<String>,
    feature_comparison: String,
    sales_insights: String,
    marketing_insights: String,
    product_insights: String,
    engineering_insights: String,
    executive_insights: String,
    immediate_actions: String,
    short_term_actions: String,
    long_term_actions: String,
    impact_score: i64,
    urgency_score: i64,
    confidence_score: i64,
    is_reviewed: bool,
    reviewed_by: Option<String>,
    reviewed_at: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<InsightRow> for Insight {
    fn from(row: InsightRow) -> Self {
        Insight {
            id: row.id,
            alert_id: row.alert_id,
            news_item_id: row.news_item_id,
            competitor_id: row.competitor_id,
            competitor_name: row.competitor_name,
            title: row.title,
            executive_summary: row.executive_summary,
            competitor_product: row.competitor_product,
            our_product: row.our_product,
            comparison_summary: row.comparison_summary,
            competitor_advantages: string_list(&row.competitor_advantages),
            our_advantages: string_list(&row.our_advantages),
            pricing_comparison: row.pricing_comparison,
            feature_comparison: json_object(&row.feature_comparison),
            sales_insights: json_object(&row.sales_insights),
            marketing_insights: json_object(&row.marketing_insights),
            product_insights: json_object(&row.product_insights),
            engineering_insights: json_object(&row.engineering_insights),
            executive_insights: json_object(&row.executive_insights),
            immediate_actions: string_list(&row.immediate_actions),
            short_term_actions: string_list(&row.short_term_actions),
            long_term_actions: string_list(&row.long_term_actions),
            impact_score: row.impact_score,
            urgency_score: row.urgency_score,
            confidence_score: row.confidence_score,
            is_reviewed: row.is_reviewed,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at.and_then(|s| parse_db_datetime(&s)),
            notes: row.notes,
            created_at: parse_db_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Aggregate scores over a period.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct InsightStats {
    pub total: i64,
    pub unreviewed: i64,
    pub urgent: i64,
    pub average_impact: f64,
    pub average_urgency: f64,
    pub average_confidence: f64,
}

/// Repository for insights.
pub struct InsightRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> InsightRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a new insight.
    pub async fn create(&self, insight: &NewInsight) -> Result<Insight> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO insights (
                alert_id, news_item_id, competitor_id, title, executive_summary,
                competitor_product, our_product, comparison_summary, competitor_advantages,
                our_advantages, pricing_comparison, feature_comparison, sales_insights,
                marketing_insights, product_insights, engineering_insights, executive_insights,
                immediate_actions, short_term_actions, long_term_actions, impact_score,
                urgency_score, confidence_score
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23)
            RETURNING id
            "#,
        )
        .bind(insight.alert_id)
        .bind(insight.news_item_id)
        .bind(insight.competitor_id)
        .bind(&insight.title)
        .bind(&insight.executive_summary)
        .bind(&insight.competitor_product)
        .bind(&insight.our_product)
        .bind(&insight.comparison_summary)
        .bind(to_json_text(&insight.competitor_advantages)?)
        .bind(to_json_text(&insight.our_advantages)?)
        .bind(&insight.pricing_comparison)
        .bind(to_json_text(&insight.feature_comparison)?)
        .bind(to_json_text(&insight.sales_insights)?)
        .bind(to_json_text(&insight.marketing_insights)?)
        .bind(to_json_text(&insight.product_insights)?)
        .bind(to_json_text(&insight.engineering_insights)?)
        .bind(to_json_text(&insight.executive_insights)?)
        .bind(to_json_text(&insight.immediate_actions)?)
        .bind(to_json_text(&insight.short_term_actions)?)
        .bind(to_json_text(&insight.long_term_actions)?)
        .bind(insight.impact_score)
        .bind(insight.urgency_score)
        .bind(insight.confidence_score)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Insight".into()))
    }

    /// Get an insight by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Insight>> {
        self.find_one("i.id", id).await
    }

    /// Get the insight generated for an alert.
    pub async fn get_by_alert(&self, alert_id: i64) -> Result<Option<Insight>> {
        self.find_one("i.alert_id", alert_id).await
    }

    /// Get the insight generated for a news item.
    pub async fn get_by_news_item(&self, news_item_id: i64) -> Result<Option<Insight>> {
        self.find_one("i.news_item_id", news_item_id).await
    }

    async fn find_one(&self, column: &'static str, value: i64) -> Result<Option<Insight>> {
        let query = format!(
            "SELECT {INSIGHT_COLUMNS} {INSIGHT_FROM} WHERE {column} = $1 ORDER BY i.id LIMIT 1"
        );
        let row = sqlx::query_as::<_, InsightRow>(&query)
            .bind(value)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(Insight::from))
    }

    /// List insights, newest first.
    pub async fn list(
        &self,
        competitor_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Insight>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {INSIGHT_COLUMNS} {INSIGHT_FROM}"));
        if let Some(competitor_id) = competitor_id {
            query.push(" WHERE i.competitor_id = ");
            query.push_bind(competitor_id);
        }
        query.push(" ORDER BY i.created_at DESC, i.id DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query
            .build_query_as::<InsightRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Insight::from).collect())
    }

    /// Count insights.
    pub async fn count(&self, competitor_id: Option<i64>) -> Result<i64> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM insights i");
        if let Some(competitor_id) = competitor_id {
            query.push(" WHERE i.competitor_id = ");
            query.push_bind(competitor_id);
        }

        let count: i64 = query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Mark an insight as reviewed.
    pub async fn review(&self, id: i64, reviewed_by: &str, notes: Option<&str>) -> Result<bool> {
        let query = format!(
            "UPDATE insights SET is_reviewed = {SQL_TRUE}, reviewed_by = $1, \
             reviewed_at = {SQL_NOW}, notes = $2, updated_at = {SQL_NOW} WHERE id = $3"
        );
        let result = sqlx::query(&query)
            .bind(reviewed_by)
            .bind(notes)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts and average scores for insights created in the last `days`.
    pub async fn stats(&self, days: i64) -> Result<InsightStats> {
        let query = format!(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN is_reviewed = {SQL_FALSE} THEN 1 ELSE 0 END), 0) AS unreviewed,
                COALESCE(SUM(CASE WHEN urgency_score >= {HIGH_SCORE} THEN 1 ELSE 0 END), 0) AS urgent,
                COALESCE(AVG(impact_score), 0.0) AS average_impact,
                COALESCE(AVG(urgency_score), 0.0) AS average_urgency,
                COALESCE(AVG(confidence_score), 0.0) AS average_confidence
            FROM insights
            WHERE created_at >= $1
            "#
        );
        let stats = sqlx::query_as::<_, InsightStats>(&query)
            .bind(days_ago(days))
            .fetch_one(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(stats)
    }

    /// Most recent high-impact insights from the last `days`.
    pub async fn recent_high_impact(&self, days: i64, limit: i64) -> Result<Vec<Insight>> {
        let query = format!(
            "SELECT {INSIGHT_COLUMNS} {INSIGHT_FROM} \
             WHERE i.impact_score >= {HIGH_SCORE} AND i.created_at >= $1 \
             ORDER BY i.created_at DESC, i.id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, InsightRow>(&query)
            .bind(days_ago(days))
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Insight::from).collect())
    }

    /// Dashboard roll-up for the last `days`.
    pub async fn summary(&self, days: i64) -> Result<InsightSummary> {
        let stats = self.stats(days).await?;
        let high_impact_recent = self.recent_high_impact(days, HIGH_IMPACT_LIMIT).await?;

        Ok(InsightSummary {
            period_days: days,
            total: stats.total,
            unreviewed: stats.unreviewed,
            urgent: stats.urgent,
            average_impact: stats.average_impact,
            average_urgency: stats.average_urgency,
            average_confidence: stats.average_confidence,
            high_impact_recent,
        })
    }
}
