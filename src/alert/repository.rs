//! Alert repository.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::types::{
    Alert, AlertCounts, AlertFilter, AlertStatus, AlertUpdate, NewAlert, RecommendedAction,
    RiskLevel, SignalType, SourceType,
};
use crate::datetime::{days_ago, hours_ago, parse_db_datetime};
use crate::db::{contains_pattern, DbPool, SQL_FALSE, SQL_NOW, SQL_TRUE};
use crate::{Result, RivalError};

const ALERT_COLUMNS: &str = "a.id, a.competitor_id, c.name AS competitor_name, a.source_type, \
     a.source_id, a.source_url, a.title, a.summary, a.raw_content, a.diff_content, \
     a.signal_type, a.risk_level, a.risk_score, a.confidence_score, a.analysis, \
     a.relevance_explanation, a.assumptions, a.recommended_actions, a.playbook_used, \
     a.status, a.assigned_to, a.resolution_notes, a.detected_at, a.acknowledged_at, \
     a.resolved_at, a.notification_sent, a.notification_channels";

const ALERT_FROM: &str = "FROM alerts a LEFT JOIN competitors c ON c.id = a.competitor_id";

/// Row type for alert from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct AlertRow {
    id: i64,
    competitor_id: i64,
    competitor_name: Option<String>,
    source_type: String,
    source_id: Option<i64>,
    source_url: Option<String>,
    title: String,
    summary: Option<String>,
    raw_content: Option<String>,
    diff_content: Option<String>,
    signal_type: String,
    risk_level: String,
    risk_score: Option<i64>,
    confidence_score: Option<i64>,
    analysis: Option<String>,
    relevance_explanation: Option<String>,
    assumptions: Option<String>,
    recommended_actions: String,
    playbook_used: Option<String>,
    status: String,
    assigned_to: Option<String>,
    resolution_notes: Option<String>,
    detected_at: String,
    acknowledged_at: Option<String>,
    resolved_at: Option<String>,
    notification_sent: bool,
    notification_channels: Option<String>,
}

impl From<AlertRow> for Alert {
    fn from(row: AlertRow) -> Self {
        Alert {
            id: row.id,
            competitor_id: row.competitor_id,
            competitor_name: row.competitor_name,
            source_type: row.source_type.parse().unwrap_or(SourceType::Manual),
            source_id: row.source_id,
            source_url: row.source_url,
            title: row.title,
            summary: row.summary,
            raw_content: row.raw_content,
            diff_content: row.diff_content,
            signal_type: row.signal_type.parse().unwrap_or_default(),
            risk_level: row.risk_level.parse().unwrap_or_default(),
            risk_score: row.risk_score,
            confidence_score: row.confidence_score,
            analysis: row.analysis.and_then(|a| serde_json::from_str(&a).ok()),
            relevance_explanation: row.relevance_explanation,
            assumptions: row.assumptions,
            recommended_actions: serde_json::from_str::<Vec<RecommendedAction>>(
                &row.recommended_actions,
            )
            .unwrap_or_default(),
            playbook_used: row.playbook_used,
            status: row.status.parse().unwrap_or_default(),
            assigned_to: row.assigned_to,
            resolution_notes: row.resolution_notes,
            detected_at: parse_db_datetime(&row.detected_at).unwrap_or_else(Utc::now),
            acknowledged_at: row.acknowledged_at.and_then(|s| parse_db_datetime(&s)),
            resolved_at: row.resolved_at.and_then(|s| parse_db_datetime(&s)),
            notification_sent: row.notification_sent,
            notification_channels: row.notification_channels,
        }
    }
}

/// Column an alert histogram is grouped by.
#[derive(Debug, Clone, Copy)]
pub enum AlertGrouping {
    Competitor,
    RiskLevel,
    SignalType,
}

impl AlertGrouping {
    fn expr(&self) -> &'static str {
        match self {
            AlertGrouping::Competitor => "COALESCE(c.name, 'Unknown')",
            AlertGrouping::RiskLevel => "a.risk_level",
            AlertGrouping::SignalType => "a.signal_type",
        }
    }
}

/// Append ` (?, ?, ...)` binding each value.
fn push_in_list(
    query: &mut QueryBuilder<'_, sqlx::Sqlite>,
    values: impl IntoIterator<Item = &'static str>,
) {
    query.push(" (");
    let mut separated = query.separated(", ");
    for value in values {
        separated.push_bind(value);
    }
    separated.push_unseparated(")");
}

/// Repository for alerts.
pub struct AlertRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> AlertRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new alert.
    pub async fn create(&self, alert: &NewAlert) -> Result<Alert> {
        let actions = serde_json::to_string(&alert.recommended_actions)
            .map_err(|e| RivalError::Validation(e.to_string()))?;
        let analysis = alert.analysis.as_ref().map(|a| a.to_string());

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO alerts (
                competitor_id, source_type, source_id, source_url, title, summary,
                raw_content, diff_content, signal_type, risk_level, risk_score,
                confidence_score, analysis, relevance_explanation, assumptions,
                recommended_actions, playbook_used
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id
            "#,
        )
        .bind(alert.competitor_id)
        .bind(alert.source_type.as_str())
        .bind(alert.source_id)
        .bind(&alert.source_url)
        .bind(&alert.title)
        .bind(&alert.summary)
        .bind(&alert.raw_content)
        .bind(&alert.diff_content)
        .bind(alert.signal_type.as_str())
        .bind(alert.risk_level.as_str())
        .bind(alert.risk_score)
        .bind(alert.confidence_score)
        .bind(analysis)
        .bind(&alert.relevance_explanation)
        .bind(&alert.assumptions)
        .bind(actions)
        .bind(&alert.playbook_used)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Alert".into()))
    }

    /// Get an alert by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Alert>> {
        let query = format!("SELECT {ALERT_COLUMNS} {ALERT_FROM} WHERE a.id = $1");
        let row = sqlx::query_as::<_, AlertRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(Alert::from))
    }

    fn push_filter(query: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &AlertFilter) {
        query.push(" WHERE 1 = 1");
        if let Some(status) = filter.status {
            query.push(" AND a.status = ");
            query.push_bind(status.as_str());
        }
        if !filter.risk_levels.is_empty() {
            query.push(" AND a.risk_level IN");
            push_in_list(query, filter.risk_levels.iter().map(|l| l.as_str()));
        }
        if let Some(competitor_id) = filter.competitor_id {
            query.push(" AND a.competitor_id = ");
            query.push_bind(competitor_id);
        }
        if let Some(signal_type) = filter.signal_type {
            query.push(" AND a.signal_type = ");
            query.push_bind(signal_type.as_str());
        }
        if let Some(days) = filter.days {
            query.push(" AND a.detected_at >= ");
            query.push_bind(days_ago(days));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let pattern = contains_pattern(search);
                query.push(" AND (LOWER(a.title) LIKE ");
                query.push_bind(pattern.clone());
                query.push(" ESCAPE '\\' OR LOWER(COALESCE(a.summary, '')) LIKE ");
                query.push_bind(pattern);
                query.push(" ESCAPE '\\')");
            }
        }
    }

    /// List alerts matching a filter, newest first.
    pub async fn list(&self, filter: &AlertFilter, offset: i64, limit: i64) -> Result<Vec<Alert>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {ALERT_COLUMNS} {ALERT_FROM}"));
        Self::push_filter(&mut query, filter);
        query.push(" ORDER BY a.detected_at DESC, a.id DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query
            .build_query_as::<AlertRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Alert::from).collect())
    }

    /// Count alerts matching a filter.
    pub async fn count(&self, filter: &AlertFilter) -> Result<i64> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT COUNT(*) {ALERT_FROM}"));
        Self::push_filter(&mut query, filter);

        let count: i64 = query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Most recently detected alerts.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Alert>> {
        self.list(&AlertFilter::default(), 0, limit).await
    }

    /// Most recent alerts for one competitor.
    pub async fn recent_for_competitor(&self, competitor_id: i64, limit: i64) -> Result<Vec<Alert>> {
        let filter = AlertFilter {
            competitor_id: Some(competitor_id),
            ..Default::default()
        };
        self.list(&filter, 0, limit).await
    }

    /// Update triage fields.
    ///
    /// Moving from `new` to `acknowledged` stamps `acknowledged_at`; moving to
    /// `resolved` stamps `resolved_at`.
    pub async fn update(&self, id: i64, update: &AlertUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE alerts SET ");
        let mut separated = query.separated(", ");

        if let Some(status) = update.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
            match status {
                AlertStatus::Acknowledged => {
                    separated.push(format!(
                        "acknowledged_at = CASE WHEN status = 'new' THEN {SQL_NOW} ELSE acknowledged_at END"
                    ));
                }
                AlertStatus::Resolved => {
                    separated.push(format!("resolved_at = {SQL_NOW}"));
                }
                _ => {}
            }
        }
        if let Some(ref assigned_to) = update.assigned_to {
            separated.push("assigned_to = ");
            separated.push_bind_unseparated(assigned_to.clone());
        }
        if let Some(ref notes) = update.resolution_notes {
            separated.push("resolution_notes = ");
            separated.push_bind_unseparated(notes.clone());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Acknowledge an alert that is still `new`. Other statuses are left as is.
    pub async fn acknowledge(&self, id: i64) -> Result<bool> {
        let query = format!(
            "UPDATE alerts SET status = 'acknowledged', acknowledged_at = {SQL_NOW} \
             WHERE id = $1 AND status = 'new'"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Resolve an alert with optional notes.
    pub async fn resolve(&self, id: i64, notes: &str) -> Result<bool> {
        self.update(
            id,
            &AlertUpdate {
                status: Some(AlertStatus::Resolved),
                resolution_notes: Some(Some(notes.to_string())),
                ..Default::default()
            },
        )
        .await
    }

    /// Whether an alert for this source URL was detected in the last `hours`.
    pub async fn exists_recent_for_url(&self, source_url: &str, hours: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM alerts WHERE source_url = $1 AND detected_at >= $2)",
        )
        .bind(source_url)
        .bind(hours_ago(hours))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(exists)
    }

    /// Alerts not yet notified at or above `min_risk`, oldest first.
    pub async fn list_pending_notifications(&self, min_risk: RiskLevel) -> Result<Vec<Alert>> {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(format!(
            "SELECT {ALERT_COLUMNS} {ALERT_FROM} WHERE a.notification_sent = {SQL_FALSE} \
             AND a.risk_level IN"
        ));
        push_in_list(&mut query, min_risk.at_least().into_iter().map(|l| l.as_str()));
        query.push(" ORDER BY a.detected_at ASC, a.id ASC");

        let rows = query
            .build_query_as::<AlertRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Alert::from).collect())
    }

    /// Record successful delivery to `channels`.
    pub async fn mark_notified(&self, id: i64, channels: &[String]) -> Result<bool> {
        let query = format!(
            "UPDATE alerts SET notification_sent = {SQL_TRUE}, notification_channels = $1 WHERE id = $2"
        );
        let result = sqlx::query(&query)
            .bind(channels.join(","))
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// High and critical alerts that have no insight yet, newest first.
    pub async fn list_significant_without_insight(&self, limit: i64) -> Result<Vec<Alert>> {
        let query = format!(
            r#"
            SELECT {ALERT_COLUMNS}
            {ALERT_FROM}
            LEFT JOIN insights i ON i.alert_id = a.id
            WHERE a.risk_level IN ('critical', 'high') AND i.id IS NULL
            ORDER BY a.detected_at DESC, a.id DESC
            LIMIT $1
            "#
        );
        let rows = sqlx::query_as::<_, AlertRow>(&query)
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Alert::from).collect())
    }

    /// Headline counters for the dashboard.
    pub async fn counts(&self) -> Result<AlertCounts> {
        let (new_alerts_24h, total_alerts, unresolved_alerts): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'new' AND detected_at >= $1 THEN 1 ELSE 0 END), 0),
                COUNT(*),
                COALESCE(SUM(CASE WHEN status IN ('new', 'acknowledged', 'in_progress')
                    THEN 1 ELSE 0 END), 0)
            FROM alerts
            "#,
        )
        .bind(hours_ago(24))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(AlertCounts {
            new_alerts_24h,
            total_alerts,
            unresolved_alerts,
        })
    }

    /// Alert counts grouped by a column, optionally limited to the last `days`.
    pub async fn grouped_counts(
        &self,
        grouping: AlertGrouping,
        days: Option<i64>,
    ) -> Result<Vec<(String, i64)>> {
        let expr = grouping.expr();
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {expr} AS label, COUNT(*) AS n {ALERT_FROM}"));
        if let Some(days) = days {
            query.push(" WHERE a.detected_at >= ");
            query.push_bind(days_ago(days));
        }
        query.push(format!(" GROUP BY {expr} ORDER BY n DESC, label ASC"));

        let rows: Vec<(String, i64)> = query
            .build_query_as()
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// Count per risk level, every level present.
    pub async fn risk_distribution(&self) -> Result<Vec<(RiskLevel, i64)>> {
        let counts = self.grouped_counts(AlertGrouping::RiskLevel, None).await?;
        Ok(RiskLevel::ALL
            .into_iter()
            .map(|level| {
                let n = counts
                    .iter()
                    .find(|(label, _)| label == level.as_str())
                    .map_or(0, |(_, n)| *n);
                (level, n)
            })
            .collect())
    }

    /// Count per signal type, only types that occur.
    pub async fn signal_distribution(&self) -> Result<Vec<(SignalType, i64)>> {
        let counts = self.grouped_counts(AlertGrouping::SignalType, None).await?;
        Ok(SignalType::ALL
            .into_iter()
            .filter_map(|signal| {
                counts
                    .iter()
                    .find(|(label, n)| label == signal.as_str() && *n > 0)
                    .map(|(_, n)| (signal, *n))
            })
            .collect())
    }
}
