//! Dashboard statistics and report handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};

use crate::alert::{AlertFilter, AlertRepository, RiskLevel};
use crate::competitor::{CompetitorRepository, MonitoredUrlRepository};
use crate::datetime::{saturating_before, MAX_WINDOW_DAYS};
use crate::web::dto::{
    bounded_window, ApiResponse, CompetitorStat, DaysQuery, ReportPeriod, ReportSummaryResponse, StatsResponse,
    StatsSummary,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

const RECENT_ALERTS: i64 = 5;
const DEFAULT_REPORT_DAYS: i64 = 7;

/// GET /api/stats - Dashboard statistics.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let alerts = AlertRepository::new(state.pool());
    let competitors = CompetitorRepository::new(state.pool());

    let counts = alerts.counts().await?;
    let active = competitors.list_with_counts(false).await?;
    let urls_monitored = MonitoredUrlRepository::new(state.pool())
        .count_active()
        .await?;

    let risk_distribution = alerts
        .risk_distribution()
        .await?
        .into_iter()
        .map(|(level, n)| (level.as_str().to_string(), n))
        .collect();
    let signal_distribution = alerts
        .signal_distribution()
        .await?
        .into_iter()
        .map(|(signal, n)| (signal.as_str().to_string(), n))
        .collect();

    let competitor_stats = active
        .iter()
        .map(|s| CompetitorStat {
            id: s.competitor.id,
            name: s.competitor.name.clone(),
            new_alerts: s.alert_count,
            urls_monitored: s.url_count,
        })
        .collect();

    let response = StatsResponse {
        summary: StatsSummary {
            alerts: counts,
            competitors_monitored: active.len() as i64,
            urls_monitored,
        },
        risk_distribution,
        signal_distribution,
        competitor_stats,
        recent_alerts: alerts.recent(RECENT_ALERTS).await?,
    };

    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/reports/summary - Alerts in the period grouped three ways.
pub async fn report_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<ApiResponse<ReportSummaryResponse>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_REPORT_DAYS);
    if days < 1 {
        return Err(ApiError::bad_request("days must be at least 1"));
    }
    let days = bounded_window(days, "days", MAX_WINDOW_DAYS)?;

    let repo = AlertRepository::new(state.pool());
    let filter = AlertFilter {
        days: Some(days),
        ..Default::default()
    };
    let total = repo.count(&filter).await?;
    let alerts = repo.list(&filter, 0, total.max(1)).await?;

    let mut by_competitor: BTreeMap<String, Vec<_>> = BTreeMap::new();
    let mut by_risk_level: BTreeMap<String, Vec<_>> = RiskLevel::ALL
        .iter()
        .map(|level| (level.as_str().to_string(), Vec::new()))
        .collect();
    let mut by_signal_type: BTreeMap<String, Vec<_>> = BTreeMap::new();

    for alert in &alerts {
        let competitor = alert
            .competitor_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        by_competitor.entry(competitor).or_default().push(alert.clone());
        by_risk_level
            .entry(alert.risk_level.as_str().to_string())
            .or_default()
            .push(alert.clone());
        by_signal_type
            .entry(alert.signal_type.as_str().to_string())
            .or_default()
            .push(alert.clone());
    }

    let end = Utc::now();
    let start = saturating_before(end, Duration::try_days(days));

    Ok(Json(ApiResponse::new(ReportSummaryResponse {
        period: ReportPeriod {
            days,
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        },
        total_alerts: alerts.len(),
        by_competitor,
        by_risk_level,
        by_signal_type,
    })))
}
