//! Win/loss handlers for Web API.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};

use crate::competitor::CompetitorRepository;
use crate::datetime::MAX_WINDOW_DAYS;
use crate::win_loss::{
    NewWinLossRecord, Outcome, WinLossFilter, WinLossRecord, WinLossRepository, WinLossStats,
    DEFAULT_WINDOW_DAYS,
};
use crate::web::dto::{
    bounded_window, parse_param, ApiResponse, CreateWinLossRequest, ValidatedJson, WinLossQuery,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_outcome_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::bad_request(format!("Invalid outcome_date: {value}")))
}

fn window_days(query: &WinLossQuery) -> Result<i64, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS).max(1);
    bounded_window(days, "days", MAX_WINDOW_DAYS)
}

/// GET /api/win-loss - List records in the window.
pub async fn list_win_loss(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WinLossQuery>,
) -> Result<Json<ApiResponse<Vec<WinLossRecord>>>, ApiError> {
    let filter = WinLossFilter {
        competitor_id: query.competitor_id,
        outcome: parse_param::<Outcome>(query.outcome.as_deref(), "outcome")?,
        days: window_days(&query)?,
    };
    let records = WinLossRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(ApiResponse::new(records)))
}

/// GET /api/win-loss/stats - Aggregates over the window.
pub async fn win_loss_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WinLossQuery>,
) -> Result<Json<ApiResponse<WinLossStats>>, ApiError> {
    let days = window_days(&query)?;
    let stats = WinLossRepository::new(state.pool())
        .stats(query.competitor_id, days)
        .await?;
    Ok(Json(ApiResponse::new(stats)))
}

/// POST /api/win-loss - Record a deal outcome.
pub async fn create_win_loss(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateWinLossRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WinLossRecord>>), ApiError> {
    CompetitorRepository::new(state.pool())
        .get_by_id(req.competitor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Competitor not found"))?;

    let outcome_date = req
        .outcome_date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(parse_outcome_date)
        .transpose()?;

    let record = NewWinLossRecord {
        outcome_date,
        deal_name: req.deal_name,
        deal_value: req.deal_value,
        deal_currency: req.deal_currency.map(|c| c.to_uppercase()),
        customer_name: req.customer_name,
        customer_industry: req.customer_industry,
        customer_size: req.customer_size,
        customer_region: req.customer_region,
        primary_loss_reason: req.primary_loss_reason,
        loss_reasons: req.loss_reasons,
        win_reasons: req.win_reasons,
        decision_makers: req.decision_makers,
        competitor_positioning: req.competitor_positioning,
        key_learnings: req.key_learnings,
        sales_rep: req.sales_rep,
        ..NewWinLossRecord::new(req.competitor_id, req.outcome)
    };
    let record = WinLossRepository::new(state.pool()).create(&record).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(record))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_outcome_date() {
        assert_eq!(
            parse_outcome_date("2026-02-14").unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_outcome_date("2026-02-14T10:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 14, 8, 0, 0).unwrap()
        );
        assert!(parse_outcome_date("14/02/2026").is_err());
    }
}
