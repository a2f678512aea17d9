//! CSV and PDF download handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::Response,
};
use chrono::Utc;

use crate::alert::{Alert, AlertFilter, AlertRepository, RiskLevel};
use crate::competitor::CompetitorRepository;
use crate::datetime::MAX_WINDOW_DAYS;
use crate::export::{self, CSV_CONTENT_TYPE, PDF_CONTENT_TYPE};
use crate::feature::FeatureRepository;
use crate::insight::InsightRepository;
use crate::news::{NewsFilter, NewsRepository};
use crate::web::dto::{bounded_window, parse_param, AlertExportQuery, DaysQuery};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

const DEFAULT_PDF_DAYS: i64 = 7;
const DEFAULT_CSV_DAYS: i64 = 30;

/// Build an attachment response.
fn attachment(content_type: &str, filename: &str, content: Vec<u8>) -> Result<Response, ApiError> {
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

async fn export_alerts(
    state: &AppState,
    query: &AlertExportQuery,
    default_days: i64,
) -> Result<(i64, Vec<Alert>), ApiError> {
    let days = query.days.unwrap_or(default_days);
    if days < 1 {
        return Err(ApiError::bad_request("days must be at least 1"));
    }
    let days = bounded_window(days, "days", MAX_WINDOW_DAYS)?;
    let risk_levels = parse_param::<RiskLevel>(query.risk_level.as_deref(), "risk_level")?
        .into_iter()
        .collect();
    let filter = AlertFilter {
        risk_levels,
        competitor_id: query.competitor_id,
        days: Some(days),
        ..Default::default()
    };

    let repo = AlertRepository::new(state.pool());
    let total = repo.count(&filter).await?;
    let alerts = repo.list(&filter, 0, total.max(1)).await?;
    Ok((days, alerts))
}

/// GET /api/export/alerts/pdf - Alerts summary table.
pub async fn export_alerts_pdf(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlertExportQuery>,
) -> Result<Response, ApiError> {
    let (days, alerts) = export_alerts(&state, &query, DEFAULT_PDF_DAYS).await?;
    let pdf = export::alerts_summary(&alerts, days, state.timezone())?;
    attachment(
        PDF_CONTENT_TYPE,
        &export::alerts_summary_filename(&Utc::now()),
        pdf,
    )
}

/// GET /api/export/alerts/csv - Alerts as CSV.
pub async fn export_alerts_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlertExportQuery>,
) -> Result<Response, ApiError> {
    let (_, alerts) = export_alerts(&state, &query, DEFAULT_CSV_DAYS).await?;
    let csv = export::alerts_csv(&alerts, state.timezone())?;
    attachment(CSV_CONTENT_TYPE, &export::alerts_csv_filename(&Utc::now()), csv)
}

/// GET /api/export/features/csv - The feature matrix against active competitors.
pub async fn export_features_csv(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let features = FeatureRepository::new(state.pool()).list_by_name().await?;
    let competitors = CompetitorRepository::new(state.pool()).list_active().await?;
    let csv = export::features_csv(&features, &competitors)?;
    attachment(
        CSV_CONTENT_TYPE,
        &export::features_csv_filename(&Utc::now()),
        csv,
    )
}

/// GET /api/export/news/csv - Collected news as CSV.
pub async fn export_news_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Result<Response, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_CSV_DAYS);
    if days < 1 {
        return Err(ApiError::bad_request("days must be at least 1"));
    }
    let days = bounded_window(days, "days", MAX_WINDOW_DAYS)?;
    let filter = NewsFilter {
        days: Some(days),
        ..Default::default()
    };

    let repo = NewsRepository::new(state.pool());
    let total = repo.count(&filter).await?;
    let items = repo.list(&filter, 0, total.max(1)).await?;

    let csv = export::news_csv(&items, state.timezone())?;
    attachment(CSV_CONTENT_TYPE, &export::news_csv_filename(&Utc::now()), csv)
}

/// GET /api/export/alert/:id/pdf - Single alert report.
pub async fn export_alert_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let alert = AlertRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alert not found"))?;

    let pdf = export::alert_report(&alert, state.timezone())?;
    attachment(
        PDF_CONTENT_TYPE,
        &export::alert_report_filename(id, &Utc::now()),
        pdf,
    )
}

/// GET /api/export/insight/:id/pdf - Single insight report.
pub async fn export_insight_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let insight = InsightRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Insight not found"))?;

    let pdf = export::insight_report(&insight, state.timezone())?;
    attachment(
        PDF_CONTENT_TYPE,
        &export::insight_report_filename(id, &Utc::now()),
        pdf,
    )
}
