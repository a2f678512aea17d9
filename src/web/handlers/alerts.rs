//! Alert handlers for Web API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use crate::alert::{
    Alert, AlertFilter, AlertRepository, AlertStatus, AlertUpdate, NewAlert, RiskLevel,
    SignalType, SourceType,
};
use crate::competitor::CompetitorRepository;
use crate::datetime::MAX_WINDOW_DAYS;
use crate::web::dto::{
    bounded_window, pagination, parse_param, AlertListQuery, ApiResponse, CreateAlertRequest, OptionalJson,
    PaginatedResponse, ResolveAlertRequest, UpdateAlertRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Default look-back window for the alert list.
const DEFAULT_ALERT_DAYS: i64 = 30;

fn alert_filter(query: &AlertListQuery) -> Result<AlertFilter, ApiError> {
    let status = parse_param::<AlertStatus>(query.status.as_deref(), "status")?;
    let signal_type = parse_param::<SignalType>(query.signal_type.as_deref(), "signal_type")?;

    // `risk_level` is an exact match, `risk` a minimum.
    let risk_levels = match (
        parse_param::<RiskLevel>(query.risk_level.as_deref(), "risk_level")?,
        parse_param::<RiskLevel>(query.risk.as_deref(), "risk")?,
    ) {
        (Some(level), _) => vec![level],
        (None, Some(min)) => min.at_least(),
        (None, None) => Vec::new(),
    };

    let days = bounded_window(query.days.unwrap_or(DEFAULT_ALERT_DAYS), "days", MAX_WINDOW_DAYS)?;
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(AlertFilter {
        status,
        risk_levels,
        competitor_id: query.competitor_id,
        signal_type,
        days: (days > 0).then_some(days),
        search,
    })
}

async fn load_alert(state: &AppState, id: i64) -> Result<Alert, ApiError> {
    AlertRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alert not found"))
}

/// GET /api/alerts - List alerts with filters.
pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlertListQuery>,
) -> Result<Json<PaginatedResponse<Alert>>, ApiError> {
    let filter = alert_filter(&query)?;
    let page = pagination(query.page, query.per_page);
    let (offset, limit) = page.to_offset_limit();

    let repo = AlertRepository::new(state.pool());
    let total = repo.count(&filter).await?;
    let alerts = repo.list(&filter, offset, limit).await?;

    Ok(Json(PaginatedResponse::new(
        alerts,
        page.page,
        page.per_page,
        total as u64,
    )))
}

/// GET /api/alerts/:id - Get a single alert.
pub async fn get_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    Ok(Json(ApiResponse::new(load_alert(&state, id).await?)))
}

/// PATCH /api/alerts/:id - Update triage fields.
pub async fn update_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAlertRequest>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    load_alert(&state, id).await?;

    let update = AlertUpdate {
        status: req.status,
        assigned_to: req.assigned_to.map(Some),
        resolution_notes: req.resolution_notes.map(Some),
    };
    if !update.is_empty() {
        AlertRepository::new(state.pool()).update(id, &update).await?;
    }

    Ok(Json(ApiResponse::new(load_alert(&state, id).await?)))
}

/// POST /api/alerts/:id/acknowledge - Acknowledge a new alert.
pub async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    load_alert(&state, id).await?;
    AlertRepository::new(state.pool()).acknowledge(id).await?;
    Ok(Json(ApiResponse::new(load_alert(&state, id).await?)))
}

/// POST /api/alerts/:id/resolve - Resolve an alert with optional notes.
pub async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    OptionalJson(req): OptionalJson<ResolveAlertRequest>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    load_alert(&state, id).await?;
    AlertRepository::new(state.pool())
        .resolve(id, req.notes.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(ApiResponse::new(load_alert(&state, id).await?)))
}

/// POST /api/alerts - Raise an alert by hand.
pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateAlertRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Alert>>), ApiError> {
    CompetitorRepository::new(state.pool())
        .get_by_id(req.competitor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Competitor not found"))?;

    let new_alert = NewAlert {
        competitor_id: req.competitor_id,
        source_type: SourceType::Manual,
        source_url: req.source_url,
        title: req.title.trim().to_string(),
        summary: req.summary,
        signal_type: req.signal_type.unwrap_or_default(),
        risk_level: req.risk_level.unwrap_or_default(),
        risk_score: req.risk_score,
        confidence_score: req.confidence_score,
        relevance_explanation: req.relevance_explanation,
        ..Default::default()
    };
    let alert = AlertRepository::new(state.pool()).create(&new_alert).await?;
    info!("Manual alert created: {}", alert.title);

    let notifier = &state.services.notifier;
    if req.notify && notifier.is_configured() {
        if let Err(e) = notifier.send_alert(&alert, None).await {
            warn!("Notification failed for alert {}: {}", alert.id, e);
        }
    }

    let alert = load_alert(&state, alert.id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(alert))))
}
