//! Competitor and monitored URL handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::alert::AlertRepository;
use crate::competitor::{
    CompetitorRepository, CompetitorSummary, CompetitorUpdate, MonitoredUrl,
    MonitoredUrlRepository, MonitoredUrlUpdate, NewCompetitor, NewMonitoredUrl,
};
use crate::fetch::validate_url;
use crate::web::dto::{
    ApiResponse, CompetitorDetailResponse, CreateCompetitorRequest, CreateUrlRequest,
    UpdateCompetitorRequest, UpdateUrlRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

const DETAIL_RECENT_ALERTS: i64 = 10;

/// Apply the outbound URL policy unless private hosts are allowed.
fn check_monitored_url(state: &AppState, url: &str) -> Result<(), ApiError> {
    if state.services.config.monitor.allow_private_hosts {
        return Ok(());
    }
    validate_url(url).map_err(ApiError::from)
}

async fn load_summary(state: &AppState, id: i64) -> Result<CompetitorSummary, ApiError> {
    CompetitorRepository::new(state.pool())
        .get_summary(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Competitor not found"))
}

/// GET /api/competitors - List active competitors with counters.
pub async fn list_competitors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CompetitorSummary>>>, ApiError> {
    let competitors = CompetitorRepository::new(state.pool())
        .list_with_counts(false)
        .await?;
    Ok(Json(ApiResponse::new(competitors)))
}

/// POST /api/competitors - Create a competitor.
pub async fn create_competitor(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateCompetitorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CompetitorSummary>>), ApiError> {
    let repo = CompetitorRepository::new(state.pool());
    let name = req.name.trim();

    if repo.get_by_name(name).await?.is_some() {
        return Err(ApiError::conflict("Competitor already exists"));
    }

    let mut new = NewCompetitor::new(name);
    new.description = req.description;
    new.website = req.website;
    new.logo_url = req.logo_url;

    let competitor = repo.create(&new).await?;
    info!("Competitor created: {}", competitor.name);

    let summary = load_summary(&state, competitor.id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(summary))))
}

/// GET /api/competitors/:id - Competitor with its URLs and recent alerts.
pub async fn get_competitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CompetitorDetailResponse>>, ApiError> {
    let competitor = load_summary(&state, id).await?;
    let monitored_urls = MonitoredUrlRepository::new(state.pool())
        .list_by_competitor(id)
        .await?;
    let recent_alerts = AlertRepository::new(state.pool())
        .recent_for_competitor(id, DETAIL_RECENT_ALERTS)
        .await?;

    Ok(Json(ApiResponse::new(CompetitorDetailResponse {
        competitor,
        monitored_urls,
        recent_alerts,
    })))
}

/// PATCH /api/competitors/:id - Update a competitor.
pub async fn update_competitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateCompetitorRequest>,
) -> Result<Json<ApiResponse<CompetitorSummary>>, ApiError> {
    let repo = CompetitorRepository::new(state.pool());
    let current = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Competitor not found"))?;

    let mut update = CompetitorUpdate::new();
    if let Some(name) = req.name.as_deref().map(str::trim) {
        if name.is_empty() {
            return Err(ApiError::unprocessable("Name must not be empty"));
        }
        if name != current.name {
            if let Some(other) = repo.get_by_name(name).await? {
                if other.id != id {
                    return Err(ApiError::conflict("Competitor already exists"));
                }
            }
        }
        update = update.with_name(name);
    }
    if let Some(description) = req.description {
        update = update.with_description(Some(description));
    }
    if let Some(website) = req.website {
        update = update.with_website(Some(website));
    }
    if let Some(logo_url) = req.logo_url {
        update.logo_url = Some(Some(logo_url));
    }
    if let Some(is_active) = req.is_active {
        update = update.with_active(is_active);
    }

    repo.update(id, &update).await?;
    Ok(Json(ApiResponse::new(load_summary(&state, id).await?)))
}

/// DELETE /api/competitors/:id - Deactivate a competitor.
pub async fn delete_competitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = CompetitorRepository::new(state.pool());
    repo.get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Competitor not found"))?;

    repo.deactivate(id).await?;
    info!("Competitor {} deactivated", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/competitors/:id/urls - URLs monitored for a competitor.
pub async fn list_competitor_urls(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<MonitoredUrl>>>, ApiError> {
    load_summary(&state, id).await?;
    let urls = MonitoredUrlRepository::new(state.pool())
        .list_by_competitor(id)
        .await?;
    Ok(Json(ApiResponse::new(urls)))
}

/// POST /api/competitors/:id/urls - Start monitoring a URL.
pub async fn create_competitor_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateUrlRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MonitoredUrl>>), ApiError> {
    load_summary(&state, id).await?;
    check_monitored_url(&state, &req.url)?;

    let mut new = NewMonitoredUrl::new(id, req.url.trim());
    if let Some(name) = req.name {
        new = new.with_name(name);
    }
    if let Some(page_type) = req.page_type {
        new = new.with_page_type(page_type);
    }
    if let Some(hours) = req.check_interval_hours {
        new = new.with_check_interval_hours(hours);
    }

    let url = MonitoredUrlRepository::new(state.pool()).create(&new).await?;
    info!("Monitoring {} for competitor {}", url.url, id);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(url))))
}

/// PATCH /api/urls/:id - Update a monitored URL.
pub async fn update_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateUrlRequest>,
) -> Result<Json<ApiResponse<MonitoredUrl>>, ApiError> {
    let repo = MonitoredUrlRepository::new(state.pool());
    repo.get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("URL not found"))?;

    if let Some(url) = req.url.as_deref() {
        check_monitored_url(&state, url)?;
    }

    let update = MonitoredUrlUpdate {
        url: req.url,
        name: req.name.map(Some),
        page_type: req.page_type,
        check_interval_hours: req.check_interval_hours,
        is_active: req.is_active,
    };
    repo.update(id, &update).await?;

    let url = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("URL not found"))?;
    Ok(Json(ApiResponse::new(url)))
}

/// DELETE /api/urls/:id - Stop monitoring a URL and drop its snapshots.
pub async fn delete_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !MonitoredUrlRepository::new(state.pool()).delete(id).await? {
        return Err(ApiError::not_found("URL not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
