//! Insight handlers for Web API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::alert::AlertRepository;
use crate::competitor::CompetitorRepository;
use crate::datetime::MAX_WINDOW_DAYS;
use crate::insight::{Insight, InsightRepository, InsightSource, InsightSummary, Team};
use crate::news::NewsRepository;
use crate::web::dto::{
    bounded_window, pagination, parse_param, ApiResponse, BatchInsightResponse, DaysQuery,
    GenerateBatchRequest, GenerateInsightRequest, InsightListQuery, OptionalJson,
    PaginatedResponse, ReviewInsightRequest, TeamInsightResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

const DEFAULT_BATCH_LIMIT: i64 = 10;
const MAX_BATCH_LIMIT: i64 = 50;
const DEFAULT_SUMMARY_DAYS: i64 = 7;
const DEFAULT_REVIEWER: &str = "Anonymous";
const DEFAULT_SOURCE_TYPE: &str = "manual";
const UNKNOWN_COMPETITOR: &str = "Unknown";

fn parse_team(value: &str) -> Result<Team, ApiError> {
    value
        .parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid team: {e}")))
}

async fn load_insight(state: &AppState, id: i64) -> Result<Insight, ApiError> {
    InsightRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Insight not found"))
}

async fn list_page(
    state: &AppState,
    query: &InsightListQuery,
    team: Option<Team>,
) -> Result<PaginatedResponse<TeamInsightResponse>, ApiError> {
    let page = pagination(query.page, query.per_page);
    let (offset, limit) = page.to_offset_limit();

    let repo = InsightRepository::new(state.pool());
    let total = repo.count(query.competitor_id).await?;
    let insights = repo
        .list(query.competitor_id, offset, limit)
        .await?
        .into_iter()
        .map(|insight| TeamInsightResponse::new(insight, team))
        .collect();

    Ok(PaginatedResponse::new(
        insights,
        page.page,
        page.per_page,
        total as u64,
    ))
}

/// GET /api/insights - List insights, newest first.
pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InsightListQuery>,
) -> Result<Json<PaginatedResponse<TeamInsightResponse>>, ApiError> {
    let team = parse_param::<Team>(query.team.as_deref(), "team")?;
    Ok(Json(list_page(&state, &query, team).await?))
}

/// GET /api/insights/team/:team - List insights focused on one team.
pub async fn list_team_insights(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
    Query(query): Query<InsightListQuery>,
) -> Result<Json<PaginatedResponse<TeamInsightResponse>>, ApiError> {
    let team = parse_team(&team)?;
    Ok(Json(list_page(&state, &query, Some(team)).await?))
}

/// GET /api/insights/:id - Get a single insight.
pub async fn get_insight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Insight>>, ApiError> {
    Ok(Json(ApiResponse::new(load_insight(&state, id).await?)))
}

/// GET /api/insights/:id/team/:team - One insight focused on a team.
pub async fn get_insight_for_team(
    State(state): State<Arc<AppState>>,
    Path((id, team)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<TeamInsightResponse>>, ApiError> {
    let team = parse_team(&team)?;
    let insight = load_insight(&state, id).await?;
    Ok(Json(ApiResponse::new(TeamInsightResponse::new(
        insight,
        Some(team),
    ))))
}

/// POST /api/insights/generate - Generate an insight from a news item, an alert or raw content.
pub async fn generate_insight(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<GenerateInsightRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Insight>>), ApiError> {
    let generator = &state.services.insights;

    let insight = if let Some(news_item_id) = req.news_item_id {
        let item = NewsRepository::new(state.pool())
            .get_by_id(news_item_id)
            .await?
            .ok_or_else(|| ApiError::not_found("News item not found"))?;
        generator.generate_from_news(&item).await?
    } else if let Some(alert_id) = req.alert_id {
        let alert = AlertRepository::new(state.pool())
            .get_by_id(alert_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Alert not found"))?;
        generator.generate_from_alert(&alert).await?
    } else if let Some(content) = req.content.as_deref().filter(|c| !c.trim().is_empty()) {
        let competitor = match req.competitor_id {
            Some(id) => CompetitorRepository::new(state.pool()).get_by_id(id).await?,
            None => None,
        };
        let competitor_name = competitor
            .as_ref()
            .map(|c| c.name.clone())
            .or(req.competitor_name)
            .unwrap_or_else(|| UNKNOWN_COMPETITOR.to_string());

        generator
            .generate(
                content,
                &competitor_name,
                req.source_type.as_deref().unwrap_or(DEFAULT_SOURCE_TYPE),
                InsightSource {
                    competitor_id: competitor.map(|c| c.id),
                    ..Default::default()
                },
            )
            .await?
    } else {
        return Err(ApiError::bad_request(
            "Provide news_item_id, alert_id, or content",
        ));
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::new(insight))))
}

/// POST /api/insights/generate-batch - Fill in missing insights.
pub async fn generate_batch(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<GenerateBatchRequest>,
) -> Result<Json<ApiResponse<BatchInsightResponse>>, ApiError> {
    let limit = req
        .limit
        .unwrap_or(DEFAULT_BATCH_LIMIT)
        .clamp(1, MAX_BATCH_LIMIT);
    let insights = state.services.insights.generate_batch(limit).await?;

    Ok(Json(ApiResponse::new(BatchInsightResponse {
        count: insights.len(),
        insights,
    })))
}

/// POST /api/insights/:id/review - Mark an insight as reviewed.
pub async fn review_insight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    OptionalJson(req): OptionalJson<ReviewInsightRequest>,
) -> Result<Json<ApiResponse<Insight>>, ApiError> {
    load_insight(&state, id).await?;

    let reviewer = req
        .reviewed_by
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REVIEWER);
    InsightRepository::new(state.pool())
        .review(id, reviewer, req.notes.as_deref())
        .await?;

    Ok(Json(ApiResponse::new(load_insight(&state, id).await?)))
}

/// GET /api/insights/summary - Dashboard roll-up.
pub async fn insights_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<ApiResponse<InsightSummary>>, ApiError> {
    let days = bounded_window(
        query.days.unwrap_or(DEFAULT_SUMMARY_DAYS).max(1),
        "days",
        MAX_WINDOW_DAYS,
    )?;
    let summary = InsightRepository::new(state.pool()).summary(days).await?;
    Ok(Json(ApiResponse::new(summary)))
}
