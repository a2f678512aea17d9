//! Playbook handlers for Web API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::playbook::{CompetitivePlaybook, NewPlaybook, PlaybookRepository};
use crate::web::dto::{ApiResponse, CreatePlaybookRequest, PlaybookQuery, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/playbooks - List playbooks by priority.
pub async fn list_playbooks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaybookQuery>,
) -> Result<Json<ApiResponse<Vec<CompetitivePlaybook>>>, ApiError> {
    let playbooks = PlaybookRepository::new(state.pool())
        .list(query.active.unwrap_or(true))
        .await?;
    Ok(Json(ApiResponse::new(playbooks)))
}

/// GET /api/playbooks/:id - Get a playbook.
pub async fn get_playbook(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CompetitivePlaybook>>, ApiError> {
    let playbook = PlaybookRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Playbook not found"))?;
    Ok(Json(ApiResponse::new(playbook)))
}

/// POST /api/playbooks - Create a playbook.
pub async fn create_playbook(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreatePlaybookRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CompetitivePlaybook>>), ApiError> {
    let new = NewPlaybook {
        slug: req.slug,
        description: req.description,
        trigger_signal_types: req.trigger_signal_types,
        trigger_keywords: req.trigger_keywords,
        sales_actions: req.sales_actions,
        marketing_actions: req.marketing_actions,
        product_actions: req.product_actions,
        executive_actions: req.executive_actions,
        email_templates: req.email_templates,
        talk_tracks: req.talk_tracks,
        escalation_criteria: req.escalation_criteria,
        escalation_contacts: req.escalation_contacts,
        priority: req.priority,
        ..NewPlaybook::new(req.name.trim())
    };

    let repo = PlaybookRepository::new(state.pool());
    if repo.get_by_slug(&new.resolved_slug()).await?.is_some() {
        return Err(ApiError::conflict("Playbook slug already exists"));
    }

    let playbook = repo.create(&new).await?;
    info!("Playbook created: {}", playbook.slug);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(playbook))))
}
