//! Battle card handlers for Web API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::battle_card::{
    BattleCard, BattleCardFilter, BattleCardRepository, BattleCardStatus, BattleCardUpdate,
    NewBattleCard,
};
use crate::competitor::CompetitorRepository;
use crate::web::dto::{
    parse_param, ApiResponse, BattleCardQuery, CreateBattleCardRequest,
    GenerateBattleCardRequest, UpdateBattleCardRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

async fn load_card(state: &AppState, id: i64) -> Result<BattleCard, ApiError> {
    BattleCardRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Battle card not found"))
}

/// GET /api/battle-cards - List battle cards.
pub async fn list_battle_cards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BattleCardQuery>,
) -> Result<Json<ApiResponse<Vec<BattleCard>>>, ApiError> {
    let filter = BattleCardFilter {
        competitor_id: query.competitor_id,
        status: parse_param::<BattleCardStatus>(query.status.as_deref(), "status")?,
    };
    let cards = BattleCardRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(ApiResponse::new(cards)))
}

/// GET /api/battle-cards/:id - Get a battle card.
pub async fn get_battle_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BattleCard>>, ApiError> {
    Ok(Json(ApiResponse::new(load_card(&state, id).await?)))
}

/// POST /api/battle-cards - Create a draft battle card.
pub async fn create_battle_card(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateBattleCardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BattleCard>>), ApiError> {
    let competitor = CompetitorRepository::new(state.pool())
        .get_by_id(req.competitor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Competitor not found"))?;

    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{} Battle Card", competitor.name));

    let card = BattleCardRepository::new(state.pool())
        .create(&NewBattleCard {
            competitor_id: competitor.id,
            name,
            elevator_pitch: req.elevator_pitch,
            target_segment: req.target_segment,
            our_strengths: req.our_strengths,
            our_weaknesses: req.our_weaknesses,
            competitor_strengths: req.competitor_strengths,
            competitor_weaknesses: req.competitor_weaknesses,
            key_differentiators: req.key_differentiators,
            trap_questions: req.trap_questions,
            landmine_questions: req.landmine_questions,
            common_objections: req.common_objections,
            customer_wins: req.customer_wins,
            pricing_comparison: req.pricing_comparison,
            feature_comparison: req.feature_comparison,
            created_by: req.created_by,
        })
        .await?;
    info!("Battle card created: {}", card.name);

    Ok((StatusCode::CREATED, Json(ApiResponse::new(card))))
}

/// PUT /api/battle-cards/:id - Update a battle card.
pub async fn update_battle_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateBattleCardRequest>,
) -> Result<Json<ApiResponse<BattleCard>>, ApiError> {
    load_card(&state, id).await?;

    let update = BattleCardUpdate {
        name: req.name,
        status: req.status,
        elevator_pitch: req.elevator_pitch.map(Some),
        target_segment: req.target_segment.map(Some),
        our_strengths: req.our_strengths,
        our_weaknesses: req.our_weaknesses,
        competitor_strengths: req.competitor_strengths,
        competitor_weaknesses: req.competitor_weaknesses,
        key_differentiators: req.key_differentiators,
        trap_questions: req.trap_questions,
        landmine_questions: req.landmine_questions,
        common_objections: req.common_objections,
        customer_wins: req.customer_wins,
        pricing_comparison: req.pricing_comparison,
        feature_comparison: req.feature_comparison,
        mark_reviewed: req.mark_reviewed,
    };
    BattleCardRepository::new(state.pool())
        .update(id, &update)
        .await?;

    Ok(Json(ApiResponse::new(load_card(&state, id).await?)))
}

/// POST /api/battle-cards/generate - Draft a battle card with the LLM.
pub async fn generate_battle_card(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateBattleCardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BattleCard>>), ApiError> {
    let card = state
        .services
        .battle_cards
        .generate(req.competitor_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(card))))
}

/// POST /api/battle-cards/:id/generate - Refresh a card's content with the LLM.
pub async fn enhance_battle_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BattleCard>>, ApiError> {
    load_card(&state, id).await?;
    let card = state.services.battle_cards.enhance(id).await?;
    Ok(Json(ApiResponse::new(card)))
}
