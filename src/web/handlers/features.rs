//! Feature comparison handlers for Web API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::competitor::CompetitorRepository;
use crate::feature::{FeatureComparison, FeatureMatrix, FeatureRepository, FeatureUpdate, NewFeature};
use crate::web::dto::{
    ApiResponse, CreateFeatureRequest, FeatureQuery, UpdateFeatureRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

async fn load_feature(state: &AppState, id: i64) -> Result<FeatureComparison, ApiError> {
    FeatureRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Feature not found"))
}

/// GET /api/features - List features, optionally for one category.
pub async fn list_features(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeatureQuery>,
) -> Result<Json<ApiResponse<Vec<FeatureComparison>>>, ApiError> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let features = FeatureRepository::new(state.pool()).list(category).await?;
    Ok(Json(ApiResponse::new(features)))
}

/// GET /api/features/categories - Distinct feature categories.
pub async fn list_feature_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let categories = FeatureRepository::new(state.pool()).categories().await?;
    Ok(Json(ApiResponse::new(categories)))
}

/// GET /api/features/matrix - Features by category against active competitors.
pub async fn feature_matrix(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<FeatureMatrix>>, ApiError> {
    let features = FeatureRepository::new(state.pool()).list(None).await?;
    let competitors = CompetitorRepository::new(state.pool()).list_active().await?;
    Ok(Json(ApiResponse::new(FeatureMatrix::build(features, &competitors))))
}

/// POST /api/features - Add a feature to the matrix.
pub async fn create_feature(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateFeatureRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FeatureComparison>>), ApiError> {
    let new = NewFeature {
        description: req.description,
        our_capability: req.our_capability.unwrap_or_default(),
        our_details: req.our_details,
        competitor_capabilities: req.competitor_capabilities,
        customer_importance: req.customer_importance,
        differentiation_level: req.differentiation_level,
        ..NewFeature::new(req.category, req.feature_name)
    };
    let feature = FeatureRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(feature))))
}

/// PUT /api/features/:id - Update a feature and mark it verified.
pub async fn update_feature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateFeatureRequest>,
) -> Result<Json<ApiResponse<FeatureComparison>>, ApiError> {
    load_feature(&state, id).await?;

    let update = FeatureUpdate {
        category: req.category,
        feature_name: req.feature_name,
        description: req.description,
        our_capability: req.our_capability,
        our_details: req.our_details,
        competitor_capabilities: req.competitor_capabilities,
        customer_importance: req.customer_importance,
        differentiation_level: req.differentiation_level,
        verified_by: req.verified_by,
    };
    FeatureRepository::new(state.pool()).update(id, &update).await?;

    Ok(Json(ApiResponse::new(load_feature(&state, id).await?)))
}
