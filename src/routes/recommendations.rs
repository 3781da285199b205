use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{DailyPicks, Recommendation, UserId},
    routes::AppState,
    services::DEFAULT_RECOMMENDATION_LIMIT,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub count: usize,
    pub recommendations: Vec<Recommendation>,
}

/// Handler for the ranked recommendation list
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit,
        "Processing recommendation request"
    );

    let recommendations = state.engine.get_recommendations(user_id, limit).await?;

    Ok(Json(RecommendationResponse {
        user_id,
        count: recommendations.len(),
        recommendations,
    }))
}

pub async fn get_daily_picks(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<DailyPicks>> {
    let picks = state.engine.get_daily_picks(user_id).await?;
    Ok(Json(picks))
}
