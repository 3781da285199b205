use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CompatibilityReport, ItemId, UserId},
    routes::AppState,
};

/// Handler for scoring one item against a user's fingerprint
pub async fn score_compatibility(
    State(state): State<Arc<AppState>>,
    Path((user_id, item_id)): Path<(UserId, ItemId)>,
) -> AppResult<Json<CompatibilityReport>> {
    let report = state.engine.score_compatibility(user_id, item_id).await?;
    Ok(Json(report))
}
