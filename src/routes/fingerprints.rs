use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{EmotionalFingerprint, GenrePreferences, PreferenceUpdate, UserId},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct GenreRequest {
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub disliked_genres: Vec<String>,
}

pub async fn get_fingerprint(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<EmotionalFingerprint>> {
    let fingerprint = state.engine.get_fingerprint(user_id).await?;
    Ok(Json(fingerprint))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Json(update): Json<PreferenceUpdate>,
) -> AppResult<Json<EmotionalFingerprint>> {
    if update.pacing.is_none() && update.sensitivity.is_none() {
        return Err(AppError::InvalidInput(
            "Provide pacing and/or sensitivity".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        pacing = update.pacing.is_some(),
        sensitivity = update.sensitivity.is_some(),
        "Updating declared preferences"
    );

    let fingerprint = state.engine.update_preferences(user_id, update).await?;
    Ok(Json(fingerprint))
}

pub async fn reset_fingerprint(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<EmotionalFingerprint>> {
    tracing::info!(request_id = %request_id, user_id = %user_id, "Resetting fingerprint");
    let fingerprint = state.engine.reset_fingerprint(user_id).await?;
    Ok(Json(fingerprint))
}

pub async fn set_genres(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Json(request): Json<GenreRequest>,
) -> AppResult<Json<GenrePreferences>> {
    let preferences = state
        .engine
        .set_genre_preferences(user_id, request.favorite_genres, request.disliked_genres)
        .await?;
    Ok(Json(preferences))
}
