use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{EmotionalEvent, EmotionalFingerprint, RawEvent, UserId},
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct EventRecorded {
    pub event: EmotionalEvent,
    pub fingerprint: EmotionalFingerprint,
}

/// Handler for event ingestion
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Json(raw): Json<RawEvent>,
) -> AppResult<(StatusCode, Json<EventRecorded>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        event_type = %raw.event_type,
        "Recording event"
    );

    let (event, fingerprint) = state.engine.record_event(user_id, raw).await?;

    Ok((
        StatusCode::CREATED,
        Json(EventRecorded { event, fingerprint }),
    ))
}
