use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{EmotionChannel, EmotionTag, EmotionalEvent, EventType, RawEvent, UserId},
};

/// Longest context tag kept after normalization
const MAX_TAG_LEN: usize = 64;

/// Validates a raw client event and turns it into the canonical shape.
///
/// Only structurally malformed input (an unknown event type) is rejected. Numeric
/// oddities are normalized instead: negative or non-finite durations are dropped,
/// a missing timestamp becomes `now`, and a future timestamp is pulled back to `now`.
pub fn normalize_event(
    user_id: UserId,
    raw: RawEvent,
    now: DateTime<Utc>,
) -> AppResult<EmotionalEvent> {
    let event_type = EventType::parse(&raw.event_type).ok_or_else(|| {
        AppError::InvalidInput(format!("Unknown event type: {}", raw.event_type))
    })?;

    let context = raw.emotional_context.as_deref().and_then(normalize_tag);

    let duration_seconds = raw
        .duration_seconds
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0);

    let occurred_at = match raw.timestamp {
        Some(at) if at <= now => at,
        _ => now,
    };

    Ok(EmotionalEvent {
        id: Uuid::new_v4(),
        user_id,
        event_type,
        context,
        duration_seconds,
        occurred_at,
        item_id: raw.item_id,
        chapter: raw.chapter,
    })
}

/// Normalizes a free-text context into a channel or an explicit "other" tag
pub fn normalize_tag(raw: &str) -> Option<EmotionTag> {
    let normalized: String = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .take(MAX_TAG_LEN)
        .collect();

    if normalized.is_empty() {
        return None;
    }

    Some(match EmotionChannel::from_tag(&normalized) {
        Some(channel) => EmotionTag::Channel(channel),
        None => EmotionTag::Other(normalized),
    })
}
