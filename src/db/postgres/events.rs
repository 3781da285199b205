use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};

use crate::{
    error::{AppError, AppResult},
    models::{EmotionTag, EmotionalEvent, EventQuery, EventType, ItemId, UserId},
    services::ports::EventLog,
};

/// Append-only `emotional_events` table
#[derive(Clone)]
pub struct PgEventLog {
    pool: PgPool,
}

impl PgEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn event_from_row(row: &PgRow) -> AppResult<EmotionalEvent> {
    let raw_type: String = row.try_get("event_type")?;
    let event_type = EventType::parse(&raw_type)
        .ok_or_else(|| AppError::Internal(format!("Stored event has unknown type: {}", raw_type)))?;
    let context: Option<Json<EmotionTag>> = row.try_get("context")?;
    let chapter: Option<i32> = row.try_get("chapter")?;

    Ok(EmotionalEvent {
        id: row.try_get("id")?,
        user_id: UserId(row.try_get("user_id")?),
        event_type,
        context: context.map(|Json(tag)| tag),
        duration_seconds: row.try_get("duration_seconds")?,
        occurred_at: row.try_get("occurred_at")?,
        item_id: ItemId(row.try_get("item_id")?),
        chapter: chapter.and_then(|c| u32::try_from(c).ok()),
    })
}

#[async_trait]
impl EventLog for PgEventLog {
    async fn append(&self, event: &EmotionalEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO emotional_events
                (id, user_id, event_type, context, duration_seconds, occurred_at, item_id, chapter)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(event.user_id.0)
        .bind(event.event_type.as_str())
        .bind(event.context.as_ref().map(Json))
        .bind(event.duration_seconds)
        .bind(event.occurred_at)
        .bind(event.item_id.0)
        .bind(event.chapter.and_then(|c| i32::try_from(c).ok()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(&self, user_id: UserId, query: EventQuery) -> AppResult<Vec<EmotionalEvent>> {
        let types: Vec<String> = query
            .event_types
            .iter()
            .map(|event_type| event_type.as_str().to_string())
            .collect();
        let limit = query.limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, event_type, context, duration_seconds, occurred_at, item_id, chapter
            FROM emotional_events
            WHERE user_id = $1
              AND (cardinality($2::text[]) = 0 OR event_type = ANY($2))
              AND ($3::timestamptz IS NULL OR occurred_at >= $3)
              AND ($4::timestamptz IS NULL OR occurred_at < $4)
            ORDER BY occurred_at DESC, seq DESC
            LIMIT $5
            "#,
        )
        .bind(user_id.0)
        .bind(types)
        .bind(query.since)
        .bind(query.until)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(event_from_row).collect()
    }
}
