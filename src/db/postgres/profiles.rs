use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, PgPool, Row};

use crate::{
    error::{AppError, AppResult},
    models::{DailyPickEntry, DailyPickRecord, EmotionalFingerprint, GenrePreferences, UserId},
    services::ports::ProfileStore,
};

/// Fingerprints, genre preferences and daily slates
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_daily_picks(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> AppResult<Option<DailyPickRecord>> {
        let row = sqlx::query(
            "SELECT entries, created_at FROM daily_picks WHERE user_id = $1 AND pick_date = $2",
        )
        .bind(user_id.0)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Json(entries): Json<Vec<DailyPickEntry>> = row.try_get("entries")?;

        Ok(Some(DailyPickRecord {
            user_id,
            date,
            entries,
            created_at: row.try_get("created_at")?,
        }))
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_or_create_fingerprint(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<EmotionalFingerprint> {
        let fresh = EmotionalFingerprint::new(user_id, now);
        sqlx::query(
            r#"
            INSERT INTO emotional_fingerprints (user_id, fingerprint, version, updated_at)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id.0)
        .bind(Json(&fresh))
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT fingerprint, version FROM emotional_fingerprints WHERE user_id = $1",
        )
        .bind(user_id.0)
        .fetch_one(&self.pool)
        .await?;

        let Json(mut fingerprint): Json<EmotionalFingerprint> = row.try_get("fingerprint")?;
        // the column is authoritative for concurrency control
        fingerprint.version = row.try_get("version")?;
        Ok(fingerprint)
    }

    async fn compare_and_swap_fingerprint(
        &self,
        fingerprint: &EmotionalFingerprint,
        expected_version: i64,
    ) -> AppResult<bool> {
        let mut next = fingerprint.clone();
        next.version = expected_version + 1;

        let result = sqlx::query(
            r#"
            UPDATE emotional_fingerprints
            SET fingerprint = $3, version = $4, updated_at = $5
            WHERE user_id = $1 AND version = $2
            "#,
        )
        .bind(next.user_id.0)
        .bind(expected_version)
        .bind(Json(&next))
        .bind(next.version)
        .bind(next.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_genre_preferences(
        &self,
        user_id: UserId,
    ) -> AppResult<Option<GenrePreferences>> {
        let row: Option<(Vec<String>, Vec<String>, bool)> = sqlx::query_as(
            r#"
            SELECT favorite_genres, disliked_genres, learned
            FROM genre_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(favorite_genres, disliked_genres, learned)| GenrePreferences {
            favorite_genres,
            disliked_genres,
            learned,
        }))
    }

    async fn save_genre_preferences(
        &self,
        user_id: UserId,
        preferences: &GenrePreferences,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO genre_preferences (user_id, favorite_genres, disliked_genres, learned, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_id) DO UPDATE
            SET favorite_genres = EXCLUDED.favorite_genres,
                disliked_genres = EXCLUDED.disliked_genres,
                learned = EXCLUDED.learned,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id.0)
        .bind(&preferences.favorite_genres)
        .bind(&preferences.disliked_genres)
        .bind(preferences.learned)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_daily_picks(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> AppResult<Option<DailyPickRecord>> {
        self.fetch_daily_picks(user_id, date).await
    }

    async fn insert_daily_picks_if_absent(
        &self,
        record: &DailyPickRecord,
    ) -> AppResult<DailyPickRecord> {
        sqlx::query(
            r#"
            INSERT INTO daily_picks (user_id, pick_date, entries, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, pick_date) DO NOTHING
            "#,
        )
        .bind(record.user_id.0)
        .bind(record.date)
        .bind(Json(&record.entries))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        self.fetch_daily_picks(record.user_id, record.date)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "daily picks for {} on {} vanished after insert",
                    record.user_id, record.date
                ))
            })
    }

    async fn delete_daily_picks_before(
        &self,
        user_id: UserId,
        before: NaiveDate,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM daily_picks WHERE user_id = $1 AND pick_date < $2")
            .bind(user_id.0)
            .bind(before)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
