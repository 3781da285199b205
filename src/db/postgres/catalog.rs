use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CatalogItem, ContentEmotionalProfile, ItemId, SimilarItem, TrendingEntry},
    services::ports::ContentCatalog,
};

const ITEM_COLUMNS: &str = "id, title, author, genre, tags, published_at, is_published";

/// Catalog tables read through a connection pool
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn item_from_row(row: &PgRow) -> AppResult<CatalogItem> {
    Ok(CatalogItem {
        id: ItemId(row.try_get("id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        genre: row.try_get("genre")?,
        tags: row.try_get("tags")?,
        published_at: row.try_get("published_at")?,
        is_published: row.try_get("is_published")?,
    })
}

fn as_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl ContentCatalog for PgCatalog {
    async fn get_item(&self, item_id: ItemId) -> AppResult<Option<CatalogItem>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM catalog_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(item_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn get_emotional_profile(
        &self,
        item_id: ItemId,
    ) -> AppResult<Option<ContentEmotionalProfile>> {
        let profile: Option<Json<ContentEmotionalProfile>> = sqlx::query_scalar(
            "SELECT profile FROM content_emotional_profiles WHERE item_id = $1",
        )
        .bind(item_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile.map(|Json(profile)| profile))
    }

    async fn trending(&self, period: &str, limit: usize) -> AppResult<Vec<TrendingEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, score, read_count
            FROM trending_rankings
            WHERE period = $1
            ORDER BY score DESC, item_id
            LIMIT $2
            "#,
        )
        .bind(period)
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<TrendingEntry> {
                let read_count: i64 = row.try_get("read_count")?;
                Ok(TrendingEntry {
                    item_id: ItemId(row.try_get("item_id")?),
                    score: row.try_get("score")?,
                    read_count: u64::try_from(read_count).unwrap_or(0),
                })
            })
            .collect()
    }

    async fn similar_items(&self, item_id: ItemId, limit: usize) -> AppResult<Vec<SimilarItem>> {
        let rows: Vec<(Uuid, f64)> = sqlx::query_as(
            r#"
            SELECT similar_item_id, similarity
            FROM similar_items
            WHERE item_id = $1
            ORDER BY similarity DESC, similar_item_id
            LIMIT $2
            "#,
        )
        .bind(item_id.0)
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, similarity)| SimilarItem {
                item_id: ItemId(id),
                similarity,
            })
            .collect())
    }

    async fn published_in_genres(
        &self,
        genres: &[String],
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>> {
        let lowered: Vec<String> = genres.iter().map(|genre| genre.to_lowercase()).collect();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM catalog_items
            WHERE is_published AND lower(genre) = ANY($1)
            ORDER BY published_at DESC NULLS LAST, id
            LIMIT $2
            "#,
            ITEM_COLUMNS
        ))
        .bind(lowered)
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn published_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM catalog_items
            WHERE is_published AND published_at >= $1
            ORDER BY published_at DESC, id
            LIMIT $2
            "#,
            ITEM_COLUMNS
        ))
        .bind(since)
        .bind(as_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }
}
