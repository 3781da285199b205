use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::cache::{Cache, CacheKey};
use crate::{
    cached,
    error::AppResult,
    models::{CatalogItem, ContentEmotionalProfile, ItemId, SimilarItem, TrendingEntry},
    services::ports::ContentCatalog,
};

/// Read-through Redis cache in front of any catalog.
///
/// Item metadata, emotional profiles, similar items and trending rankings are
/// cached; genre and recency listings always hit the source. Absent items are not
/// cached so a newly published item shows up immediately.
pub struct CachedCatalog {
    inner: Arc<dyn ContentCatalog>,
    cache: Cache,
    catalog_ttl: u64,
    trending_ttl: u64,
}

impl CachedCatalog {
    pub fn new(
        inner: Arc<dyn ContentCatalog>,
        cache: Cache,
        catalog_ttl: u64,
        trending_ttl: u64,
    ) -> Self {
        Self {
            inner,
            cache,
            catalog_ttl,
            trending_ttl,
        }
    }

    /// Like `cached!`, but a `None` from the source is returned without being stored
    async fn cached_optional<T, F>(&self, key: CacheKey, fetch: F) -> AppResult<Option<T>>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        F: std::future::Future<Output = AppResult<Option<T>>>,
    {
        match self.cache.get_from_cache::<T>(&key).await {
            Ok(Some(hit)) => {
                tracing::debug!(key = %key, "Cache hit");
                return Ok(Some(hit));
            }
            Ok(None) => tracing::debug!(key = %key, "Cache miss"),
            Err(e) => tracing::warn!(key = %key, error = %e, "Cache read failed, using source"),
        }

        let value = fetch.await?;
        if let Some(value) = &value {
            self.cache.set_in_background(&key, value, self.catalog_ttl);
        }
        Ok(value)
    }
}

#[async_trait]
impl ContentCatalog for CachedCatalog {
    async fn get_item(&self, item_id: ItemId) -> AppResult<Option<CatalogItem>> {
        self.cached_optional(CacheKey::Item(item_id), self.inner.get_item(item_id))
            .await
    }

    async fn get_emotional_profile(
        &self,
        item_id: ItemId,
    ) -> AppResult<Option<ContentEmotionalProfile>> {
        self.cached_optional(
            CacheKey::EmotionalProfile(item_id),
            self.inner.get_emotional_profile(item_id),
        )
        .await
    }

    async fn trending(&self, period: &str, limit: usize) -> AppResult<Vec<TrendingEntry>> {
        cached!(
            self.cache,
            CacheKey::Trending {
                period: period.to_string(),
                limit,
            },
            self.trending_ttl,
            self.inner.trending(period, limit)
        )
    }

    async fn similar_items(&self, item_id: ItemId, limit: usize) -> AppResult<Vec<SimilarItem>> {
        cached!(
            self.cache,
            CacheKey::SimilarItems { item_id, limit },
            self.catalog_ttl,
            self.inner.similar_items(item_id, limit)
        )
    }

    async fn published_in_genres(
        &self,
        genres: &[String],
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>> {
        self.inner.published_in_genres(genres, limit).await
    }

    async fn published_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>> {
        self.inner.published_since(since, limit).await
    }
}
