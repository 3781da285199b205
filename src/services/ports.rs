/// Boundaries to the collaborators this engine reads from and writes to.
///
/// Every service takes these as `Arc<dyn ...>` so the same logic runs against
/// PostgreSQL, the Redis-cached catalog, or the in-memory adapters used in tests.
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::AppResult,
    models::{
        CatalogItem, ContentEmotionalProfile, DailyPickRecord, EmotionalEvent,
        EmotionalFingerprint, EventQuery, GenrePreferences, ItemId, SimilarItem, TrendingEntry,
        UserId,
    },
};

/// Read-only view of the content catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    /// Look up one item's metadata; `None` when the item does not exist
    async fn get_item(&self, item_id: ItemId) -> AppResult<Option<CatalogItem>>;

    /// Look up an item's emotional profile; `None` when it was never profiled
    async fn get_emotional_profile(
        &self,
        item_id: ItemId,
    ) -> AppResult<Option<ContentEmotionalProfile>>;

    /// Trending ranking for a period (e.g. "weekly"), best first
    async fn trending(&self, period: &str, limit: usize) -> AppResult<Vec<TrendingEntry>>;

    /// Catalog-declared similar items, most similar first
    async fn similar_items(&self, item_id: ItemId, limit: usize) -> AppResult<Vec<SimilarItem>>;

    /// Published items whose genre is one of `genres`
    async fn published_in_genres(
        &self,
        genres: &[String],
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>>;

    /// Published items with `published_at >= since`, newest first
    async fn published_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>>;
}

/// Append-only store of normalized behavioral events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn append(&self, event: &EmotionalEvent) -> AppResult<()>;

    /// Events of one user matching the query, newest first
    async fn query(&self, user_id: UserId, query: EventQuery) -> AppResult<Vec<EmotionalEvent>>;
}

/// Durable storage for fingerprints, genre preferences and daily slates
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the stored fingerprint, persisting a default one on first access
    async fn get_or_create_fingerprint(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<EmotionalFingerprint>;

    /// Writes `fingerprint` only if the stored version still equals `expected_version`.
    ///
    /// The stored copy gets `expected_version + 1`. Returns `false` when another
    /// writer got there first.
    async fn compare_and_swap_fingerprint(
        &self,
        fingerprint: &EmotionalFingerprint,
        expected_version: i64,
    ) -> AppResult<bool>;

    async fn get_genre_preferences(&self, user_id: UserId)
        -> AppResult<Option<GenrePreferences>>;

    async fn save_genre_preferences(
        &self,
        user_id: UserId,
        preferences: &GenrePreferences,
    ) -> AppResult<()>;

    async fn get_daily_picks(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> AppResult<Option<DailyPickRecord>>;

    /// Stores `record` unless a slate already exists for its `(user, date)` key.
    ///
    /// Always returns the slate that ended up stored, so a losing writer reads back
    /// the winner's selection.
    async fn insert_daily_picks_if_absent(
        &self,
        record: &DailyPickRecord,
    ) -> AppResult<DailyPickRecord>;

    /// Drops a user's slates dated strictly before `before`; returns how many went
    async fn delete_daily_picks_before(&self, user_id: UserId, before: NaiveDate)
        -> AppResult<u64>;
}
