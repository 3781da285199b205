/// In-process implementations of the collaborator ports.
///
/// Backed by `tokio::sync::RwLock` maps; used by the test suite and by
/// `STORAGE_BACKEND=memory` deployments. Nothing survives a restart.
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{
        CatalogItem, ContentEmotionalProfile, DailyPickRecord, EmotionalEvent,
        EmotionalFingerprint, EventQuery, GenrePreferences, ItemId, SimilarItem, TrendingEntry,
        UserId,
    },
    services::ports::{ContentCatalog, EventLog, ProfileStore},
};

#[derive(Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<ItemId, CatalogItem>>,
    profiles: RwLock<HashMap<ItemId, ContentEmotionalProfile>>,
    similar: RwLock<HashMap<ItemId, Vec<SimilarItem>>>,
    trending: RwLock<HashMap<String, Vec<TrendingEntry>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an item
    pub async fn insert_item(&self, item: CatalogItem) {
        self.items.write().await.insert(item.id, item);
    }

    pub async fn set_emotional_profile(&self, item_id: ItemId, profile: ContentEmotionalProfile) {
        self.profiles.write().await.insert(item_id, profile);
    }

    /// Declares `to` as a neighbour of `from`, replacing an earlier similarity
    pub async fn add_similar(&self, from: ItemId, to: ItemId, similarity: f64) {
        let mut similar = self.similar.write().await;
        let neighbours = similar.entry(from).or_default();
        neighbours.retain(|existing| existing.item_id != to);
        neighbours.push(SimilarItem {
            item_id: to,
            similarity,
        });
    }

    pub async fn set_trending(&self, period: &str, ranking: Vec<TrendingEntry>) {
        self.trending
            .write()
            .await
            .insert(period.to_string(), ranking);
    }
}

/// Newest first; ties broken by id so results are deterministic
fn newest_first(items: &mut [CatalogItem]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl ContentCatalog for InMemoryCatalog {
    async fn get_item(&self, item_id: ItemId) -> AppResult<Option<CatalogItem>> {
        Ok(self.items.read().await.get(&item_id).cloned())
    }

    async fn get_emotional_profile(
        &self,
        item_id: ItemId,
    ) -> AppResult<Option<ContentEmotionalProfile>> {
        Ok(self.profiles.read().await.get(&item_id).cloned())
    }

    async fn trending(&self, period: &str, limit: usize) -> AppResult<Vec<TrendingEntry>> {
        let mut ranking = self
            .trending
            .read()
            .await
            .get(period)
            .cloned()
            .unwrap_or_default();
        ranking.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranking.truncate(limit);
        Ok(ranking)
    }

    async fn similar_items(&self, item_id: ItemId, limit: usize) -> AppResult<Vec<SimilarItem>> {
        let mut neighbours = self
            .similar
            .read()
            .await
            .get(&item_id)
            .cloned()
            .unwrap_or_default();
        neighbours.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbours.truncate(limit);
        Ok(neighbours)
    }

    async fn published_in_genres(
        &self,
        genres: &[String],
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>> {
        let items = self.items.read().await;
        let mut matching: Vec<CatalogItem> = items
            .values()
            .filter(|item| item.is_published)
            .filter(|item| {
                item.genre.as_deref().is_some_and(|genre| {
                    genres.iter().any(|wanted| wanted.eq_ignore_ascii_case(genre))
                })
            })
            .cloned()
            .collect();
        newest_first(&mut matching);
        matching.truncate(limit);
        Ok(matching)
    }

    async fn published_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>> {
        let items = self.items.read().await;
        let mut recent: Vec<CatalogItem> = items
            .values()
            .filter(|item| item.is_published && item.published_at.is_some_and(|at| at >= since))
            .cloned()
            .collect();
        newest_first(&mut recent);
        recent.truncate(limit);
        Ok(recent)
    }
}

#[derive(Default)]
pub struct InMemoryEventLog {
    events: RwLock<HashMap<UserId, Vec<EmotionalEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, event: &EmotionalEvent) -> AppResult<()> {
        self.events
            .write()
            .await
            .entry(event.user_id)
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn query(&self, user_id: UserId, query: EventQuery) -> AppResult<Vec<EmotionalEvent>> {
        let events = self.events.read().await;
        let Some(history) = events.get(&user_id) else {
            return Ok(Vec::new());
        };

        // later appends first among equal timestamps
        let mut matching: Vec<EmotionalEvent> = history
            .iter()
            .rev()
            .filter(|event| query.matches(event))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    fingerprints: RwLock<HashMap<UserId, EmotionalFingerprint>>,
    genres: RwLock<HashMap<UserId, GenrePreferences>>,
    daily_picks: RwLock<HashMap<(UserId, NaiveDate), DailyPickRecord>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_or_create_fingerprint(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<EmotionalFingerprint> {
        if let Some(existing) = self.fingerprints.read().await.get(&user_id) {
            return Ok(existing.clone());
        }
        Ok(self
            .fingerprints
            .write()
            .await
            .entry(user_id)
            .or_insert_with(|| EmotionalFingerprint::new(user_id, now))
            .clone())
    }

    async fn compare_and_swap_fingerprint(
        &self,
        fingerprint: &EmotionalFingerprint,
        expected_version: i64,
    ) -> AppResult<bool> {
        let mut fingerprints = self.fingerprints.write().await;
        let stored_version = fingerprints
            .get(&fingerprint.user_id)
            .map(|stored| stored.version)
            .unwrap_or(0);
        if stored_version != expected_version {
            return Ok(false);
        }

        let mut next = fingerprint.clone();
        next.version = expected_version + 1;
        fingerprints.insert(next.user_id, next);
        Ok(true)
    }

    async fn get_genre_preferences(
        &self,
        user_id: UserId,
    ) -> AppResult<Option<GenrePreferences>> {
        Ok(self.genres.read().await.get(&user_id).cloned())
    }

    async fn save_genre_preferences(
        &self,
        user_id: UserId,
        preferences: &GenrePreferences,
    ) -> AppResult<()> {
        self.genres
            .write()
            .await
            .insert(user_id, preferences.clone());
        Ok(())
    }

    async fn get_daily_picks(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> AppResult<Option<DailyPickRecord>> {
        Ok(self.daily_picks.read().await.get(&(user_id, date)).cloned())
    }

    async fn insert_daily_picks_if_absent(
        &self,
        record: &DailyPickRecord,
    ) -> AppResult<DailyPickRecord> {
        Ok(self
            .daily_picks
            .write()
            .await
            .entry((record.user_id, record.date))
            .or_insert_with(|| record.clone())
            .clone())
    }

    async fn delete_daily_picks_before(
        &self,
        user_id: UserId,
        before: NaiveDate,
    ) -> AppResult<u64> {
        let mut daily_picks = self.daily_picks.write().await;
        let count_before = daily_picks.len();
        daily_picks.retain(|(owner, date), _| *owner != user_id || *date >= before);
        Ok((count_before - daily_picks.len()) as u64)
    }
}
