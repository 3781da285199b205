use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        CompatibilityReport, ContentEmotionalProfile, DailyPicks, EmotionalEvent,
        EmotionalFingerprint, GenrePreferences, ItemId, PreferenceUpdate, RawEvent,
        Recommendation, UserId,
    },
    services::{
        clock::Clock,
        compatibility,
        daily_picks::DailyPickService,
        fingerprint::FingerprintService,
        generators::{
            AffinityGenerator, CandidateGenerator, ProfileMatchedGenerator, RecencyGenerator,
            TrendingGenerator,
        },
        ports::{ContentCatalog, EventLog, ProfileStore},
        recommendations::RecommendationAggregator,
    },
};

/// Tunables of the engine, usually taken from `Config`
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub generator_timeout: Duration,
    pub max_retries: u32,
    pub daily_pick_ttl_secs: u64,
    pub max_recommendations: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            generator_timeout: Duration::from_millis(800),
            max_retries: 5,
            daily_pick_ttl_secs: 172_800,
            max_recommendations: 50,
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            generator_timeout: Duration::from_millis(config.generator_timeout_ms),
            max_retries: config.profile_update_max_retries,
            daily_pick_ttl_secs: config.daily_pick_ttl_secs,
            max_recommendations: config.max_recommendations,
        }
    }
}

/// Page size used when a caller does not ask for one
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// The operations exposed to the presentation layer
pub struct PersonalizationEngine {
    catalog: Arc<dyn ContentCatalog>,
    store: Arc<dyn ProfileStore>,
    fingerprints: FingerprintService,
    aggregator: Arc<RecommendationAggregator>,
    daily_picks: DailyPickService,
    settings: EngineSettings,
}

impl PersonalizationEngine {
    pub fn new(
        catalog: Arc<dyn ContentCatalog>,
        events: Arc<dyn EventLog>,
        store: Arc<dyn ProfileStore>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        let recency: Arc<dyn CandidateGenerator> =
            Arc::new(RecencyGenerator::new(catalog.clone(), clock.clone()));
        let generators: Vec<Arc<dyn CandidateGenerator>> = vec![
            Arc::new(AffinityGenerator::new(catalog.clone(), events.clone())),
            Arc::new(TrendingGenerator::new(catalog.clone())),
            Arc::new(ProfileMatchedGenerator::new(
                catalog.clone(),
                events.clone(),
                store.clone(),
            )),
            recency.clone(),
        ];

        let aggregator = Arc::new(RecommendationAggregator::new(
            store.clone(),
            clock.clone(),
            generators,
            recency,
            settings.generator_timeout,
        ));

        let daily_picks = DailyPickService::new(
            store.clone(),
            catalog.clone(),
            aggregator.clone(),
            clock.clone(),
            settings.daily_pick_ttl_secs,
        );

        let fingerprints =
            FingerprintService::new(store.clone(), events, clock, settings.max_retries);

        Self {
            catalog,
            store,
            fingerprints,
            aggregator,
            daily_picks,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn record_event(
        &self,
        user_id: UserId,
        raw: RawEvent,
    ) -> AppResult<(EmotionalEvent, EmotionalFingerprint)> {
        self.fingerprints.record_event(user_id, raw).await
    }

    pub async fn get_fingerprint(&self, user_id: UserId) -> AppResult<EmotionalFingerprint> {
        self.fingerprints.get_fingerprint(user_id).await
    }

    pub async fn update_preferences(
        &self,
        user_id: UserId,
        update: PreferenceUpdate,
    ) -> AppResult<EmotionalFingerprint> {
        self.fingerprints.update_preferences(user_id, update).await
    }

    pub async fn reset_fingerprint(&self, user_id: UserId) -> AppResult<EmotionalFingerprint> {
        self.fingerprints.reset(user_id).await
    }

    /// Stores explicit genre taste, replacing anything learned
    pub async fn set_genre_preferences(
        &self,
        user_id: UserId,
        favorites: Vec<String>,
        disliked: Vec<String>,
    ) -> AppResult<GenrePreferences> {
        let preferences = GenrePreferences {
            favorite_genres: normalize_genres(favorites),
            disliked_genres: normalize_genres(disliked),
            learned: false,
        };
        self.store
            .save_genre_preferences(user_id, &preferences)
            .await?;
        tracing::info!(
            user_id = %user_id,
            favorites = preferences.favorite_genres.len(),
            disliked = preferences.disliked_genres.len(),
            "Genre preferences saved"
        );
        Ok(preferences)
    }

    /// Ranked recommendations; `limit` is capped at `max_recommendations`
    pub async fn get_recommendations(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        if limit == 0 {
            return Err(AppError::InvalidInput(
                "limit must be at least 1".to_string(),
            ));
        }
        let limit = limit.min(self.settings.max_recommendations);
        self.aggregator.aggregate(user_id, limit).await
    }

    pub async fn get_daily_picks(&self, user_id: UserId) -> AppResult<DailyPicks> {
        self.daily_picks.get_daily_picks(user_id).await
    }

    /// Scores one item for one user. An unprofiled item, or one whose profile
    /// cannot be read, scores as an empty profile.
    pub async fn score_compatibility(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> AppResult<CompatibilityReport> {
        if self.catalog.get_item(item_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Item {} not found", item_id)));
        }

        let fingerprint = self.fingerprints.get_fingerprint(user_id).await?;
        let content = match self.catalog.get_emotional_profile(item_id).await {
            Ok(profile) => profile.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    item_id = %item_id,
                    error = %e,
                    "Emotional profile unavailable, scoring as unprofiled"
                );
                ContentEmotionalProfile::default()
            }
        };

        Ok(compatibility::score(&fingerprint, &content))
    }
}

/// Trimmed, lower-cased, empty entries and duplicates removed, order kept
fn normalize_genres(genres: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(genres.len());
    for genre in genres {
        let genre = genre.trim().to_lowercase();
        if !genre.is_empty() && !normalized.contains(&genre) {
            normalized.push(genre);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{InMemoryCatalog, InMemoryEventLog, InMemoryProfileStore};
    use crate::models::{CatalogItem, TrendingEntry};
    use crate::services::clock::ManualClock;
    use chrono::{DateTime, Duration, Utc};

    fn now() -> DateTime<Utc> {
        "2026-10-18T10:00:00Z".parse().unwrap()
    }

    fn item(title: &str, days_old: i64) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(),
            title: title.to_string(),
            author: None,
            genre: Some("fantasy".to_string()),
            tags: vec![],
            published_at: Some(now() - Duration::days(days_old)),
            is_published: true,
        }
    }

    fn engine(catalog: Arc<InMemoryCatalog>) -> PersonalizationEngine {
        PersonalizationEngine::new(
            catalog,
            Arc::new(InMemoryEventLog::new()),
            Arc::new(InMemoryProfileStore::new()),
            Arc::new(ManualClock::new(now())),
            EngineSettings {
                max_recommendations: 3,
                ..EngineSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_zero_limit_is_invalid() {
        let engine = engine(Arc::new(InMemoryCatalog::new()));
        let err = engine
            .get_recommendations(UserId::new(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_limit_is_capped() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let mut ranking = Vec::new();
        for i in 0..6 {
            let item = item(&format!("Hit {}", i), 60);
            ranking.push(TrendingEntry {
                item_id: item.id,
                score: 90.0 - i as f64,
                read_count: 100,
            });
            catalog.insert_item(item).await;
        }
        catalog.set_trending("weekly", ranking).await;

        let engine = engine(catalog);
        let recs = engine.get_recommendations(UserId::new(), 40).await.unwrap();
        assert!(recs.len() <= 3);
        assert!(!recs.is_empty());
    }

    #[tokio::test]
    async fn test_new_user_gets_new_releases() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let fresh = item("First Light", 2);
        catalog.insert_item(fresh.clone()).await;

        let engine = engine(catalog);
        let recs = engine.get_recommendations(UserId::new(), 3).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].item_id, fresh.id);
    }

    #[tokio::test]
    async fn test_compatibility_for_unknown_item_is_not_found() {
        let engine = engine(Arc::new(InMemoryCatalog::new()));
        let err = engine
            .score_compatibility(UserId::new(), ItemId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unprofiled_item_scores_base() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let plain = item("Plain", 100);
        catalog.insert_item(plain.clone()).await;

        let engine = engine(catalog);
        let report = engine
            .score_compatibility(UserId::new(), plain.id)
            .await
            .unwrap();
        assert_eq!(report.score, 50);
    }

    #[tokio::test]
    async fn test_profile_lookup_failure_scores_base() {
        let plain = item("Plain", 100);
        let known = plain.clone();
        let mut catalog = crate::services::ports::MockContentCatalog::new();
        catalog
            .expect_get_item()
            .returning(move |_| Ok(Some(known.clone())));
        catalog
            .expect_get_emotional_profile()
            .returning(|_| Err(AppError::Upstream("profile service timeout".to_string())));

        let engine = PersonalizationEngine::new(
            Arc::new(catalog),
            Arc::new(InMemoryEventLog::new()),
            Arc::new(InMemoryProfileStore::new()),
            Arc::new(ManualClock::new(now())),
            EngineSettings::default(),
        );
        let report = engine
            .score_compatibility(UserId::new(), plain.id)
            .await
            .unwrap();
        assert_eq!(report.score, 50);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn test_genres_are_normalized() {
        let genres = normalize_genres(vec![
            " Fantasy ".to_string(),
            "fantasy".to_string(),
            "".to_string(),
            "Sci Fi".to_string(),
        ]);
        assert_eq!(genres, vec!["fantasy", "sci fi"]);
    }
}
