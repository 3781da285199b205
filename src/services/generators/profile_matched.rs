use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::{completed_items, sort_by_score, touched_items, CandidateGenerator, GenerationContext};
use crate::{
    error::AppResult,
    models::{Candidate, CatalogItem, GenrePreferences, RecommendationSource, UserId},
    services::{
        compatibility,
        ports::{ContentCatalog, EventLog, ProfileStore},
    },
};

/// How many learned genres are kept
const TOP_GENRES: usize = 5;

/// Score given to an unprofiled item in a favourite genre
const UNPROFILED_SCORE: f64 = 0.5;

/// Published items in the user's favourite genres, ranked by emotional fit
pub struct ProfileMatchedGenerator {
    catalog: Arc<dyn ContentCatalog>,
    events: Arc<dyn EventLog>,
    store: Arc<dyn ProfileStore>,
}

impl ProfileMatchedGenerator {
    pub fn new(
        catalog: Arc<dyn ContentCatalog>,
        events: Arc<dyn EventLog>,
        store: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            catalog,
            events,
            store,
        }
    }

    /// Stored preferences, or preferences learned from completions and saved.
    ///
    /// Learning only fills in favourites: stored dislikes are carried over and
    /// never learned as favourites.
    async fn genre_preferences(&self, user_id: UserId) -> AppResult<GenrePreferences> {
        let stored = self.store.get_genre_preferences(user_id).await?.unwrap_or_default();
        if !stored.favorite_genres.is_empty() {
            return Ok(stored);
        }

        let learned = self.learn_genres(user_id, &stored).await?;
        if learned.is_empty() {
            return Ok(stored);
        }

        let prefs = GenrePreferences {
            favorite_genres: learned,
            disliked_genres: stored.disliked_genres,
            learned: true,
        };
        self.store.save_genre_preferences(user_id, &prefs).await?;
        tracing::debug!(
            user_id = %user_id,
            genres = ?prefs.favorite_genres,
            "Learned genre preferences from completions"
        );
        Ok(prefs)
    }

    /// Most frequent genres among completed items; ties go to the more recent read
    async fn learn_genres(
        &self,
        user_id: UserId,
        stored: &GenrePreferences,
    ) -> AppResult<Vec<String>> {
        let completed = completed_items(self.events.as_ref(), user_id).await?;

        // genre -> (count, rank of most recent completion)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for (rank, item_id) in completed.iter().enumerate() {
            let genre = match self.catalog.get_item(*item_id).await? {
                Some(CatalogItem {
                    genre: Some(genre), ..
                }) => genre.trim().to_lowercase(),
                _ => continue,
            };
            if genre.is_empty() || stored.dislikes(&genre) {
                continue;
            }
            let entry = counts.entry(genre).or_insert((0, rank));
            entry.0 += 1;
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        Ok(ranked
            .into_iter()
            .take(TOP_GENRES)
            .map(|(genre, _)| genre)
            .collect())
    }
}

#[async_trait]
impl CandidateGenerator for ProfileMatchedGenerator {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::ProfileMatched
    }

    async fn generate(&self, ctx: &GenerationContext, limit: usize) -> AppResult<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let prefs = self.genre_preferences(ctx.user_id).await?;
        let genres: Vec<String> = prefs
            .favorite_genres
            .iter()
            .filter(|genre| !prefs.dislikes(genre))
            .cloned()
            .collect();
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        let touched = touched_items(self.events.as_ref(), ctx.user_id).await?;
        let items = self
            .catalog
            .published_in_genres(&genres, limit + touched.len())
            .await?;

        let mut candidates = Vec::new();
        for item in items {
            if !item.is_published || touched.contains(&item.id) {
                continue;
            }
            let genre = item.genre.clone().unwrap_or_default();
            if prefs.dislikes(&genre) {
                continue;
            }

            let candidate = match self.catalog.get_emotional_profile(item.id).await? {
                Some(content) => {
                    let report = compatibility::score(&ctx.fingerprint, &content);
                    let reason = report
                        .reasons
                        .first()
                        .cloned()
                        .unwrap_or_else(|| format!("Matches your interest in {}", genre));
                    Candidate::new(item.id, f64::from(report.score) / 100.0, reason)
                }
                None => Candidate::new(
                    item.id,
                    UNPROFILED_SCORE,
                    format!("Matches your interest in {}", genre),
                ),
            };
            candidates.push(candidate);
        }

        sort_by_score(&mut candidates);
        candidates.truncate(limit);
        Ok(candidates)
    }
}
