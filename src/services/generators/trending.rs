use async_trait::async_trait;
use std::sync::Arc;

use super::{CandidateGenerator, GenerationContext};
use crate::{
    error::AppResult,
    models::{Candidate, RecommendationSource},
    services::ports::ContentCatalog,
};

/// Ranking period the generator reads
pub const TRENDING_PERIOD: &str = "weekly";

/// Raw trending scores are on a 0-100 scale
const RAW_SCORE_SCALE: f64 = 100.0;

/// Population-level signal: what everyone is reading this week
pub struct TrendingGenerator {
    catalog: Arc<dyn ContentCatalog>,
}

impl TrendingGenerator {
    pub fn new(catalog: Arc<dyn ContentCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CandidateGenerator for TrendingGenerator {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::Trending
    }

    async fn generate(&self, _ctx: &GenerationContext, limit: usize) -> AppResult<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let ranking = self.catalog.trending(TRENDING_PERIOD, limit).await?;

        Ok(ranking
            .into_iter()
            .take(limit)
            .map(|entry| {
                Candidate::new(
                    entry.item_id,
                    entry.score / RAW_SCORE_SCALE,
                    format!("Trending this week with {} reads", entry.read_count),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmotionalFingerprint, ItemId, TrendingEntry, UserId};
    use crate::services::ports::MockContentCatalog;
    use chrono::Utc;

    fn context() -> GenerationContext {
        let user_id = UserId::new();
        GenerationContext {
            user_id,
            fingerprint: EmotionalFingerprint::new(user_id, Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_normalizes_scores_and_reports_reads() {
        let hot = ItemId::new();
        let warm = ItemId::new();
        let mut catalog = MockContentCatalog::new();
        catalog
            .expect_trending()
            .withf(|period, limit| period == "weekly" && *limit == 2)
            .returning(move |_, _| {
                Ok(vec![
                    TrendingEntry {
                        item_id: hot,
                        score: 87.0,
                        read_count: 1_204,
                    },
                    TrendingEntry {
                        item_id: warm,
                        score: 140.0,
                        read_count: 3,
                    },
                ])
            });

        let generator = TrendingGenerator::new(Arc::new(catalog));
        let candidates = generator.generate(&context(), 2).await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert!((candidates[0].score - 0.87).abs() < 1e-9);
        assert_eq!(candidates[0].reason, "Trending this week with 1204 reads");
        // scores above the scale are clamped into [0, 1]
        assert_eq!(candidates[1].score, 1.0);
    }

    #[tokio::test]
    async fn test_empty_ranking_is_empty() {
        let mut catalog = MockContentCatalog::new();
        catalog.expect_trending().returning(|_, _| Ok(vec![]));

        let generator = TrendingGenerator::new(Arc::new(catalog));
        assert!(generator.generate(&context(), 5).await.unwrap().is_empty());
    }
}
