use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

use super::{CandidateGenerator, GenerationContext};
use crate::{
    error::AppResult,
    models::{Candidate, RecommendationSource},
    services::{clock::Clock, ports::ContentCatalog},
};

/// Trailing window an item must have been published in
const RECENCY_WINDOW_DAYS: i64 = 7;

/// Every recent item gets the same score; ordering comes from publish date
const RECENCY_SCORE: f64 = 0.6;

/// New releases from the trailing week, newest first
pub struct RecencyGenerator {
    catalog: Arc<dyn ContentCatalog>,
    clock: Arc<dyn Clock>,
}

impl RecencyGenerator {
    pub fn new(catalog: Arc<dyn ContentCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }
}

#[async_trait]
impl CandidateGenerator for RecencyGenerator {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::Recency
    }

    async fn generate(&self, _ctx: &GenerationContext, limit: usize) -> AppResult<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let since = now - Duration::days(RECENCY_WINDOW_DAYS);
        let mut items = self.catalog.published_since(since, limit).await?;

        items.retain(|item| {
            item.is_published && item.published_at.is_some_and(|at| at >= since && at <= now)
        });
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items.truncate(limit);

        Ok(items
            .into_iter()
            .map(|item| {
                Candidate::new(
                    item.id,
                    RECENCY_SCORE,
                    format!("New this week: {}", item.title),
                )
            })
            .collect())
    }
}
