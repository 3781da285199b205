use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::AppResult,
    models::{Candidate, Recommendation, RecommendationSource, UserId},
    services::{
        clock::Clock,
        generators::{CandidateGenerator, GenerationContext},
        ports::ProfileStore,
    },
};

/// Merges the output of every candidate generator into one ranked list
///
/// Generators run concurrently, each bounded by a timeout. A generator that fails,
/// panics or times out contributes nothing; the others still produce a result.
pub struct RecommendationAggregator {
    store: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
    /// Highest priority first; on duplicate items the earlier generator wins
    generators: Vec<Arc<dyn CandidateGenerator>>,
    /// Asked for a full page when everything else came back empty
    fallback: Arc<dyn CandidateGenerator>,
    timeout: Duration,
}

impl RecommendationAggregator {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        clock: Arc<dyn Clock>,
        generators: Vec<Arc<dyn CandidateGenerator>>,
        fallback: Arc<dyn CandidateGenerator>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            generators,
            fallback,
            timeout,
        }
    }

    /// Up to `limit` recommendations, best first, no item twice
    pub async fn aggregate(&self, user_id: UserId, limit: usize) -> AppResult<Vec<Recommendation>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let fingerprint = self
            .store
            .get_or_create_fingerprint(user_id, self.clock.now())
            .await?;
        let ctx = GenerationContext {
            user_id,
            fingerprint,
        };

        let per_generator = limit.div_ceil(self.generators.len().max(1));
        tracing::info!(
            user_id = %user_id,
            limit,
            per_generator,
            "Aggregating recommendations"
        );

        let mut tasks = Vec::with_capacity(self.generators.len());
        for generator in &self.generators {
            let generator = generator.clone();
            let ctx = ctx.clone();
            let timeout = self.timeout;
            let source = generator.source();
            let task = tokio::spawn(async move {
                tokio::time::timeout(timeout, generator.generate(&ctx, per_generator)).await
            });
            tasks.push((source, task));
        }

        let mut batches = Vec::with_capacity(tasks.len());
        for (source, task) in tasks {
            let candidates = match task.await {
                Ok(Ok(Ok(candidates))) => candidates,
                Ok(Ok(Err(e))) => {
                    tracing::warn!(source = %source, error = %e, "Generator failed");
                    Vec::new()
                }
                Ok(Err(_)) => {
                    tracing::warn!(
                        source = %source,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Generator timed out"
                    );
                    Vec::new()
                }
                Err(e) => {
                    tracing::error!(source = %source, error = %e, "Generator task aborted");
                    Vec::new()
                }
            };
            batches.push((source, candidates));
        }

        let mut merged = merge_candidates(batches, limit);

        if merged.is_empty() {
            tracing::info!(user_id = %user_id, "No candidates, falling back to new releases");
            let source = self.fallback.source();
            match tokio::time::timeout(self.timeout, self.fallback.generate(&ctx, limit)).await {
                Ok(Ok(candidates)) => merged = merge_candidates(vec![(source, candidates)], limit),
                Ok(Err(e)) => tracing::warn!(error = %e, "Fallback generator failed"),
                Err(_) => tracing::warn!("Fallback generator timed out"),
            }
        }

        tracing::info!(
            user_id = %user_id,
            returned = merged.len(),
            "Recommendations aggregated"
        );

        Ok(merged)
    }
}

/// Deduplicates, ranks and truncates generator batches.
///
/// Batches arrive in priority order. The first occurrence of an item wins; later
/// duplicates are dropped even when they carry a higher score. The final sort is
/// stable, so equal scores keep their priority order.
pub fn merge_candidates(
    batches: Vec<(RecommendationSource, Vec<Candidate>)>,
    limit: usize,
) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    let mut kept: Vec<(Candidate, RecommendationSource)> = Vec::new();

    for (source, candidates) in batches {
        for candidate in candidates {
            if seen.insert(candidate.item_id) {
                kept.push((candidate, source));
            }
        }
    }

    kept.sort_by(|a, b| {
        b.0.score
            .partial_cmp(&a.0.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    kept.into_iter()
        .take(limit)
        .map(|(candidate, source)| Recommendation {
            item_id: candidate.item_id,
            reason: candidate.reason,
            score: candidate.score,
            source,
        })
        .collect()
}
