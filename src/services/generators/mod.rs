/// Candidate generators
///
/// Four independent strategies, each producing a capped list of scored candidates
/// for one user. None of them reads another's output; the aggregator fans out to
/// all of them and merges the results.
use async_trait::async_trait;
use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{Candidate, EmotionalFingerprint, EventQuery, EventType, ItemId, RecommendationSource, UserId},
    services::ports::EventLog,
};

pub mod affinity;
pub mod profile_matched;
pub mod recency;
pub mod trending;

pub use affinity::AffinityGenerator;
pub use profile_matched::ProfileMatchedGenerator;
pub use recency::RecencyGenerator;
pub use trending::TrendingGenerator;

/// What every generator gets to see about the user
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub user_id: UserId,
    pub fingerprint: EmotionalFingerprint,
}

/// A single recommendation strategy
///
/// Implementations return an empty list when upstream data is missing; errors are
/// reserved for collaborator failures, which the aggregator turns into an empty
/// contribution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    fn source(&self) -> RecommendationSource;

    async fn generate(&self, ctx: &GenerationContext, limit: usize) -> AppResult<Vec<Candidate>>;
}

/// Distinct completed items, most recently completed first
pub(crate) async fn completed_items(events: &dyn EventLog, user_id: UserId) -> AppResult<Vec<ItemId>> {
    let completions = events
        .query(user_id, EventQuery::of_type(EventType::Complete))
        .await?;

    let mut seen = HashSet::new();
    Ok(completions
        .into_iter()
        .map(|event| event.item_id)
        .filter(|item_id| seen.insert(*item_id))
        .collect())
}

/// Every item the user has produced any event for
pub(crate) async fn touched_items(events: &dyn EventLog, user_id: UserId) -> AppResult<HashSet<ItemId>> {
    let history = events.query(user_id, EventQuery::default()).await?;
    Ok(history.into_iter().map(|event| event.item_id).collect())
}

/// Orders candidates by score, highest first, keeping input order among equals
pub(crate) fn sort_by_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
