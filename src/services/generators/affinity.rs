use async_trait::async_trait;
use std::collections::{hash_map::Entry, HashMap, HashSet};
use std::sync::Arc;

use super::{completed_items, CandidateGenerator, GenerationContext};
use crate::{
    error::AppResult,
    models::{Candidate, ItemId, RecommendationSource},
    services::ports::{ContentCatalog, EventLog},
};

/// How many recent completions seed the neighbour lookup
const SEED_COUNT: usize = 5;

/// "Because you read X": neighbours of the user's most recent completions
pub struct AffinityGenerator {
    catalog: Arc<dyn ContentCatalog>,
    events: Arc<dyn EventLog>,
}

impl AffinityGenerator {
    pub fn new(catalog: Arc<dyn ContentCatalog>, events: Arc<dyn EventLog>) -> Self {
        Self { catalog, events }
    }

    async fn origin_title(&self, origin: ItemId) -> String {
        match self.catalog.get_item(origin).await {
            Ok(Some(item)) => item.title,
            Ok(None) => "a story you finished".to_string(),
            Err(e) => {
                tracing::warn!(item_id = %origin, error = %e, "Failed to load origin title");
                "a story you finished".to_string()
            }
        }
    }
}

#[async_trait]
impl CandidateGenerator for AffinityGenerator {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::Affinity
    }

    async fn generate(&self, ctx: &GenerationContext, limit: usize) -> AppResult<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let completed = completed_items(self.events.as_ref(), ctx.user_id).await?;
        if completed.is_empty() {
            return Ok(Vec::new());
        }
        let already_read: HashSet<ItemId> = completed.iter().copied().collect();

        // item -> (similarity, origin), best similarity kept, first origin on ties
        let mut best: HashMap<ItemId, (f64, ItemId)> = HashMap::new();
        let mut order: Vec<ItemId> = Vec::new();

        for origin in completed.iter().take(SEED_COUNT) {
            let neighbours = match self.catalog.similar_items(*origin, limit).await {
                Ok(neighbours) => neighbours,
                Err(e) => {
                    tracing::warn!(item_id = %origin, error = %e, "Similar-items lookup failed");
                    continue;
                }
            };

            for neighbour in neighbours {
                if already_read.contains(&neighbour.item_id) {
                    continue;
                }
                match best.entry(neighbour.item_id) {
                    Entry::Occupied(mut slot) => {
                        if neighbour.similarity > slot.get().0 {
                            slot.insert((neighbour.similarity, *origin));
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((neighbour.similarity, *origin));
                        order.push(neighbour.item_id);
                    }
                }
            }
        }

        let mut ranked: Vec<(ItemId, f64, ItemId)> = order
            .into_iter()
            .filter_map(|item_id| {
                best.get(&item_id)
                    .map(|(similarity, origin)| (item_id, *similarity, *origin))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);

        let mut titles: HashMap<ItemId, String> = HashMap::new();
        let mut candidates = Vec::with_capacity(ranked.len());
        for (item_id, similarity, origin) in ranked {
            if !titles.contains_key(&origin) {
                let title = self.origin_title(origin).await;
                titles.insert(origin, title);
            }
            let title = titles.get(&origin).map(String::as_str).unwrap_or_default();
            candidates.push(Candidate::new(
                item_id,
                similarity,
                format!("Because you read {}", title),
            ));
        }

        tracing::debug!(
            user_id = %ctx.user_id,
            seeds = completed.len().min(SEED_COUNT),
            candidates = candidates.len(),
            "Affinity candidates generated"
        );

        Ok(candidates)
    }
}
