use chrono::{Days, NaiveDate};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        DailyPick, DailyPickEntry, DailyPickRecord, DailyPicks, RecommendationSource, UserId,
    },
    services::{
        clock::Clock,
        ports::{ContentCatalog, ProfileStore},
        recommendations::RecommendationAggregator,
    },
};

/// Candidates requested from the aggregator when a day's slate is built
const POOL_SIZE: usize = 10;

/// Items kept in a slate
const PICKS_PER_DAY: usize = 3;

const SECONDS_PER_DAY: u64 = 86_400;

/// Today's three picks per user, chosen once and then replayed all day.
///
/// Only the selection is frozen. Titles and other metadata are read from the
/// catalog on every call.
pub struct DailyPickService {
    store: Arc<dyn ProfileStore>,
    catalog: Arc<dyn ContentCatalog>,
    aggregator: Arc<RecommendationAggregator>,
    clock: Arc<dyn Clock>,
    retention_days: u64,
}

impl DailyPickService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        catalog: Arc<dyn ContentCatalog>,
        aggregator: Arc<RecommendationAggregator>,
        clock: Arc<dyn Clock>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            catalog,
            aggregator,
            clock,
            retention_days: ttl_secs.div_ceil(SECONDS_PER_DAY).max(1),
        }
    }

    pub async fn get_daily_picks(&self, user_id: UserId) -> AppResult<DailyPicks> {
        let date = self.clock.today();

        if let Some(record) = self.store.get_daily_picks(user_id, date).await? {
            tracing::debug!(user_id = %user_id, date = %date, "Replaying stored daily picks");
            return self.hydrate(record).await;
        }

        let pool = self.aggregator.aggregate(user_id, POOL_SIZE).await?;
        if pool.is_empty() {
            // nothing worth freezing; the next call tries again
            return Ok(DailyPicks {
                date,
                items: Vec::new(),
            });
        }

        let record = DailyPickRecord {
            user_id,
            date,
            entries: pool
                .into_iter()
                .take(PICKS_PER_DAY)
                .map(|rec| DailyPickEntry {
                    item_id: rec.item_id,
                    reason: rec.reason,
                    score: rec.score,
                })
                .collect(),
            created_at: self.clock.now(),
        };

        let stored = self.store.insert_daily_picks_if_absent(&record).await?;
        if stored.entries != record.entries {
            tracing::debug!(
                user_id = %user_id,
                date = %date,
                "Lost daily-pick race, using stored slate"
            );
        } else {
            tracing::info!(
                user_id = %user_id,
                date = %date,
                picks = stored.entries.len(),
                "Daily picks selected"
            );
        }

        self.prune(user_id, date).await;
        self.hydrate(stored).await
    }

    /// Picks whose item cannot be read are left out of the response, not the slate
    async fn hydrate(&self, record: DailyPickRecord) -> AppResult<DailyPicks> {
        let mut items = Vec::with_capacity(record.entries.len());
        for entry in record.entries {
            match self.catalog.get_item(entry.item_id).await {
                Ok(Some(item)) => items.push(DailyPick {
                    item,
                    reason: entry.reason,
                    score: entry.score,
                    source: RecommendationSource::DailyPick,
                }),
                Ok(None) => {
                    tracing::warn!(
                        item_id = %entry.item_id,
                        "Daily pick no longer in catalog, skipped"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        item_id = %entry.item_id,
                        error = %e,
                        "Daily pick lookup failed, skipped"
                    );
                }
            }
        }

        Ok(DailyPicks {
            date: record.date,
            items,
        })
    }

    async fn prune(&self, user_id: UserId, today: NaiveDate) {
        let Some(cutoff) = today.checked_sub_days(Days::new(self.retention_days)) else {
            return;
        };
        match self.store.delete_daily_picks_before(user_id, cutoff).await {
            Ok(0) => {}
            Ok(removed) => {
                tracing::debug!(user_id = %user_id, removed, "Expired daily picks removed")
            }
            Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Failed to prune daily picks"),
        }
    }
}
