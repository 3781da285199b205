use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{content::CatalogItem, ItemId, UserId};

/// Which strategy produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Affinity,
    Trending,
    ProfileMatched,
    Recency,
    DailyPick,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationSource::Affinity => "affinity",
            RecommendationSource::Trending => "trending",
            RecommendationSource::ProfileMatched => "profile_matched",
            RecommendationSource::Recency => "recency",
            RecommendationSource::DailyPick => "daily_pick",
        }
    }
}

impl Display for RecommendationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of a single candidate generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub item_id: ItemId,
    /// Score in [0, 1]
    pub score: f64,
    pub reason: String,
}

impl Candidate {
    pub fn new(item_id: ItemId, score: f64, reason: impl Into<String>) -> Self {
        Self {
            item_id,
            score: score.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }
}

/// A ranked, explained recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub reason: String,
    pub score: f64,
    pub source: RecommendationSource,
}

/// Result of scoring one fingerprint against one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub score: u8,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
}

/// Persisted slot of a daily slate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPickEntry {
    pub item_id: ItemId,
    pub reason: String,
    pub score: f64,
}

/// The stored slate for one `(user, date)` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPickRecord {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub entries: Vec<DailyPickEntry>,
    pub created_at: DateTime<Utc>,
}

/// One daily pick with freshly read catalog metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPick {
    pub item: CatalogItem,
    pub reason: String,
    pub score: f64,
    pub source: RecommendationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPicks {
    pub date: NaiveDate,
    pub items: Vec<DailyPick>,
}
