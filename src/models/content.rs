use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{fingerprint::TensionLevel, ItemId};

/// Catalog metadata for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_published: bool,
}

/// One point of an item's emotional arc
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcPoint {
    /// Position within the item, 0-100
    pub position: u8,
    pub emotion: String,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakMoment {
    #[serde(default)]
    pub position: Option<u8>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Emotional shape of an item; every field may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentEmotionalProfile {
    #[serde(default)]
    pub emotional_arc: Vec<ArcPoint>,
    #[serde(default)]
    pub peak_moments: Vec<PeakMoment>,
    #[serde(default)]
    pub tension_level: Option<TensionLevel>,
}

/// Catalog-declared neighbour of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItem {
    pub item_id: ItemId,
    /// Precomputed similarity in [0, 1]
    pub similarity: f64,
}

/// Entry of a trending ranking for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub item_id: ItemId,
    /// Raw trending score, 0-100
    pub score: f64,
    pub read_count: u64,
}

/// Explicit or learned genre taste of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenrePreferences {
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub disliked_genres: Vec<String>,
    /// True when derived from reading history rather than set by the user
    #[serde(default)]
    pub learned: bool,
}

impl GenrePreferences {
    pub fn dislikes(&self, genre: &str) -> bool {
        self.disliked_genres
            .iter()
            .any(|disliked| disliked.eq_ignore_ascii_case(genre))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_profile_deserializes() {
        let profile: ContentEmotionalProfile = serde_json::from_str("{}").unwrap();
        assert!(profile.emotional_arc.is_empty());
        assert!(profile.peak_moments.is_empty());
        assert_eq!(profile.tension_level, None);
    }

    #[test]
    fn test_dislikes_is_case_insensitive() {
        let prefs = GenrePreferences {
            favorite_genres: vec![],
            disliked_genres: vec!["Horror".to_string()],
            learned: false,
        };
        assert!(prefs.dislikes("horror"));
        assert!(!prefs.dislikes("fantasy"));
    }
}
