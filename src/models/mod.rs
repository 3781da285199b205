use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

pub mod content;
pub mod event;
pub mod fingerprint;
pub mod recommendation;

pub use content::{
    ArcPoint, CatalogItem, ContentEmotionalProfile, GenrePreferences, PeakMoment, SimilarItem,
    TrendingEntry,
};
pub use event::{EmotionTag, EmotionalEvent, EventQuery, EventType, RawEvent};
pub use fingerprint::{
    ComfortLevel, DaySkew, EmotionChannel, EmotionalFingerprint, EmotionalProfile,
    EngagementSignals, JourneyArchetype, JumpScareReaction, PacePreference, PacingProfile,
    PreferenceUpdate, RereadFrequency, SensitivityProfile, TemporalPatterns, TensionLevel,
    TimeOfDay,
};
pub use recommendation::{
    Candidate, CompatibilityReport, DailyPick, DailyPickEntry, DailyPickRecord, DailyPicks,
    Recommendation, RecommendationSource,
};

/// Identifier of a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

/// Identifier of a catalog item (book, story, series)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
