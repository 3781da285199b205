use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use super::{fingerprint::EmotionChannel, ItemId, UserId};

/// Kind of behavioral signal a reader produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Pause,
    SpeedUp,
    SlowDown,
    Reread,
    Skip,
    ChapterEnd,
    Abandon,
    /// The reader finished the whole item
    Complete,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Pause => "pause",
            EventType::SpeedUp => "speed_up",
            EventType::SlowDown => "slow_down",
            EventType::Reread => "reread",
            EventType::Skip => "skip",
            EventType::ChapterEnd => "chapter_end",
            EventType::Abandon => "abandon",
            EventType::Complete => "complete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let event_type = match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "pause" => EventType::Pause,
            "speed_up" | "speedup" => EventType::SpeedUp,
            "slow_down" | "slowdown" => EventType::SlowDown,
            "reread" | "re_read" => EventType::Reread,
            "skip" => EventType::Skip,
            "chapter_end" => EventType::ChapterEnd,
            "abandon" => EventType::Abandon,
            "complete" | "completion" => EventType::Complete,
            _ => return None,
        };
        Some(event_type)
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emotional context attached to an event
///
/// Known channel names resolve to `Channel`; anything else is kept verbatim
/// (normalized) as `Other` and routed to the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum EmotionTag {
    Channel(EmotionChannel),
    Other(String),
}

impl EmotionTag {
    pub fn as_str(&self) -> &str {
        match self {
            EmotionTag::Channel(channel) => channel.as_str(),
            EmotionTag::Other(tag) => tag.as_str(),
        }
    }
}

impl Display for EmotionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event payload as submitted by a client, before normalization
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawEvent {
    pub event_type: String,
    #[serde(default)]
    pub emotional_context: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub item_id: ItemId,
    #[serde(default)]
    pub chapter: Option<u32>,
}

/// Canonical behavioral event, immutable once appended to the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalEvent {
    pub id: Uuid,
    pub user_id: UserId,
    pub event_type: EventType,
    pub context: Option<EmotionTag>,
    pub duration_seconds: Option<f64>,
    pub occurred_at: DateTime<Utc>,
    pub item_id: ItemId,
    pub chapter: Option<u32>,
}

/// Filter for reading a user's event history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    /// Empty means every type
    pub event_types: Vec<EventType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn of_type(event_type: EventType) -> Self {
        Self {
            event_types: vec![event_type],
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an event passes the type and time-window filters
    pub fn matches(&self, event: &EmotionalEvent) -> bool {
        let type_ok = self.event_types.is_empty() || self.event_types.contains(&event.event_type);
        let since_ok = self.since.map_or(true, |since| event.occurred_at >= since);
        let until_ok = self.until.map_or(true, |until| event.occurred_at < until);
        type_ok && since_ok && until_ok
    }
}
