use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use super::UserId;

/// Upper bound of every 0-100 scalar in a fingerprint
pub const CHANNEL_MAX: u8 = 100;

/// Value every emotional channel starts at
pub const CHANNEL_DEFAULT: u8 = 50;

/// One of the eight named emotional channels of a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionChannel {
    Joy,
    Sadness,
    Excitement,
    Fear,
    Romance,
    Nostalgia,
    Wonder,
    Tension,
}

impl EmotionChannel {
    pub const ALL: [EmotionChannel; 8] = [
        EmotionChannel::Joy,
        EmotionChannel::Sadness,
        EmotionChannel::Excitement,
        EmotionChannel::Fear,
        EmotionChannel::Romance,
        EmotionChannel::Nostalgia,
        EmotionChannel::Wonder,
        EmotionChannel::Tension,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionChannel::Joy => "joy",
            EmotionChannel::Sadness => "sadness",
            EmotionChannel::Excitement => "excitement",
            EmotionChannel::Fear => "fear",
            EmotionChannel::Romance => "romance",
            EmotionChannel::Nostalgia => "nostalgia",
            EmotionChannel::Wonder => "wonder",
            EmotionChannel::Tension => "tension",
        }
    }

    /// Resolves an already-normalized tag (lowercase, `_` separated) to a channel.
    ///
    /// Accepts the channel names themselves plus a handful of common synonyms that
    /// readers and content editors use interchangeably.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let channel = match tag {
            "joy" | "happy" | "happiness" | "joyful" => EmotionChannel::Joy,
            "sadness" | "sad" | "grief" | "melancholy" => EmotionChannel::Sadness,
            "excitement" | "excited" | "thrill" | "thrilling" => EmotionChannel::Excitement,
            "fear" | "scary" | "scared" | "dread" | "horror" => EmotionChannel::Fear,
            "romance" | "romantic" | "love" => EmotionChannel::Romance,
            "nostalgia" | "nostalgic" => EmotionChannel::Nostalgia,
            "wonder" | "awe" | "curiosity" => EmotionChannel::Wonder,
            "tension" | "tense" | "suspense" => EmotionChannel::Tension,
            _ => return None,
        };
        Some(channel)
    }
}

impl Display for EmotionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The eight emotional channels, each held in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionalProfile {
    pub joy: u8,
    pub sadness: u8,
    pub excitement: u8,
    pub fear: u8,
    pub romance: u8,
    pub nostalgia: u8,
    pub wonder: u8,
    pub tension: u8,
}

impl Default for EmotionalProfile {
    fn default() -> Self {
        Self {
            joy: CHANNEL_DEFAULT,
            sadness: CHANNEL_DEFAULT,
            excitement: CHANNEL_DEFAULT,
            fear: CHANNEL_DEFAULT,
            romance: CHANNEL_DEFAULT,
            nostalgia: CHANNEL_DEFAULT,
            wonder: CHANNEL_DEFAULT,
            tension: CHANNEL_DEFAULT,
        }
    }
}

impl EmotionalProfile {
    pub fn get(&self, channel: EmotionChannel) -> u8 {
        match channel {
            EmotionChannel::Joy => self.joy,
            EmotionChannel::Sadness => self.sadness,
            EmotionChannel::Excitement => self.excitement,
            EmotionChannel::Fear => self.fear,
            EmotionChannel::Romance => self.romance,
            EmotionChannel::Nostalgia => self.nostalgia,
            EmotionChannel::Wonder => self.wonder,
            EmotionChannel::Tension => self.tension,
        }
    }

    fn slot(&mut self, channel: EmotionChannel) -> &mut u8 {
        match channel {
            EmotionChannel::Joy => &mut self.joy,
            EmotionChannel::Sadness => &mut self.sadness,
            EmotionChannel::Excitement => &mut self.excitement,
            EmotionChannel::Fear => &mut self.fear,
            EmotionChannel::Romance => &mut self.romance,
            EmotionChannel::Nostalgia => &mut self.nostalgia,
            EmotionChannel::Wonder => &mut self.wonder,
            EmotionChannel::Tension => &mut self.tension,
        }
    }

    /// Sets a channel, clamping into [0, 100]
    pub fn set(&mut self, channel: EmotionChannel, value: i32) {
        *self.slot(channel) = clamp_scalar(value);
    }

    /// Moves a channel by `delta`, clamping into [0, 100]
    pub fn adjust(&mut self, channel: EmotionChannel, delta: i32) {
        let current = i32::from(self.get(channel));
        self.set(channel, current + delta);
    }

    /// Channel value as a float, for weighted scoring
    pub fn level(&self, channel: EmotionChannel) -> f64 {
        f64::from(self.get(channel))
    }
}

/// Clamps an arbitrary integer into a 0-100 scalar
pub fn clamp_scalar(value: i32) -> u8 {
    value.clamp(0, i32::from(CHANNEL_MAX)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensionLevel {
    Low,
    Medium,
    High,
}

impl TensionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TensionLevel::Low => "low",
            TensionLevel::Medium => "medium",
            TensionLevel::High => "high",
        }
    }

    /// True for the low/high pairing in either direction
    pub fn is_opposite_extreme(&self, other: TensionLevel) -> bool {
        matches!(
            (self, other),
            (TensionLevel::Low, TensionLevel::High) | (TensionLevel::High, TensionLevel::Low)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacePreference {
    SlowBurn,
    Balanced,
    FastPaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingProfile {
    pub preferred_tension_level: TensionLevel,
    pub tension_recovery_rate: u8,
    pub cliffhanger_tolerance: u8,
    pub action_pace_pref: PacePreference,
}

impl Default for PacingProfile {
    fn default() -> Self {
        Self {
            preferred_tension_level: TensionLevel::Medium,
            tension_recovery_rate: CHANNEL_DEFAULT,
            cliffhanger_tolerance: CHANNEL_DEFAULT,
            action_pace_pref: PacePreference::Balanced,
        }
    }
}

/// Ordinal comfort scale: none < mild < moderate < explicit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComfortLevel {
    None,
    Mild,
    Moderate,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpScareReaction {
    Enjoys,
    Neutral,
    Avoids,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityProfile {
    pub violence_threshold: ComfortLevel,
    pub romance_comfort_level: ComfortLevel,
    pub dark_themes_tolerance: u8,
    pub jump_scare_reaction: JumpScareReaction,
}

impl Default for SensitivityProfile {
    fn default() -> Self {
        Self {
            violence_threshold: ComfortLevel::Moderate,
            romance_comfort_level: ComfortLevel::Moderate,
            dark_themes_tolerance: CHANNEL_DEFAULT,
            jump_scare_reaction: JumpScareReaction::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RereadFrequency {
    Rarely,
    Occasionally,
    Frequently,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSignals {
    /// Rolling reading-speed index, 1.0 is the reader's baseline
    pub avg_reading_speed: f64,
    pub reread_frequency: RereadFrequency,
    pub reread_count: u64,
    /// Most recent last, at most 10
    pub abandonment_triggers: Vec<String>,
    /// Most recent last, at most 10
    pub completion_motivators: Vec<String>,
}

impl Default for EngagementSignals {
    fn default() -> Self {
        Self {
            avg_reading_speed: 1.0,
            reread_frequency: RereadFrequency::Rarely,
            reread_count: 0,
            abandonment_triggers: Vec::new(),
            completion_motivators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        match at.hour() {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaySkew {
    Weekday,
    Weekend,
    Even,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalPatterns {
    pub preferred_reading_times: BTreeSet<TimeOfDay>,
    pub time_of_day_counts: BTreeMap<TimeOfDay, u64>,
    /// Rolling session length in minutes, keyed by emotional-context tag
    pub session_minutes_by_mood: BTreeMap<String, f64>,
    pub weekday_events: u64,
    pub weekend_events: u64,
    pub day_skew: DaySkew,
}

impl Default for TemporalPatterns {
    fn default() -> Self {
        Self {
            preferred_reading_times: BTreeSet::new(),
            time_of_day_counts: BTreeMap::new(),
            session_minutes_by_mood: BTreeMap::new(),
            weekday_events: 0,
            weekend_events: 0,
            day_skew: DaySkew::Even,
        }
    }
}

/// Dominant narrative-journey preference derived from a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyArchetype {
    HeroTriumph,
    Bittersweet,
    PureEscapism,
    EmotionalCatharsis,
    ThrillerRide,
    SlowDiscovery,
    Balanced,
}

impl JourneyArchetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            JourneyArchetype::HeroTriumph => "hero_triumph",
            JourneyArchetype::Bittersweet => "bittersweet",
            JourneyArchetype::PureEscapism => "pure_escapism",
            JourneyArchetype::EmotionalCatharsis => "emotional_catharsis",
            JourneyArchetype::ThrillerRide => "thriller_ride",
            JourneyArchetype::SlowDiscovery => "slow_discovery",
            JourneyArchetype::Balanced => "balanced",
        }
    }
}

impl Display for JourneyArchetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-user latent preference profile built from behavioral events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalFingerprint {
    pub user_id: UserId,
    pub emotional_profile: EmotionalProfile,
    /// Tags outside the eight channels, kept apart so they never touch them
    #[serde(default)]
    pub auxiliary_channels: BTreeMap<String, u8>,
    pub pacing_profile: PacingProfile,
    pub sensitivity_profile: SensitivityProfile,
    pub engagement_signals: EngagementSignals,
    pub temporal_patterns: TemporalPatterns,
    pub emotional_journey_preference: JourneyArchetype,
    pub data_points: u64,
    pub confidence_score: u8,
    /// Optimistic-concurrency version, bumped by every successful store write
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmotionalFingerprint {
    /// Default profile handed out on a user's first access
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            emotional_profile: EmotionalProfile::default(),
            auxiliary_channels: BTreeMap::new(),
            pacing_profile: PacingProfile::default(),
            sensitivity_profile: SensitivityProfile::default(),
            engagement_signals: EngagementSignals::default(),
            temporal_patterns: TemporalPatterns::default(),
            emotional_journey_preference: JourneyArchetype::Balanced,
            data_points: 0,
            confidence_score: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Confidence grows in steps of 10 per 10 data points, capped at 100
pub fn confidence_for(data_points: u64) -> u8 {
    ((data_points / 10) * 10).min(u64::from(CHANNEL_MAX)) as u8
}

/// Explicit edits to the declared parts of a fingerprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    #[serde(default)]
    pub pacing: Option<PacingProfile>,
    #[serde(default)]
    pub sensitivity: Option<SensitivityProfile>,
}
