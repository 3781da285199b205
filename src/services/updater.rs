/// Pure state transitions of an `EmotionalFingerprint`.
///
/// Every function here maps `(old state, input)` to a new state with no I/O and no
/// hidden randomness; persistence and concurrency live in `FingerprintService`.
use chrono::{DateTime, Datelike, Utc, Weekday};

use crate::{
    models::{
        fingerprint::{clamp_scalar, confidence_for},
        DaySkew, EmotionChannel, EmotionTag, EmotionalEvent, EmotionalFingerprint, EventType,
        PreferenceUpdate, RereadFrequency, TimeOfDay,
    },
    services::journey::classify,
};

/// Capacity of the abandonment-trigger and completion-motivator lists
pub const MAX_TAG_HISTORY: usize = 10;

/// The archetype is only re-derived once `data_points` exceeds this
pub const ARCHETYPE_EVIDENCE_THRESHOLD: u64 = 50;

const CHANNEL_STEP: i32 = 5;
const INTENSE_PAUSE_STEP: i32 = 2;
const INTENSE_PAUSE_TAG: &str = "intense";

/// Absent auxiliary tags start here, so the first reread lands on 55 and skip on 45
const AUXILIARY_BASE: i32 = 50;
const MAX_AUXILIARY_CHANNELS: usize = 32;

const SPEED_EMA_ALPHA: f64 = 0.1;
const SPEED_UP_TARGET: f64 = 1.5;
const SLOW_DOWN_TARGET: f64 = 0.5;
const SPEED_MIN: f64 = 0.25;
const SPEED_MAX: f64 = 4.0;

const SESSION_EMA_ALPHA: f64 = 0.2;

/// Minimum events before the weekday/weekend skew is classified
const SKEW_MIN_EVENTS: u64 = 10;

/// Applies one normalized event and returns the next fingerprint
pub fn apply_event(
    fingerprint: &EmotionalFingerprint,
    event: &EmotionalEvent,
) -> EmotionalFingerprint {
    let mut next = fingerprint.clone();

    match (event.event_type, &event.context) {
        (EventType::Reread, Some(tag)) => adjust_tag(&mut next, tag, CHANNEL_STEP),
        (EventType::Skip, Some(tag)) => adjust_tag(&mut next, tag, -CHANNEL_STEP),
        (EventType::Pause, Some(EmotionTag::Other(tag))) if tag == INTENSE_PAUSE_TAG => {
            next.emotional_profile.adjust(EmotionChannel::Tension, INTENSE_PAUSE_STEP);
        }
        (EventType::Abandon, Some(tag)) => push_bounded(
            &mut next.engagement_signals.abandonment_triggers,
            tag.as_str(),
        ),
        (EventType::ChapterEnd, Some(tag)) => push_bounded(
            &mut next.engagement_signals.completion_motivators,
            tag.as_str(),
        ),
        _ => {}
    }

    next.data_points = next.data_points.saturating_add(1);
    next.confidence_score = confidence_for(next.data_points);

    record_engagement(&mut next, event);
    record_temporal(&mut next, event);
    refresh_archetype(&mut next);

    next.updated_at = next.updated_at.max(event.occurred_at);
    next
}

/// Replaces the declared pacing and/or sensitivity preferences
pub fn apply_preferences(
    fingerprint: &EmotionalFingerprint,
    update: &PreferenceUpdate,
    now: DateTime<Utc>,
) -> EmotionalFingerprint {
    let mut next = fingerprint.clone();

    if let Some(pacing) = update.pacing {
        next.pacing_profile = pacing;
        next.pacing_profile.tension_recovery_rate =
            clamp_scalar(i32::from(pacing.tension_recovery_rate));
        next.pacing_profile.cliffhanger_tolerance =
            clamp_scalar(i32::from(pacing.cliffhanger_tolerance));
    }
    if let Some(sensitivity) = update.sensitivity {
        next.sensitivity_profile = sensitivity;
        next.sensitivity_profile.dark_themes_tolerance =
            clamp_scalar(i32::from(sensitivity.dark_themes_tolerance));
    }

    refresh_archetype(&mut next);
    next.updated_at = now;
    next
}

/// Reinitializes a fingerprint to defaults.
///
/// Identity, creation time, version and the event counter survive: `data_points`
/// counts events ever observed and never goes backwards.
pub fn reset(fingerprint: &EmotionalFingerprint, now: DateTime<Utc>) -> EmotionalFingerprint {
    let mut next = EmotionalFingerprint::new(fingerprint.user_id, fingerprint.created_at);
    next.data_points = fingerprint.data_points;
    next.confidence_score = confidence_for(next.data_points);
    next.version = fingerprint.version;
    next.updated_at = now;
    next
}

fn refresh_archetype(fingerprint: &mut EmotionalFingerprint) {
    if fingerprint.data_points > ARCHETYPE_EVIDENCE_THRESHOLD {
        fingerprint.emotional_journey_preference =
            classify(&fingerprint.emotional_profile, &fingerprint.pacing_profile);
    }
}

fn adjust_tag(fingerprint: &mut EmotionalFingerprint, tag: &EmotionTag, delta: i32) {
    match tag {
        EmotionTag::Channel(channel) => fingerprint.emotional_profile.adjust(*channel, delta),
        EmotionTag::Other(name) => {
            let auxiliary = &mut fingerprint.auxiliary_channels;
            if let Some(value) = auxiliary.get_mut(name) {
                *value = clamp_scalar(i32::from(*value) + delta);
            } else if auxiliary.len() < MAX_AUXILIARY_CHANNELS {
                auxiliary.insert(name.clone(), clamp_scalar(AUXILIARY_BASE + delta));
            } else {
                tracing::debug!(tag = %name, "Auxiliary channel capacity reached, tag ignored");
            }
        }
    }
}

/// Insert-if-absent, evicting the oldest entry past capacity
fn push_bounded(list: &mut Vec<String>, tag: &str) {
    if list.iter().any(|existing| existing == tag) {
        return;
    }
    list.push(tag.to_string());
    while list.len() > MAX_TAG_HISTORY {
        list.remove(0);
    }
}

fn record_engagement(fingerprint: &mut EmotionalFingerprint, event: &EmotionalEvent) {
    let signals = &mut fingerprint.engagement_signals;

    match event.event_type {
        EventType::Reread => signals.reread_count = signals.reread_count.saturating_add(1),
        EventType::SpeedUp => {
            signals.avg_reading_speed =
                ema(signals.avg_reading_speed, SPEED_UP_TARGET, SPEED_EMA_ALPHA)
                    .clamp(SPEED_MIN, SPEED_MAX)
        }
        EventType::SlowDown => {
            signals.avg_reading_speed =
                ema(signals.avg_reading_speed, SLOW_DOWN_TARGET, SPEED_EMA_ALPHA)
                    .clamp(SPEED_MIN, SPEED_MAX)
        }
        _ => {}
    }

    signals.reread_frequency = reread_frequency(signals.reread_count, fingerprint.data_points);
}

fn reread_frequency(rereads: u64, data_points: u64) -> RereadFrequency {
    if data_points == 0 {
        return RereadFrequency::Rarely;
    }
    let ratio = rereads as f64 / data_points as f64;
    if ratio < 0.05 {
        RereadFrequency::Rarely
    } else if ratio < 0.2 {
        RereadFrequency::Occasionally
    } else {
        RereadFrequency::Frequently
    }
}

fn record_temporal(fingerprint: &mut EmotionalFingerprint, event: &EmotionalEvent) {
    let patterns = &mut fingerprint.temporal_patterns;

    let bucket = TimeOfDay::from_timestamp(event.occurred_at);
    *patterns.time_of_day_counts.entry(bucket).or_insert(0) += 1;
    let total: u64 = patterns.time_of_day_counts.values().sum();
    patterns.preferred_reading_times = patterns
        .time_of_day_counts
        .iter()
        .filter(|(_, count)| **count * 4 >= total)
        .map(|(bucket, _)| *bucket)
        .collect();

    match event.occurred_at.weekday() {
        Weekday::Sat | Weekday::Sun => patterns.weekend_events += 1,
        _ => patterns.weekday_events += 1,
    }
    let observed = patterns.weekday_events + patterns.weekend_events;
    patterns.day_skew = if observed < SKEW_MIN_EVENTS {
        DaySkew::Even
    } else {
        let weekend_share = patterns.weekend_events as f64 / observed as f64;
        if weekend_share > 0.45 {
            DaySkew::Weekend
        } else if weekend_share < 0.15 {
            DaySkew::Weekday
        } else {
            DaySkew::Even
        }
    };

    if let (Some(seconds), Some(tag)) = (event.duration_seconds, &event.context) {
        let minutes = seconds / 60.0;
        let sessions = &mut patterns.session_minutes_by_mood;
        if let Some(average) = sessions.get_mut(tag.as_str()) {
            *average = ema(*average, minutes, SESSION_EMA_ALPHA);
        } else if sessions.len() < MAX_AUXILIARY_CHANNELS {
            sessions.insert(tag.as_str().to_string(), minutes);
        }
    }
}

fn ema(current: f64, sample: f64, alpha: f64) -> f64 {
    current * (1.0 - alpha) + sample * alpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemId, JourneyArchetype, PacePreference, PacingProfile, UserId};
    use uuid::Uuid;

    fn base_time() -> DateTime<Utc> {
        "2026-03-04T19:30:00Z".parse().unwrap()
    }

    fn fingerprint() -> EmotionalFingerprint {
        EmotionalFingerprint::new(UserId::new(), base_time())
    }

    fn event(event_type: EventType, context: Option<EmotionTag>) -> EmotionalEvent {
        EmotionalEvent {
            id: Uuid::new_v4(),
            user_id: UserId::new(),
            event_type,
            context,
            duration_seconds: None,
            occurred_at: base_time(),
            item_id: ItemId::new(),
            chapter: None,
        }
    }

    fn channel(channel: EmotionChannel) -> Option<EmotionTag> {
        Some(EmotionTag::Channel(channel))
    }

    fn other(tag: &str) -> Option<EmotionTag> {
        Some(EmotionTag::Other(tag.to_string()))
    }

    #[test]
    fn test_reread_increases_channel() {
        let start = fingerprint();
        assert_eq!(start.emotional_profile.joy, 50);

        let next = apply_event(&start, &event(EventType::Reread, channel(EmotionChannel::Joy)));
        assert_eq!(next.emotional_profile.joy, 55);
        assert_eq!(next.data_points, start.data_points + 1);
    }

    #[test]
    fn test_skip_floors_at_zero() {
        let mut start = fingerprint();
        start.emotional_profile.set(EmotionChannel::Fear, 3);

        let next = apply_event(&start, &event(EventType::Skip, channel(EmotionChannel::Fear)));
        assert_eq!(next.emotional_profile.fear, 0);
    }

    #[test]
    fn test_reread_caps_at_hundred() {
        let mut start = fingerprint();
        start.emotional_profile.set(EmotionChannel::Wonder, 98);

        let next = apply_event(&start, &event(EventType::Reread, channel(EmotionChannel::Wonder)));
        assert_eq!(next.emotional_profile.wonder, 100);
    }

    #[test]
    fn test_unrecognized_tag_uses_fallback_bases() {
        let start = fingerprint();

        let reread = apply_event(&start, &event(EventType::Reread, other("whimsy")));
        assert_eq!(reread.auxiliary_channels.get("whimsy"), Some(&55));
        assert_eq!(reread.emotional_profile, start.emotional_profile);

        let skipped = apply_event(&start, &event(EventType::Skip, other("gloom")));
        assert_eq!(skipped.auxiliary_channels.get("gloom"), Some(&45));

        let again = apply_event(&reread, &event(EventType::Reread, other("whimsy")));
        assert_eq!(again.auxiliary_channels.get("whimsy"), Some(&60));
    }

    #[test]
    fn test_intense_pause_raises_tension() {
        let start = fingerprint();
        let next = apply_event(&start, &event(EventType::Pause, other("intense")));
        assert_eq!(next.emotional_profile.tension, 52);

        let calm = apply_event(&start, &event(EventType::Pause, other("calm")));
        assert_eq!(calm.emotional_profile.tension, 50);
    }

    #[test]
    fn test_other_combinations_only_count() {
        let start = fingerprint();
        let next = apply_event(&start, &event(EventType::Complete, channel(EmotionChannel::Joy)));
        assert_eq!(next.emotional_profile, start.emotional_profile);
        assert_eq!(next.data_points, 1);

        let untagged = apply_event(&start, &event(EventType::Reread, None));
        assert_eq!(untagged.emotional_profile, start.emotional_profile);
        assert_eq!(untagged.data_points, 1);
    }

    #[test]
    fn test_abandon_list_is_bounded_fifo() {
        let mut current = fingerprint();
        for i in 0..25 {
            let tag = format!("trigger_{}", i);
            current = apply_event(&current, &event(EventType::Abandon, other(&tag)));
            assert!(current.engagement_signals.abandonment_triggers.len() <= MAX_TAG_HISTORY);
        }

        let triggers = &current.engagement_signals.abandonment_triggers;
        assert_eq!(triggers.len(), MAX_TAG_HISTORY);
        assert_eq!(triggers.first().map(String::as_str), Some("trigger_15"));
        assert_eq!(triggers.last().map(String::as_str), Some("trigger_24"));
    }

    #[test]
    fn test_duplicate_motivator_is_not_reinserted() {
        let mut current = fingerprint();
        for tag in ["cliffhanger", "romance", "cliffhanger"] {
            let context = crate::services::ingest::normalize_tag(tag);
            current = apply_event(&current, &event(EventType::ChapterEnd, context));
        }
        assert_eq!(
            current.engagement_signals.completion_motivators,
            vec!["cliffhanger".to_string(), "romance".to_string()]
        );
    }

    #[test]
    fn test_confidence_tracks_data_points() {
        let mut current = fingerprint();
        for _ in 0..37 {
            current = apply_event(&current, &event(EventType::SpeedUp, None));
        }
        assert_eq!(current.data_points, 37);
        assert_eq!(current.confidence_score, 30);
    }

    #[test]
    fn test_archetype_sticky_below_threshold() {
        let mut start = fingerprint();
        start.data_points = 10;
        start.emotional_profile.set(EmotionChannel::Excitement, 95);
        start.emotional_profile.set(EmotionChannel::Fear, 90);
        start.emotional_profile.set(EmotionChannel::Tension, 90);

        let next = apply_event(&start, &event(EventType::Pause, None));
        assert_eq!(next.data_points, 11);
        assert_eq!(next.emotional_journey_preference, JourneyArchetype::Balanced);
    }

    #[test]
    fn test_archetype_recomputed_above_threshold() {
        let mut start = fingerprint();
        start.data_points = 50;
        start.emotional_profile.set(EmotionChannel::Excitement, 95);
        start.emotional_profile.set(EmotionChannel::Fear, 90);
        start.emotional_profile.set(EmotionChannel::Tension, 90);

        let next = apply_event(&start, &event(EventType::Pause, None));
        assert_eq!(next.data_points, 51);
        assert_eq!(next.emotional_journey_preference, JourneyArchetype::ThrillerRide);
    }

    #[test]
    fn test_channels_stay_bounded_over_long_sequence() {
        let mut current = fingerprint();
        let mut previous_points = current.data_points;
        for i in 0..400u32 {
            let channel_tag = channel(EmotionChannel::ALL[(i as usize) % 8]);
            let event_type = match i % 5 {
                0 | 1 => EventType::Reread,
                2 | 3 => EventType::Skip,
                _ => EventType::Pause,
            };
            let context = if event_type == EventType::Pause {
                other("intense")
            } else {
                channel_tag
            };
            current = apply_event(&current, &event(event_type, context));

            for ch in EmotionChannel::ALL {
                assert!(current.emotional_profile.get(ch) <= 100);
            }
            assert!(current.data_points > previous_points);
            previous_points = current.data_points;
        }
    }

    #[test]
    fn test_speed_signals_move_reading_speed() {
        let start = fingerprint();
        let faster = apply_event(&start, &event(EventType::SpeedUp, None));
        assert!(faster.engagement_signals.avg_reading_speed > 1.0);

        let slower = apply_event(&start, &event(EventType::SlowDown, None));
        assert!(slower.engagement_signals.avg_reading_speed < 1.0);
    }

    #[test]
    fn test_temporal_patterns_record_bucket_and_mood_session() {
        let start = fingerprint();
        let mut reread = event(EventType::Reread, channel(EmotionChannel::Romance));
        reread.duration_seconds = Some(1_200.0);

        let next = apply_event(&start, &reread);
        assert!(next
            .temporal_patterns
            .preferred_reading_times
            .contains(&TimeOfDay::Evening));
        assert_eq!(
            next.temporal_patterns.session_minutes_by_mood.get("romance"),
            Some(&20.0)
        );
        assert_eq!(next.temporal_patterns.weekday_events, 1);
    }

    #[test]
    fn test_preferences_replace_pacing_and_keep_counter() {
        let start = fingerprint();
        let update = PreferenceUpdate {
            pacing: Some(PacingProfile {
                action_pace_pref: PacePreference::FastPaced,
                ..PacingProfile::default()
            }),
            sensitivity: None,
        };

        let next = apply_preferences(&start, &update, base_time());
        assert_eq!(next.pacing_profile.action_pace_pref, PacePreference::FastPaced);
        assert_eq!(next.data_points, start.data_points);
        assert_eq!(next.sensitivity_profile, start.sensitivity_profile);
    }

    #[test]
    fn test_reset_keeps_counter_and_restores_defaults() {
        let mut current = fingerprint();
        for _ in 0..12 {
            current = apply_event(&current, &event(EventType::Reread, channel(EmotionChannel::Joy)));
        }
        assert_eq!(current.emotional_profile.joy, 100);

        let fresh = reset(&current, base_time());
        assert_eq!(fresh.emotional_profile.joy, 50);
        assert_eq!(fresh.data_points, 12);
        assert_eq!(fresh.confidence_score, 10);
        assert_eq!(fresh.user_id, current.user_id);
    }
}
