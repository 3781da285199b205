use crate::models::{
    ComfortLevel, CompatibilityReport, ContentEmotionalProfile, EmotionChannel,
    EmotionalFingerprint,
};

const BASE_SCORE: i32 = 50;
const TENSION_MATCH_BONUS: i32 = 15;
const TENSION_CLASH_PENALTY: i32 = 10;
const EMOTION_MATCH_BONUS: i32 = 10;
const SENSITIVITY_PENALTY: i32 = 15;

/// Arc intensity an emotion must exceed to count as delivered
const EMOTION_INTENSITY_FLOOR: u8 = 60;

const MAX_REASONS: usize = 3;
const MAX_WARNINGS: usize = 2;

/// Substrings of a peak-moment description that mark it as violent
const VIOLENCE_KEYWORDS: [&str; 8] = [
    "violen", "blood", "gore", "murder", "kill", "torture", "assault", "battle",
];

/// Scores how well an item's emotional profile fits a fingerprint.
///
/// Starts from 50 and applies, in order: tension fit, archetype emotions present in
/// the arc, and the violence veto. Missing content fields simply contribute nothing.
/// Reasons and warnings keep the first ones found, in evaluation order.
pub fn score(
    fingerprint: &EmotionalFingerprint,
    content: &ContentEmotionalProfile,
) -> CompatibilityReport {
    let mut total = BASE_SCORE;
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();

    let preferred_tension = fingerprint.pacing_profile.preferred_tension_level;
    if let Some(story_tension) = content.tension_level {
        if story_tension == preferred_tension {
            total += TENSION_MATCH_BONUS;
            reasons.push(format!(
                "Matches your preferred {} tension level",
                story_tension.as_str()
            ));
        } else if story_tension.is_opposite_extreme(preferred_tension) {
            total -= TENSION_CLASH_PENALTY;
            warnings.push(format!(
                "Tension runs {} while you prefer {}",
                story_tension.as_str(),
                preferred_tension.as_str()
            ));
        }
    }

    let archetype = fingerprint.emotional_journey_preference;
    for emotion in archetype.preferred_emotions() {
        if arc_delivers(content, emotion) {
            total += EMOTION_MATCH_BONUS;
            reasons.push(format!("Strong moments of {}", emotion));
        }
    }

    if fingerprint.sensitivity_profile.violence_threshold == ComfortLevel::None
        && has_violent_peak(content)
    {
        total -= SENSITIVITY_PENALTY;
        warnings.push("Contains frightening or violent scenes".to_string());
    }

    reasons.truncate(MAX_REASONS);
    warnings.truncate(MAX_WARNINGS);

    CompatibilityReport {
        score: total.clamp(0, 100) as u8,
        reasons,
        warnings,
    }
}

fn arc_delivers(content: &ContentEmotionalProfile, emotion: EmotionChannel) -> bool {
    content.emotional_arc.iter().any(|point| {
        point.intensity > EMOTION_INTENSITY_FLOOR
            && EmotionChannel::from_tag(&point.emotion.trim().to_lowercase()) == Some(emotion)
    })
}

fn has_violent_peak(content: &ContentEmotionalProfile) -> bool {
    content.peak_moments.iter().any(|peak| {
        let fear_tagged = peak
            .emotion
            .as_deref()
            .map(|tag| EmotionChannel::from_tag(&tag.trim().to_lowercase()))
            == Some(Some(EmotionChannel::Fear));

        let violent_description = peak.description.as_deref().is_some_and(|text| {
            let text = text.to_lowercase();
            VIOLENCE_KEYWORDS.iter().any(|keyword| text.contains(keyword))
        });

        fear_tagged || violent_description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ArcPoint, JourneyArchetype, PeakMoment, SensitivityProfile, TensionLevel, UserId,
    };
    use chrono::Utc;

    fn fingerprint() -> EmotionalFingerprint {
        EmotionalFingerprint::new(UserId::new(), Utc::now())
    }

    fn arc(points: &[(&str, u8)]) -> Vec<ArcPoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, (emotion, intensity))| ArcPoint {
                position: (i * 10) as u8,
                emotion: emotion.to_string(),
                intensity: *intensity,
            })
            .collect()
    }

    fn peak(emotion: Option<&str>, description: Option<&str>) -> PeakMoment {
        PeakMoment {
            position: Some(80),
            emotion: emotion.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_profile_scores_base() {
        let report = score(&fingerprint(), &ContentEmotionalProfile::default());
        assert_eq!(report.score, 50);
        assert!(report.reasons.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_tension_match_adds_reason() {
        let content = ContentEmotionalProfile {
            tension_level: Some(TensionLevel::Medium),
            ..Default::default()
        };
        let report = score(&fingerprint(), &content);
        assert_eq!(report.score, 65);
        assert_eq!(report.reasons.len(), 1);
    }

    #[test]
    fn test_opposite_extreme_warns() {
        let mut fp = fingerprint();
        fp.pacing_profile.preferred_tension_level = TensionLevel::Low;
        let content = ContentEmotionalProfile {
            tension_level: Some(TensionLevel::High),
            ..Default::default()
        };

        let report = score(&fp, &content);
        assert_eq!(report.score, 40);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn test_near_mismatch_is_neutral() {
        let mut fp = fingerprint();
        fp.pacing_profile.preferred_tension_level = TensionLevel::Low;
        let content = ContentEmotionalProfile {
            tension_level: Some(TensionLevel::Medium),
            ..Default::default()
        };
        assert_eq!(score(&fp, &content).score, 50);
    }

    #[test]
    fn test_sensitivity_veto_fires_independently() {
        let mut fp = fingerprint();
        fp.sensitivity_profile = SensitivityProfile {
            violence_threshold: ComfortLevel::None,
            ..SensitivityProfile::default()
        };
        let content = ContentEmotionalProfile {
            emotional_arc: arc(&[("joy", 90)]),
            peak_moments: vec![peak(Some("fear"), None)],
            tension_level: Some(TensionLevel::Medium),
        };

        let report = score(&fp, &content);
        assert_eq!(report.score, 50);
        assert_eq!(report.reasons.len(), 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_violence_keyword_in_description_triggers_veto() {
        let mut fp = fingerprint();
        fp.sensitivity_profile.violence_threshold = ComfortLevel::None;
        let content = ContentEmotionalProfile {
            peak_moments: vec![peak(None, Some("A brutal Murder in the chapel"))],
            ..Default::default()
        };
        assert_eq!(score(&fp, &content).score, 35);
    }

    #[test]
    fn test_veto_ignored_for_tolerant_reader() {
        let content = ContentEmotionalProfile {
            peak_moments: vec![peak(Some("fear"), Some("blood everywhere"))],
            ..Default::default()
        };
        let report = score(&fingerprint(), &content);
        assert_eq!(report.score, 50);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_archetype_emotions_add_in_formula_order_and_truncate() {
        let mut fp = fingerprint();
        fp.emotional_journey_preference = JourneyArchetype::ThrillerRide;
        let content = ContentEmotionalProfile {
            emotional_arc: arc(&[("tension", 95), ("fear", 70), ("excitement", 61), ("joy", 99)]),
            peak_moments: vec![],
            tension_level: Some(TensionLevel::Medium),
        };

        let report = score(&fp, &content);
        // 50 + 15 tension + 3 * 10 emotions
        assert_eq!(report.score, 95);
        assert_eq!(report.reasons.len(), 3);
        assert!(report.reasons[0].contains("tension level"));
        assert!(report.reasons[1].contains("excitement"));
        assert!(report.reasons[2].contains("fear"));
    }

    #[test]
    fn test_intensity_must_exceed_floor() {
        let mut fp = fingerprint();
        fp.emotional_journey_preference = JourneyArchetype::SlowDiscovery;
        let content = ContentEmotionalProfile {
            emotional_arc: arc(&[("wonder", 60), ("nostalgia", 61)]),
            ..Default::default()
        };
        let report = score(&fp, &content);
        assert_eq!(report.score, 60);
        assert_eq!(report.reasons, vec!["Strong moments of nostalgia".to_string()]);
    }

    #[test]
    fn test_penalties_stack() {
        let mut fp = fingerprint();
        fp.pacing_profile.preferred_tension_level = TensionLevel::High;
        fp.sensitivity_profile.violence_threshold = ComfortLevel::None;
        let content = ContentEmotionalProfile {
            tension_level: Some(TensionLevel::Low),
            peak_moments: vec![peak(Some("scary"), Some("gore"))],
            ..Default::default()
        };
        let report = score(&fp, &content);
        assert_eq!(report.score, 25);
        assert_eq!(report.warnings.len(), 2);
    }
}
