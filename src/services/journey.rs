use crate::models::{
    EmotionChannel, EmotionalProfile, JourneyArchetype, PacePreference, PacingProfile,
};

/// Flat score `balanced` competes with
const BALANCED_BASELINE: f64 = 50.0;

/// Pacing multiplier applied to the pace-sensitive archetypes
const PACE_BOOST: f64 = 1.2;
const PACE_DAMPEN: f64 = 0.8;

/// Archetypes that compete against the balanced baseline, in evaluation order
const CANDIDATES: [JourneyArchetype; 6] = [
    JourneyArchetype::HeroTriumph,
    JourneyArchetype::Bittersweet,
    JourneyArchetype::PureEscapism,
    JourneyArchetype::EmotionalCatharsis,
    JourneyArchetype::ThrillerRide,
    JourneyArchetype::SlowDiscovery,
];

impl JourneyArchetype {
    /// Weighted channel formula of the archetype; weights sum to 1.0.
    ///
    /// `balanced` has no formula and scores the flat baseline instead.
    pub fn weights(&self) -> &'static [(EmotionChannel, f64)] {
        use EmotionChannel::*;
        match self {
            JourneyArchetype::HeroTriumph => &[(Excitement, 0.4), (Joy, 0.35), (Wonder, 0.25)],
            JourneyArchetype::Bittersweet => &[(Sadness, 0.4), (Nostalgia, 0.3), (Romance, 0.3)],
            JourneyArchetype::PureEscapism => &[(Wonder, 0.4), (Joy, 0.35), (Romance, 0.25)],
            JourneyArchetype::EmotionalCatharsis => {
                &[(Sadness, 0.5), (Tension, 0.3), (Joy, 0.2)]
            }
            JourneyArchetype::ThrillerRide => &[(Excitement, 0.4), (Fear, 0.3), (Tension, 0.3)],
            JourneyArchetype::SlowDiscovery => &[(Wonder, 0.5), (Nostalgia, 0.5)],
            JourneyArchetype::Balanced => &[],
        }
    }

    /// Emotions an item should deliver to suit this archetype, in formula order
    pub fn preferred_emotions(&self) -> impl Iterator<Item = EmotionChannel> {
        self.weights().iter().map(|(channel, _)| *channel)
    }

    /// Short reader-facing explanation
    pub fn description(&self) -> &'static str {
        match self {
            JourneyArchetype::HeroTriumph => "Stories where the underdog rises and wins",
            JourneyArchetype::Bittersweet => "Endings that ache a little and linger",
            JourneyArchetype::PureEscapism => "Bright, immersive worlds to get lost in",
            JourneyArchetype::EmotionalCatharsis => "Heavy journeys that end in release",
            JourneyArchetype::ThrillerRide => "Pulse-pounding stories that never let up",
            JourneyArchetype::SlowDiscovery => "Quiet, unhurried stories that unfold slowly",
            JourneyArchetype::Balanced => "A bit of everything",
        }
    }
}

fn pace_multiplier(archetype: JourneyArchetype, pace: PacePreference) -> f64 {
    match (archetype, pace) {
        (JourneyArchetype::ThrillerRide, PacePreference::FastPaced)
        | (JourneyArchetype::SlowDiscovery, PacePreference::SlowBurn) => PACE_BOOST,
        (JourneyArchetype::ThrillerRide, PacePreference::SlowBurn)
        | (JourneyArchetype::SlowDiscovery, PacePreference::FastPaced) => PACE_DAMPEN,
        _ => 1.0,
    }
}

/// Score of every archetype for a profile, `balanced` last
pub fn archetype_scores(
    emotional: &EmotionalProfile,
    pacing: &PacingProfile,
) -> Vec<(JourneyArchetype, f64)> {
    let mut scores: Vec<(JourneyArchetype, f64)> = CANDIDATES
        .iter()
        .map(|archetype| {
            let raw: f64 = archetype
                .weights()
                .iter()
                .map(|(channel, weight)| weight * emotional.level(*channel))
                .sum();
            (*archetype, raw * pace_multiplier(*archetype, pacing.action_pace_pref))
        })
        .collect();

    scores.push((JourneyArchetype::Balanced, BALANCED_BASELINE));
    scores
}

/// Picks the archetype with the strictly highest score.
///
/// `balanced` holds unless some archetype beats its baseline outright; among the
/// others the earlier one in evaluation order wins a tie.
pub fn classify(emotional: &EmotionalProfile, pacing: &PacingProfile) -> JourneyArchetype {
    let mut best = JourneyArchetype::Balanced;
    let mut best_score = BALANCED_BASELINE;

    for (archetype, score) in archetype_scores(emotional, pacing) {
        if archetype != JourneyArchetype::Balanced && score > best_score {
            best = archetype;
            best_score = score;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(values: &[(EmotionChannel, i32)]) -> EmotionalProfile {
        let mut profile = EmotionalProfile::default();
        for (channel, value) in values {
            profile.set(*channel, *value);
        }
        profile
    }

    #[test]
    fn test_weights_sum_to_one() {
        for archetype in CANDIDATES {
            let total: f64 = archetype.weights().iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9, "{} sums to {}", archetype, total);
        }
    }

    #[test]
    fn test_default_profile_is_balanced() {
        let archetype = classify(&EmotionalProfile::default(), &PacingProfile::default());
        assert_eq!(archetype, JourneyArchetype::Balanced);
    }

    #[test]
    fn test_thriller_profile() {
        let profile = profile_with(&[
            (EmotionChannel::Excitement, 90),
            (EmotionChannel::Fear, 80),
            (EmotionChannel::Tension, 85),
        ]);
        assert_eq!(
            classify(&profile, &PacingProfile::default()),
            JourneyArchetype::ThrillerRide
        );
    }

    #[test]
    fn test_pacing_multiplier_flips_result() {
        // thriller_ride 0.4*70 + 0.3*60 + 0.3*50 = 61
        // slow_discovery 0.5*62 + 0.5*62 = 62
        let profile = profile_with(&[
            (EmotionChannel::Excitement, 70),
            (EmotionChannel::Fear, 60),
            (EmotionChannel::Wonder, 62),
            (EmotionChannel::Nostalgia, 62),
            (EmotionChannel::Joy, 40),
            (EmotionChannel::Romance, 40),
            (EmotionChannel::Sadness, 40),
        ]);

        let balanced_pace = PacingProfile::default();
        assert_eq!(classify(&profile, &balanced_pace), JourneyArchetype::SlowDiscovery);

        let fast = PacingProfile {
            action_pace_pref: PacePreference::FastPaced,
            ..PacingProfile::default()
        };
        assert_eq!(classify(&profile, &fast), JourneyArchetype::ThrillerRide);
    }

    #[test]
    fn test_tie_with_baseline_keeps_balanced() {
        // bittersweet = 0.4*50 + 0.3*50 + 0.3*50 = 50, everything else <= 50
        let profile = profile_with(&[
            (EmotionChannel::Joy, 10),
            (EmotionChannel::Excitement, 10),
            (EmotionChannel::Wonder, 10),
        ]);
        assert_eq!(
            classify(&profile, &PacingProfile::default()),
            JourneyArchetype::Balanced
        );
    }

    #[test]
    fn test_classify_is_deterministic() {
        let profile = profile_with(&[
            (EmotionChannel::Sadness, 77),
            (EmotionChannel::Nostalgia, 64),
            (EmotionChannel::Romance, 71),
        ]);
        let pacing = PacingProfile::default();
        let first = classify(&profile, &pacing);
        let second = classify(&profile, &pacing);
        assert_eq!(first, second);
        assert_eq!(first, JourneyArchetype::Bittersweet);
    }

    #[test]
    fn test_balanced_has_no_preferred_emotions() {
        assert_eq!(JourneyArchetype::Balanced.preferred_emotions().count(), 0);
        let thriller: Vec<_> = JourneyArchetype::ThrillerRide.preferred_emotions().collect();
        assert_eq!(
            thriller,
            vec![
                EmotionChannel::Excitement,
                EmotionChannel::Fear,
                EmotionChannel::Tension
            ]
        );
    }
}
