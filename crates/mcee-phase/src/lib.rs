//! Component C: phase detection with hysteresis and minimum dwell.

use std::collections::HashMap;

use mcee_types::{EmotionVector, Phase, PhaseTransition, ALL_PHASES, EMOTION_COUNT};
use serde::{Deserialize, Serialize};

/// Per-phase scoring weights over the 24 emotion indices, plus the
/// hysteresis margin and minimum dwell required to switch into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseProfile {
    pub weights: [f64; EMOTION_COUNT],
    pub hysteresis: f64,
    pub min_dwell_ms: i64,
}

fn profile(weights: &[(usize, f64)], hysteresis: f64, min_dwell_ms: i64) -> PhaseProfile {
    let mut w = [0.0; EMOTION_COUNT];
    for (i, v) in weights {
        w[*i] = *v;
    }
    PhaseProfile { weights: w, hysteresis, min_dwell_ms }
}

/// Default scoring table. Indices follow `mcee_types::EMOTION_NAMES`.
pub fn default_profiles() -> HashMap<Phase, PhaseProfile> {
    let mut m = HashMap::new();
    m.insert(Phase::Serenite, profile(&[(8, 1.0), (19, 0.6), (17, 0.3)], 0.05, 2_000));
    m.insert(Phase::Joie, profile(&[(17, 1.0), (3, 0.5), (13, 0.5), (23, 0.4)], 0.05, 2_000));
    m.insert(
        Phase::Exploration,
        profile(&[(16, 1.0), (12, 0.7), (5, 0.4), (2, 0.3)], 0.05, 2_000),
    );
    m.insert(Phase::Anxiete, profile(&[(4, 1.0), (9, 0.4), (7, 0.2)], 0.05, 3_000));
    m.insert(Phase::Peur, profile(&[(14, 1.0), (15, 0.8)], 0.03, 1_000));
    m.insert(Phase::Tristesse, profile(&[(20, 1.0), (11, 0.4), (18, 0.3)], 0.05, 3_000));
    m.insert(Phase::Degout, profile(&[(10, 1.0), (6, 0.3)], 0.05, 2_000));
    m.insert(Phase::Confusion, profile(&[(9, 1.0), (7, 0.3)], 0.05, 2_000));
    m
}

pub trait TransitionSink {
    fn emit(&mut self, transition: PhaseTransition);
}

/// A sink that keeps every transition, used by tests.
#[derive(Default)]
pub struct VecSink(pub Vec<PhaseTransition>);

impl TransitionSink for VecSink {
    fn emit(&mut self, transition: PhaseTransition) {
        self.0.push(transition);
    }
}

pub struct PhaseDetector {
    profiles: HashMap<Phase, PhaseProfile>,
    current: Phase,
    entered_at_ms: i64,
}

impl PhaseDetector {
    pub fn new(profiles: HashMap<Phase, PhaseProfile>, initial: Phase, now_ms: i64) -> Self {
        PhaseDetector { profiles, current: initial, entered_at_ms: now_ms }
    }

    pub fn current_phase(&self) -> Phase {
        self.current
    }

    pub fn time_in_phase_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.entered_at_ms).max(0)
    }

    fn score(&self, phase: Phase, emotions: &EmotionVector) -> f64 {
        let w = &self.profiles[&phase].weights;
        (0..EMOTION_COUNT).map(|i| w[i] * emotions[i]).sum()
    }

    /// `detect(E) -> Phase`. Transitions only when the best challenger
    /// beats the incumbent by more than its hysteresis margin AND the
    /// incumbent has been held at least its own minimum dwell.
    pub fn detect(
        &mut self,
        emotions: &EmotionVector,
        now_ms: i64,
        sink: &mut dyn TransitionSink,
    ) -> Phase {
        let current_score = self.score(self.current, emotions);
        let mut best_phase = self.current;
        let mut best_score = current_score;
        for phase in ALL_PHASES {
            let score = self.score(phase, emotions);
            if score > best_score {
                best_score = score;
                best_phase = phase;
            }
        }

        if best_phase != self.current {
            let challenger_profile = &self.profiles[&best_phase];
            let dwell_ok = self.time_in_phase_ms(now_ms) >= self.profiles[&self.current].min_dwell_ms;
            let margin_ok = (best_score - current_score) > challenger_profile.hysteresis;
            if dwell_ok && margin_ok {
                self.transition(best_phase, now_ms, false, None, sink);
            }
        }
        self.current
    }

    /// `force_transition`: unconditional switch, still emits the event.
    pub fn force_transition(&mut self, phase: Phase, reason: &'static str, now_ms: i64, sink: &mut dyn TransitionSink) {
        if phase != self.current {
            self.transition(phase, now_ms, true, Some(reason), sink);
        }
    }

    fn transition(
        &mut self,
        to: Phase,
        now_ms: i64,
        forced: bool,
        reason: Option<&'static str>,
        sink: &mut dyn TransitionSink,
    ) {
        let duration = self.time_in_phase_ms(now_ms);
        let from = self.current;
        self.current = to;
        self.entered_at_ms = now_ms;
        sink.emit(PhaseTransition { from, to, duration_in_from_ms: duration, forced, reason });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_transition_below_hysteresis() {
        let mut detector = PhaseDetector::new(default_profiles(), Phase::Serenite, 0);
        let mut sink = VecSink::default();
        let mut emotions = EmotionVector::zero();
        emotions[8] = 0.5; // Calm keeps Serenite as incumbent
        emotions[17] = 0.52; // Joy barely above, within hysteresis once both scaled
        detector.detect(&emotions, 100, &mut sink);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn transition_requires_min_dwell() {
        let mut detector = PhaseDetector::new(default_profiles(), Phase::Serenite, 0);
        let mut sink = VecSink::default();
        let mut emotions = EmotionVector::zero();
        emotions[17] = 0.9; // Joy, clearly above hysteresis margin
        detector.detect(&emotions, 500, &mut sink); // before min_dwell (2000ms)
        assert!(sink.0.is_empty());
        assert_eq!(detector.current_phase(), Phase::Serenite);

        detector.detect(&emotions, 2_500, &mut sink);
        assert_eq!(sink.0.len(), 1);
        assert_eq!(detector.current_phase(), Phase::Joie);
    }

    #[test]
    fn force_transition_is_unconditional() {
        let mut detector = PhaseDetector::new(default_profiles(), Phase::Serenite, 0);
        let mut sink = VecSink::default();
        detector.force_transition(Phase::Anxiete, "FEAR_TIMEOUT", 10, &mut sink);
        assert_eq!(detector.current_phase(), Phase::Anxiete);
        assert_eq!(sink.0.len(), 1);
        assert!(sink.0[0].forced);
    }
}
