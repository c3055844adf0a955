//! Supplemented consciousness/sentiment read-model, grounded on
//! `ConscienceEngine`'s consciousness/sentiment formulas. Orthogonal to
//! the emotion update loop in `dynamics.rs`: it consumes the same
//! contributions already computed there and never feeds back into `W`
//! or the emotion vector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsciousnessConfig {
    pub beta_memory: f64,
    pub delta_environment: f64,
    pub lambda_feedback: f64,
    pub omega_trauma: f64,
    pub sentiment_smoothing: f64,
    pub min_consciousness_threshold: f64,
}

impl Default for ConsciousnessConfig {
    fn default() -> Self {
        ConsciousnessConfig {
            beta_memory: 0.3,
            delta_environment: 0.2,
            lambda_feedback: 0.25,
            omega_trauma: 0.5,
            sentiment_smoothing: 0.1,
            min_consciousness_threshold: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantState {
    Dormant,
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsciousnessSnapshot {
    pub consciousness_level: f64,
    pub sentiment: f64,
    pub dominant_state: DominantState,
}

pub struct ConsciousnessEngine {
    config: ConsciousnessConfig,
    smoothed_sentiment: f64,
}

impl ConsciousnessEngine {
    pub fn new(config: ConsciousnessConfig) -> Self {
        ConsciousnessEngine { config, smoothed_sentiment: 0.0 }
    }

    /// `emotional_contrib`/`memory_contrib` are pre-aggregated scalars the
    /// orchestrator derives from the current emotion vector and the
    /// queried memories (mean intensity and mean resonance respectively);
    /// `feedback`/`environment` are in `[-1, 1]`/`[0, 1]`.
    pub fn update(
        &mut self,
        wisdom: f64,
        emotional_contrib: f64,
        memory_contrib: f64,
        max_active_trauma_intensity: f64,
        feedback: f64,
        environment: f64,
    ) -> ConsciousnessSnapshot {
        let cfg = &self.config;
        let trauma_contrib = cfg.omega_trauma * max_active_trauma_intensity;

        let consciousness_level = (wisdom
            * (emotional_contrib + memory_contrib + trauma_contrib + cfg.beta_memory * feedback
        + cfg.delta_environment * environment))
        .tanh();

        let raw_sentiment =
        (0.5 * emotional_contrib + 0.3 * memory_contrib + cfg.lambda_feedback * feedback).tanh();
        self.smoothed_sentiment +=
        cfg.sentiment_smoothing * (raw_sentiment - self.smoothed_sentiment);

        let dominant_state = if consciousness_level < cfg.min_consciousness_threshold {
            DominantState::Dormant
        } else if self.smoothed_sentiment > 0.3 {
            DominantState::Positive
        } else if self.smoothed_sentiment < -0.3 {
            DominantState::Negative
        } else {
            DominantState::Neutral
        };

        ConsciousnessSnapshot {
            consciousness_level,
            sentiment: self.smoothed_sentiment,
            dominant_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_wisdom_and_activity_is_dormant() {
        let mut engine = ConsciousnessEngine::new(ConsciousnessConfig::default());
        let snapshot = engine.update(0.01, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(snapshot.dominant_state, DominantState::Dormant);
    }

    #[test]
    fn strong_positive_contributions_trend_positive() {
        let mut engine = ConsciousnessEngine::new(ConsciousnessConfig::default());
        let mut snapshot = engine.update(1.0, 0.8, 0.6, 0.0, 0.9, 0.5);
        for _ in 0..20 {
            snapshot = engine.update(1.0, 0.8, 0.6, 0.0, 0.9, 0.5);
        }
        assert_eq!(snapshot.dominant_state, DominantState::Positive);
    }
}
