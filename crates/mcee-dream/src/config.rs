use std::collections::HashMap;

use mcee_types::Phase;
use serde::{Deserialize, Serialize};

/// Dream-cycle configuration. Defaults are taken verbatim from the
/// constants the original `DreamConfig` pinned (a 12-hour circadian
/// cycle, 80/20 awake/dream split, the 10/60/20/10 sub-phase ratios).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DreamConfig {
    pub cycle_period_s: f64,
    pub awake_ratio: f64,
    pub dream_ratio: f64,
    pub scan_phase_ratio: f64,
    pub consolidate_ratio: f64,
    pub explore_ratio: f64,
    pub cleanup_ratio: f64,
    pub min_time_since_last_dream_s: f64,
    pub max_emotional_activity_for_dream: f64,
    pub block_dream_on_peur: bool,
    pub block_dream_on_anxiete: bool,
    pub rho: f64,
    pub lambda: f64,
    pub eta: f64,
    pub theta: f64,
    pub consolidation_threshold: f64,
    pub sigma_base: f64,
    pub sigma_multiplier: HashMap<Phase, f64>,
    pub forget_decay_rate: f64,
    pub reinforcement_factor: f64,
    pub min_weight_before_deletion: f64,
    /// Reserved: original trauma-score floor multiplier; traumas are
    /// already exempt from forgetting and forced to consolidate, so this
    /// is carried as a config knob without an active use site yet.
    pub trauma_retention_multiplier: f64,
}

impl Default for DreamConfig {
    fn default() -> Self {
        let mut sigma_multiplier = HashMap::new();
        sigma_multiplier.insert(Phase::Exploration, 1.5);
        sigma_multiplier.insert(Phase::Serenite, 1.2);
        sigma_multiplier.insert(Phase::Joie, 1.3);
        sigma_multiplier.insert(Phase::Anxiete, 0.6);
        sigma_multiplier.insert(Phase::Peur, 0.4);
        sigma_multiplier.insert(Phase::Tristesse, 0.8);
        sigma_multiplier.insert(Phase::Degout, 0.7);
        sigma_multiplier.insert(Phase::Confusion, 0.9);

        DreamConfig {
            cycle_period_s: 43_200.0,
            awake_ratio: 0.80,
            dream_ratio: 0.20,
            scan_phase_ratio: 0.10,
            consolidate_ratio: 0.60,
            explore_ratio: 0.20,
            cleanup_ratio: 0.10,
            min_time_since_last_dream_s: 32_400.0,
            max_emotional_activity_for_dream: 0.3,
            block_dream_on_peur: true,
            block_dream_on_anxiete: true,
            rho: 0.35,
            lambda: 0.25,
            eta: 0.20,
            theta: 0.20,
            consolidation_threshold: 0.5,
            sigma_base: 0.15,
            sigma_multiplier,
            forget_decay_rate: 0.05,
            reinforcement_factor: 1.2,
            min_weight_before_deletion: 0.1,
            trauma_retention_multiplier: 10.0,
        }
    }
}

impl DreamConfig {
    pub fn dream_duration_s(&self) -> f64 {
        self.cycle_period_s * self.dream_ratio
    }

    pub fn scan_duration_s(&self) -> f64 {
        self.dream_duration_s() * self.scan_phase_ratio
    }

    pub fn consolidate_duration_s(&self) -> f64 {
        self.dream_duration_s() * self.consolidate_ratio
    }

    pub fn explore_duration_s(&self) -> f64 {
        self.dream_duration_s() * self.explore_ratio
    }

    pub fn cleanup_duration_s(&self) -> f64 {
        self.dream_duration_s() * self.cleanup_ratio
    }

    pub fn sigma_for(&self, phase: Phase) -> f64 {
        self.sigma_base * self.sigma_multiplier.get(&phase).copied().unwrap_or(1.0)
    }

    /// Fraction of the circadian cycle elapsed, for status reporting.
    pub fn cycle_position(&self, elapsed_s: f64) -> f64 {
        if self.cycle_period_s <= 0.0 {
            0.0
        } else {
            (elapsed_s / self.cycle_period_s).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_phase_ratios_sum_to_one() {
        let cfg = DreamConfig::default();
        let sum = cfg.scan_phase_ratio + cfg.consolidate_ratio + cfg.explore_ratio + cfg.cleanup_ratio;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sub_phase_durations_sum_to_dream_duration() {
        let cfg = DreamConfig::default();
        let total =
        cfg.scan_duration_s() + cfg.consolidate_duration_s() + cfg.explore_duration_s() + cfg.cleanup_duration_s();
        assert!((total - cfg.dream_duration_s()).abs() < 1e-6);
    }
}
