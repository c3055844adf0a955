//! Phase → update-coefficient table. The exact weight
//! shape per phase is left to the implementation; PEUR gets a lower
//! amygdala threshold override and a higher alpha so feedback dominates
//! during a fear episode, mirroring `MCEEParameters`' PEUR tuning.

use std::collections::HashMap;

use mcee_types::{Phase, PhaseConfig};

pub fn default_phase_configs() -> HashMap<Phase, PhaseConfig> {
    let mut m = HashMap::new();
    m.insert(
        Phase::Serenite,
        PhaseConfig { alpha: 0.4, beta: 0.2, gamma: 0.2, delta: 0.1, theta: 0.1, learning_rate: 1.0, amygdala_threshold_override: None },
    );
    m.insert(
        Phase::Joie,
        PhaseConfig { alpha: 0.45, beta: 0.25, gamma: 0.15, delta: 0.08, theta: 0.07, learning_rate: 1.2, amygdala_threshold_override: None },
    );
    m.insert(
        Phase::Exploration,
        PhaseConfig { alpha: 0.35, beta: 0.2, gamma: 0.25, delta: 0.1, theta: 0.1, learning_rate: 1.1, amygdala_threshold_override: None },
    );
    m.insert(
        Phase::Anxiete,
        PhaseConfig { alpha: 0.5, beta: 0.15, gamma: 0.2, delta: 0.1, theta: 0.05, learning_rate: 0.8, amygdala_threshold_override: Some(0.8) },
    );
    m.insert(
        Phase::Peur,
        PhaseConfig { alpha: 0.6, beta: 0.1, gamma: 0.15, delta: 0.1, theta: 0.05, learning_rate: 0.5, amygdala_threshold_override: Some(0.7) },
    );
    m.insert(
        Phase::Tristesse,
        PhaseConfig { alpha: 0.4, beta: 0.2, gamma: 0.2, delta: 0.12, theta: 0.08, learning_rate: 0.7, amygdala_threshold_override: None },
    );
    m.insert(
        Phase::Degout,
        PhaseConfig { alpha: 0.45, beta: 0.15, gamma: 0.2, delta: 0.12, theta: 0.08, learning_rate: 0.8, amygdala_threshold_override: None },
    );
    m.insert(
        Phase::Confusion,
        PhaseConfig { alpha: 0.35, beta: 0.2, gamma: 0.25, delta: 0.1, theta: 0.1, learning_rate: 0.9, amygdala_threshold_override: None },
    );
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcee_types::ALL_PHASES;

    #[test]
    fn every_phase_has_a_config() {
        let table = default_phase_configs();
        for phase in ALL_PHASES {
            assert!(table.contains_key(&phase));
        }
    }

    #[test]
    fn peur_has_a_lower_amygdala_threshold() {
        let table = default_phase_configs();
        let peur = table.get(&Phase::Peur).unwrap();
        assert_eq!(peur.amygdala_threshold_override, Some(0.7));
    }
}
