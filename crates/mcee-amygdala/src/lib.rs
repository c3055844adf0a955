//! Component F: the emergency ("amygdala") controller. Checks whether
//! the current state or any retrieved memory exceeds the adaptive alert
//! threshold and, if so, recommends an action and tells the orchestrator
//! to short-circuit the rest of the tick.

use mcee_types::{DangerLevel, EmotionVector};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyAction {
    Fuite,
    Blocage,
    Alerte,
    Surveillance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyResponse {
    pub action: EmergencyAction,
    pub danger_level: DangerLevel,
    pub trigger_gradients: Vec<(String, f64)>,
}

/// `check(E, memories, threshold)`: true when the current vector's max
/// exceeds the threshold, or any memory's own intensity does.
pub fn check(current: &EmotionVector, memory_intensities: &[f64], threshold: f64) -> bool {
    current.max() > threshold || memory_intensities.iter().any(|i| *i > threshold)
}

/// Maps a danger level to the recommended emergency action.
pub fn recommend(danger_level: DangerLevel) -> EmergencyAction {
    match danger_level {
        DangerLevel::Urgency => EmergencyAction::Fuite,
        DangerLevel::Critical => EmergencyAction::Blocage,
        DangerLevel::Alert => EmergencyAction::Alerte,
        DangerLevel::Surveillance | DangerLevel::Normal => EmergencyAction::Surveillance,
    }
}

/// Builds the full response once `check` has triggered.
pub fn respond(danger_level: DangerLevel, trigger_gradients: Vec<(String, f64)>) -> EmergencyResponse {
    let action = recommend(danger_level);
    warn!(?action, ?danger_level, "emergency response triggered");
    EmergencyResponse { action, danger_level, trigger_gradients }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_when_current_exceeds_threshold() {
        let mut e = EmotionVector::zero();
        e[14] = 0.95;
        assert!(check(&e, &[], 0.9));
    }

    #[test]
    fn triggers_when_a_memory_exceeds_threshold() {
        let e = EmotionVector::zero();
        assert!(check(&e, &[0.95], 0.9));
    }

    #[test]
    fn action_mapping_matches_danger_ladder() {
        assert_eq!(recommend(DangerLevel::Urgency), EmergencyAction::Fuite);
        assert_eq!(recommend(DangerLevel::Critical), EmergencyAction::Blocage);
        assert_eq!(recommend(DangerLevel::Alert), EmergencyAction::Alerte);
        assert_eq!(recommend(DangerLevel::Normal), EmergencyAction::Surveillance);
    }
}
