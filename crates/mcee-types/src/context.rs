use serde::{Deserialize, Serialize};

use crate::emotion::EmotionVector;

/// Four physical sensor scalars, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSensors {
    pub temperature: f64,
    pub volume: f64,
    pub luminosity: f64,
    pub gyro_instability: f64,
}

/// Technical/system telemetry. Temperatures in degrees Celsius; the rest
/// are `[0, 1]` scalars (`stability` is 1.0 at perfect health).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalState {
    pub cpu_temp_c: f64,
    pub gpu_temp_c: f64,
    pub cpu_load: f64,
    pub ram_usage: f64,
    pub stability: f64,
}

/// Boolean external feedback signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFeedback {
    pub positive_validation: bool,
    pub encouragement: bool,
    pub external_alert: bool,
    pub social_interaction: bool,
}

impl ExternalFeedback {
    pub fn positive_count(&self) -> u32 {
        self.positive_validation as u32 + self.encouragement as u32
    }
}

/// Immutable snapshot of the environment for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub physical: PhysicalSensors,
    pub technical: TechnicalState,
    pub feedback: ExternalFeedback,
    pub timestamp_ms: i64,
}

/// Context label detected by the contextualiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLabel {
    StressTechnique,
    UrgencePhysique,
    JoieSociale,
    RoutineStable,
    ContexteGeneral,
}

impl Default for ContextLabel {
    fn default() -> Self {
        ContextLabel::ContexteGeneral
    }
}

/// Five-level danger classification, ordered so that integer
/// comparisons/indices match the outbound wire format (`0..4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum DangerLevel {
    Normal = 0,
    Surveillance = 1,
    Alert = 2,
    Critical = 3,
    Urgency = 4,
}

impl DangerLevel {
    pub fn as_index(&self) -> u8 {
        *self as u8
    }
}

/// Consolidation priority ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConsolidationPriority {
    Low = 0,
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Result of contextualising a raw emotion vector against a `Context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextualisedState {
    pub emotions: EmotionVector,
    pub emotion_globale: f64,
    pub context_label: ContextLabel,
    pub context_confidence: f64,
    pub danger_gradient: f64,
    pub danger_level: DangerLevel,
    pub alert_flag: bool,
    pub consolidate_flag: bool,
    pub consolidation_priority: ConsolidationPriority,
    pub significance: f64,
    pub coherence: f64,
    pub timestamp_ms: i64,
}
