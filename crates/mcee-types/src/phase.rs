use serde::{Deserialize, Serialize};

/// Discrete behavioural regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Serenite,
    Joie,
    Exploration,
    Anxiete,
    Peur,
    Tristesse,
    Degout,
    Confusion,
}

pub const ALL_PHASES: [Phase; 8] = [
    Phase::Serenite,
    Phase::Joie,
    Phase::Exploration,
    Phase::Anxiete,
    Phase::Peur,
    Phase::Tristesse,
    Phase::Degout,
    Phase::Confusion,
];

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Serenite => "SERENITE",
            Phase::Joie => "JOIE",
            Phase::Exploration => "EXPLORATION",
            Phase::Anxiete => "ANXIETE",
            Phase::Peur => "PEUR",
            Phase::Tristesse => "TRISTESSE",
            Phase::Degout => "DEGOUT",
            Phase::Confusion => "CONFUSION",
        }
    }
}

/// Per-phase update coefficients. Authoritative at
/// runtime over any startup-default parameter set (DESIGN.md, Open
/// Question 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub theta: f64,
    pub learning_rate: f64,
    pub amygdala_threshold_override: Option<f64>,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        PhaseConfig {
            alpha: 0.5,
            beta: 0.2,
            gamma: 0.2,
            delta: 0.05,
            theta: 0.05,
            learning_rate: 1.0,
            amygdala_threshold_override: None,
        }
    }
}

/// A single phase transition, emitted onto the registered sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub duration_in_from_ms: i64,
    pub forced: bool,
    pub reason: Option<&'static str>,
}
