pub mod context;
pub mod dream;
pub mod emotion;
pub mod error;
pub mod memory;
pub mod phase;

pub use context::{
    ConsolidationPriority, Context, ContextLabel, ContextualisedState, ExternalFeedback,
    PhysicalSensors, TechnicalState,
};
pub use dream::{DreamCommand, DreamState, DreamStats};
pub use emotion::{EmotionVector, EMOTION_COUNT, EMOTION_NAMES};
pub use error::{clamp01, require_range, Error, Result};
pub use memory::{CausalLink, EdgeRelation, Memory, MemoryEdge, MemoryKind};
pub use phase::{Phase, PhaseConfig, PhaseTransition, ALL_PHASES};

/// Danger-level ordering used across the gradient classifier and the
/// amygdala controller must match the wire index (`0..4`); see
/// `DangerLevel`'s discriminants in `context.rs`.
pub use context::DangerLevel;
