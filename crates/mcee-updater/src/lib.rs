pub mod consciousness;
pub mod dynamics;

pub use consciousness::{ConsciousnessConfig, ConsciousnessEngine, ConsciousnessSnapshot, DominantState};
pub use dynamics::{global_emotion, global_variance, EmotionSnapshot, EmotionUpdater, EmotionalState};
