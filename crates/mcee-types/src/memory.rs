use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::emotion::EmotionVector;
use crate::phase::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Episodic,
    Semantic,
    Procedural,
    Autobiographic,
}

/// A short-term episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub kind: MemoryKind,
    pub is_social: bool,
    pub interlocutor: Option<String>,
    pub context_tag: String,
    pub emotions: EmotionVector,
    pub feedback: f64,
    pub usage_count: u32,
    pub decisional_influence: f64,
    pub is_trauma: bool,
    pub timestamp_ms: i64,
    #[serde(skip)]
    pub consolidation_score: f64,
}

impl Memory {
    pub fn new(
        kind: MemoryKind,
        emotions: EmotionVector,
        phase: Phase,
        context_tag: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        let _ = phase;
        Memory {
            id: Uuid::new_v4(),
            kind,
            is_social: false,
            interlocutor: None,
            context_tag: context_tag.into(),
            emotions,
            feedback: 0.0,
            usage_count: 1,
            decisional_influence: 0.0,
            is_trauma: false,
            timestamp_ms,
            consolidation_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRelation {
    Temporal,
    Emotional,
    Semantic,
    Causal,
    Stochastic,
    CausalAssociation,
}

/// An edge between two memories. Weight is in `(0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEdge {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub weight: f64,
    pub relation: EdgeRelation,
    pub last_activation_ms: i64,
}

/// Word → dominant-emotion causal link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalLink {
    pub word_lemma: String,
    pub word_pos: String,
    pub dominant_emotion_index: usize,
    pub causal_strength: f64,
    pub temporal_distance_ms: f64,
}
