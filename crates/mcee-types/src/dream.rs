use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Circadian dream-cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DreamState {
    Awake,
    DreamScan,
    DreamConsolidate,
    DreamExplore,
    DreamCleanup,
    Interrupted,
}

impl DreamState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DreamState::Awake => "AWAKE",
            DreamState::DreamScan => "DREAM_SCAN",
            DreamState::DreamConsolidate => "DREAM_CONSOLIDATE",
            DreamState::DreamExplore => "DREAM_EXPLORE",
            DreamState::DreamCleanup => "DREAM_CLEANUP",
            DreamState::Interrupted => "INTERRUPTED",
        }
    }

    pub fn is_dreaming(&self) -> bool {
        matches!(
            self,
            DreamState::DreamScan
            | DreamState::DreamConsolidate
            | DreamState::DreamExplore
            | DreamState::DreamCleanup
        )
    }
}

/// Outbound dream commands: the long-term store / graph sink consumes
/// these; the core never talks to that sink directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DreamCommand {
    Consolidate { memory_id: Uuid },
    CreateEdge { source_id: Uuid, target_id: Uuid, weight: f64, relation: String },
    ReinforceEdge { source_id: Uuid, target_id: Uuid, new_weight: f64 },
    Forget { memory_id: Uuid },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DreamStats {
    pub total_cycles_completed: u64,
    pub total_memories_consolidated: u64,
    pub total_memories_forgotten: u64,
    pub total_edges_created: u64,
    pub total_interruptions: u64,
    pub average_consolidation_score: f64,
}
