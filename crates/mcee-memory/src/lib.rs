//! Component E: the short-term memory manager. An id-keyed arena
//! rather than the owned
//! pointer graph the original C++ used; edges (owned by `mcee-dream`)
//! reference these ids, never the memories directly.

use std::collections::HashMap;
use std::sync::Arc;

use mcee_types::{clamp01, EmotionVector, Memory, MemoryKind, Phase, EMOTION_COUNT};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// A memory returned from a query, carrying the per-query scores the
/// caller needs without polluting the persisted `Memory` shape.
#[derive(Debug, Clone)]
pub struct MemoryMatch {
    pub memory: Memory,
    pub similarity: f64,
    pub activation_strength: f64,
}

#[derive(Default)]
struct Inner {
    memories: HashMap<Uuid, Memory>,
    phase_tags: HashMap<Uuid, Phase>,
}

/// Short-term memory buffer (MCT). Single `RwLock` guarding the whole
/// arena: one lock per buffer, released before compute.
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore { inner: Arc::new(RwLock::new(Inner::default())) }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `record(E_now, phase, context_tag)`. If `memory.id` already exists
    /// in the arena the two are merged (bump usage, refresh timestamp,
    /// keep the newer emotional vector) rather than duplicated —
    /// DESIGN.md Open Question 4.
    pub async fn record(&self, mut memory: Memory, phase: Phase) -> Uuid {
        let mut inner = self.inner.write().await;
        let id = memory.id;
        if let Some(existing) = inner.memories.get_mut(&id) {
            existing.usage_count += 1;
            existing.timestamp_ms = memory.timestamp_ms;
            existing.emotions = memory.emotions;
            existing.feedback = memory.feedback;
            debug!(%id, usage = existing.usage_count, "merged duplicate memory");
        } else {
            memory.usage_count = memory.usage_count.max(1);
            inner.phase_tags.insert(id, phase);
            inner.memories.insert(id, memory);
            info!(%id, ?phase, "recorded memory");
        }
        id
    }

    /// `query(phase, E_now, k)`: similarity (inverse Euclidean distance)
    /// combined with a phase-match bonus, top-k by combined score.
    pub async fn query(&self, phase: Phase, current: &EmotionVector, k: usize) -> Vec<MemoryMatch> {
        let inner = self.inner.read().await;
        let mut scored: Vec<(f64, MemoryMatch)> = inner
        .memories
        .values()
        .map(|memory| {
                let distance = current.euclidean_distance(&memory.emotions);
                let similarity = 1.0 / (1.0 + distance);
                let phase_bonus = if inner.phase_tags.get(&memory.id) == Some(&phase) {
                    0.2
                } else {
                    0.0
                };
                let activation_strength = (memory.usage_count as f64 / 10.0).min(1.0);
                let combined = similarity + phase_bonus;
                (combined, MemoryMatch { memory: memory.clone(), similarity, activation_strength })
        })
        .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(k).map(|(_, m)| m).collect()
    }

    /// `compute_influences(memories, delta) -> 24-vector`: weighted sum
    /// of `activation_strength * emotional_resonance * mem.vector`,
    /// normalised by the weight total, scaled by `delta`.
    pub fn compute_influences(matches: &[MemoryMatch], delta: f64) -> EmotionVector {
        let mut acc = [0.0; EMOTION_COUNT];
        let mut weight_total = 0.0;
        for m in matches {
            let weight = m.activation_strength * m.similarity;
            weight_total += weight;
            for i in 0..EMOTION_COUNT {
                acc[i] += weight * m.memory.emotions[i];
            }
        }
        let mut out = EmotionVector::zero();
        if weight_total > 0.0 {
            for i in 0..EMOTION_COUNT {
                out[i] = clamp01(delta * acc[i] / weight_total);
            }
        }
        out
    }

    /// `update_activation(memory, E_now)`: bumps usage and refreshes the
    /// timestamp without changing the stored emotional vector.
    pub async fn update_activation(&self, id: Uuid, now_ms: i64) {
        let mut inner = self.inner.write().await;
        if let Some(memory) = inner.memories.get_mut(&id) {
            memory.usage_count += 1;
            memory.timestamp_ms = now_ms;
        }
    }

    /// `create_potential_trauma(E_now)`: records a trauma memory when the
    /// base condition of (`phase == PEUR` and a critical
    /// gradient) holds. The additional `alert_flag` requirement from
    /// DESIGN.md Open Question 3 is enforced by the orchestrator before
    /// calling this.
    pub async fn create_potential_trauma(
        &self,
        emotions: EmotionVector,
        phase: Phase,
        is_critical: bool,
        context_tag: impl Into<String>,
        timestamp_ms: i64,
    ) -> Option<Uuid> {
        if phase != Phase::Peur || !is_critical {
            return None;
        }
        let mut memory = Memory::new(MemoryKind::Episodic, emotions, phase, context_tag, timestamp_ms);
        memory.is_trauma = true;
        let id = memory.id;
        let mut inner = self.inner.write().await;
        inner.phase_tags.insert(id, phase);
        inner.memories.insert(id, memory);
        info!(%id, "created potential trauma memory");
        Some(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.memories.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every memory currently held, used by the dream engine
    /// during SCAN without holding this store's lock across the whole
    /// phase.
    pub async fn snapshot(&self) -> Vec<Memory> {
        self.inner.read().await.memories.values().cloned().collect()
    }

    pub async fn remove(&self, id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.memories.remove(&id);
        inner.phase_tags.remove(&id);
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.memories.clear();
        inner.phase_tags.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_then_query_finds_closest_memory() {
        let store = MemoryStore::new();
        let mut e1 = EmotionVector::zero();
        e1[17] = 0.9;
        let memory = Memory::new(MemoryKind::Episodic, e1, Phase::Joie, "tag", 1000);
        store.record(memory, Phase::Joie).await;

        let mut query_vec = EmotionVector::zero();
        query_vec[17] = 0.85;
        let matches = store.query(Phase::Joie, &query_vec, 5).await;
        assert_eq!(matches.len(), 1);
        assert!(matches[0].similarity > 0.5);
    }

    #[tokio::test]
    async fn duplicate_id_merges_instead_of_duplicating() {
        let store = MemoryStore::new();
        let memory = Memory::new(MemoryKind::Episodic, EmotionVector::zero(), Phase::Serenite, "tag", 1000);
        let id = memory.id;
        store.record(memory.clone(), Phase::Serenite).await;
        let mut again = memory;
        again.timestamp_ms = 2000;
        store.record(again, Phase::Serenite).await;

        assert_eq!(store.len().await, 1);
        let snapshot = store.snapshot().await;
        let stored = snapshot.iter().find(|m| m.id == id).unwrap();
        assert_eq!(stored.usage_count, 2);
        assert_eq!(stored.timestamp_ms, 2000);
    }

    #[tokio::test]
    async fn trauma_requires_peur_and_critical() {
        let store = MemoryStore::new();
        let id = store
        .create_potential_trauma(EmotionVector::zero(), Phase::Joie, true, "tag", 1000)
        .await;
        assert!(id.is_none());

        let id = store
        .create_potential_trauma(EmotionVector::zero(), Phase::Peur, true, "tag", 1000)
        .await;
        assert!(id.is_some());
        assert_eq!(store.len().await, 1);
    }
}
