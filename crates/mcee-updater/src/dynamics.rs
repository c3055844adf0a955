use std::collections::VecDeque;
use std::sync::Arc;

use mcee_types::{clamp01, EmotionVector, Memory, PhaseConfig, EMOTION_COUNT};
use tokio::sync::RwLock;
use tracing::debug;

const HISTORY_CAP: usize = 1000;
const DECAY_K: f64 = 0.02;

/// A timestamped copy of the emotion vector, kept for inspection/tests —
/// mirrors the snapshot-history idiom used for the Plutchik vector this
/// component's update loop is generalised from.
#[derive(Debug, Clone)]
pub struct EmotionSnapshot {
    pub emotions: EmotionVector,
    pub timestamp_ms: i64,
}

/// Shared, lock-guarded emotional state the orchestrator reads every
/// tick and the updater writes once per tick.
pub struct EmotionalState {
    pub current: Arc<RwLock<EmotionVector>>,
    pub history: Arc<RwLock<VecDeque<EmotionSnapshot>>>,
    pub global_energy: Arc<RwLock<f64>>,
}

impl Default for EmotionalState {
    fn default() -> Self {
        EmotionalState {
            current: Arc::new(RwLock::new(EmotionVector::zero())),
            history: Arc::new(RwLock::new(VecDeque::with_capacity(HISTORY_CAP))),
            global_energy: Arc::new(RwLock::new(0.0)),
        }
    }
}

impl EmotionalState {
    async fn push_history(&self, snapshot: EmotionSnapshot) {
        let mut history = self.history.write().await;
        if history.len() >= HISTORY_CAP {
            history.pop_front();
        }
        history.push_back(snapshot);
    }
}

/// Component D: the per-tick linear-combination emotion update.
/// `memory_influence` and `context_drive` are 24-vectors computed
/// upstream (memory manager and contextualiser respectively); `trend` is
/// the derivative estimate fed in by the orchestrator.
pub struct EmotionUpdater {
    pub state: EmotionalState,
}

impl Default for EmotionUpdater {
    fn default() -> Self {
        EmotionUpdater { state: EmotionalState::default() }
    }
}

impl EmotionUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one tick of the update rule and records the result. Never
    /// fails — invariants are enforced purely by clamping.
    pub async fn update(
        &self,
        feedback_total: f64,
        memory_influence: &EmotionVector,
        context_drive: &EmotionVector,
        wisdom: f64,
        trend: &EmotionVector,
        coeffs: &PhaseConfig,
        timestamp_ms: i64,
    ) -> EmotionVector {
        let mut current = self.state.current.write().await;
        let mut next = EmotionVector::zero();
        for i in 0..EMOTION_COUNT {
            let decay_term = -DECAY_K * current[i];
            next[i] = clamp01(
                current[i]
                + coeffs.alpha * feedback_total
                + coeffs.beta * memory_influence[i]
                + coeffs.gamma * context_drive[i]
                + coeffs.delta * decay_term
                + coeffs.theta * wisdom * trend[i],
            );
        }
        *current = next;
        debug!(mean = next.mean(), max = next.max(), "emotion tick applied");
        drop(current);

        self.state.push_history(EmotionSnapshot { emotions: next, timestamp_ms }).await;
        next
    }

    pub async fn snapshot(&self) -> EmotionVector {
        *self.state.current.read().await
    }
}

/// Maps a variance to `[0,1]` with a bounded squashing function.
fn squash_variance(variance: f64) -> f64 {
    1.0 - (-variance).exp()
}

/// `global_variance(E, memories)`: variance of `E` concatenated with each
/// memory's vector, squashed into `[0,1]`.
pub fn global_variance(current: &EmotionVector, memories: &[Memory]) -> f64 {
    let mut samples: Vec<&EmotionVector> = vec![current];
    for m in memories {
        samples.push(&m.emotions);
    }
    if samples.len() < 2 {
        return 0.0;
    }
    let mut sums = [0.0; EMOTION_COUNT];
    for v in &samples {
        for i in 0..EMOTION_COUNT {
            sums[i] += v[i];
        }
    }
    let n = samples.len() as f64;
    let means: Vec<f64> = sums.iter().map(|s| s / n).collect();
    let mut variance_sum = 0.0;
    for v in &samples {
        for i in 0..EMOTION_COUNT {
            variance_sum += (v[i] - means[i]).powi(2);
        }
    }
    let variance = variance_sum / (n * EMOTION_COUNT as f64);
    clamp01(squash_variance(variance))
}

/// `E_global(E, E_global_prev, Vg)`: low-pass over mean intensity,
/// penalised by variance.
pub fn global_emotion(current: &EmotionVector, previous: f64, variance: f64) -> f64 {
    clamp01(0.9 * previous + 0.1 * current.mean() - 0.2 * variance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_stays_within_unit_interval() {
        let updater = EmotionUpdater::new();
        let influence = EmotionVector::zero();
        let drive = EmotionVector::zero();
        let trend = EmotionVector::zero();
        let coeffs = PhaseConfig::default();
        for tick in 0..50 {
            let out = updater
            .update(1.0, &influence, &drive, 1.0, &trend, &coeffs, tick * 100)
            .await;
            for v in out.as_slice() {
                assert!((0.0..=1.0).contains(v));
            }
        }
    }

    #[test]
    fn global_variance_is_bounded() {
        let current = EmotionVector::zero();
        let memories = vec![];
        assert_eq!(global_variance(&current, &memories), 0.0);
    }

    #[test]
    fn global_emotion_is_low_pass() {
        let current = EmotionVector::zero();
        let v = global_emotion(&current, 0.5, 0.0);
        assert!((v - 0.45).abs() < 1e-9);
    }
}
