//! Component G: the dream cycle engine. A faithful async-Rust
//! translation of the original `DreamEngine`'s circadian state machine,
//! Csocial scoring, stochastic/causal association, and trauma-protected
//! forgetting, with its callback members replaced by a `DreamSink` the
//! caller implements.

mod config;

pub use config::DreamConfig;

use mcee_memory::MemoryStore;
use mcee_types::{CausalLink, DreamCommand, DreamStats, EmotionVector, Memory, Phase};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::info;
use uuid::Uuid;

pub use mcee_types::DreamState;

pub trait DreamSink {
    fn emit(&mut self, command: DreamCommand);
}

#[derive(Default)]
pub struct VecSink(pub Vec<DreamCommand>);

impl DreamSink for VecSink {
    fn emit(&mut self, command: DreamCommand) {
        self.0.push(command);
    }
}

fn can_create_association(a: &Memory, b: &Memory) -> bool {
    if a.kind == b.kind {
        return true;
    }
    if !a.context_tag.is_empty() && a.context_tag == b.context_tag {
        return true;
    }
    match (&a.interlocutor, &b.interlocutor) {
        (Some(x), Some(y)) if !x.is_empty() && x == y => return true,
        _ => {}
    }
    a.emotions.euclidean_distance(&b.emotions) < 1.0
}

pub struct DreamEngine {
    config: DreamConfig,
    current_state: DreamState,
    cycle_start_ms: i64,
    last_dream_end_ms: i64,
    phase_start_ms: i64,
    current_emotions: EmotionVector,
    active_phase: Phase,
    scored_memories: Vec<Memory>,
    causal_links: Vec<CausalLink>,
    top_trigger_words: Vec<String>,
    stats: DreamStats,
    rng: StdRng,
}

impl DreamEngine {
    pub fn new(config: DreamConfig, now_ms: i64) -> Self {
        DreamEngine {
            config,
            current_state: DreamState::Awake,
            cycle_start_ms: now_ms,
            last_dream_end_ms: now_ms,
            phase_start_ms: now_ms,
            current_emotions: EmotionVector::zero(),
            active_phase: Phase::Serenite,
            scored_memories: Vec::new(),
            causal_links: Vec::new(),
            top_trigger_words: Vec::new(),
            stats: DreamStats::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic constructor for tests: a seeded RNG makes the
    /// stochastic-association phase reproducible.
    pub fn with_seed(config: DreamConfig, now_ms: i64, seed: u64) -> Self {
        let mut engine = Self::new(config, now_ms);
        engine.rng = StdRng::seed_from_u64(seed);
        engine
    }

    pub fn current_state(&self) -> DreamState {
        self.current_state
    }

    pub fn stats(&self) -> DreamStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DreamStats::default();
    }

    pub fn cycle_progress(&self, now_ms: i64) -> f64 {
        let elapsed_s = (now_ms - self.cycle_start_ms).max(0) as f64 / 1000.0;
        self.config.cycle_position(elapsed_s)
    }

    pub fn dream_phase_progress(&self, now_ms: i64) -> f64 {
        let elapsed_ms = (now_ms - self.phase_start_ms).max(0) as f64;
        let duration_ms = self.phase_duration_ms(self.current_state) as f64;
        if duration_ms <= 0.0 {
            0.0
        } else {
            (elapsed_ms / duration_ms).clamp(0.0, 1.0)
        }
    }

    pub fn time_since_last_dream_s(&self, now_ms: i64) -> f64 {
        (now_ms - self.last_dream_end_ms).max(0) as f64 / 1000.0
    }

    pub fn can_start_dream(&self, mct_non_empty: bool, mean_intensity: f64, alert: bool, now_ms: i64) -> bool {
        self.should_start_dream(self.active_phase, alert, mct_non_empty, mean_intensity, now_ms)
    }

    fn phase_duration_ms(&self, state: DreamState) -> i64 {
        let seconds = match state {
            DreamState::DreamScan => self.config.scan_duration_s(),
            DreamState::DreamConsolidate => self.config.consolidate_duration_s(),
            DreamState::DreamExplore => self.config.explore_duration_s(),
            DreamState::DreamCleanup => self.config.cleanup_duration_s(),
            DreamState::Awake | DreamState::Interrupted => 0.0,
        };
        (seconds * 1000.0) as i64
    }

    fn should_start_dream(
        &self,
        phase: Phase,
        alert: bool,
        mct_non_empty: bool,
        mean_intensity: f64,
        now_ms: i64,
    ) -> bool {
        if alert || !mct_non_empty {
            return false;
        }
        if self.config.block_dream_on_peur && phase == Phase::Peur {
            return false;
        }
        if self.config.block_dream_on_anxiete && phase == Phase::Anxiete {
            return false;
        }
        if self.time_since_last_dream_s(now_ms) < self.config.min_time_since_last_dream_s {
            return false;
        }
        mean_intensity <= self.config.max_emotional_activity_for_dream
    }

    fn transition_to(&mut self, new_state: DreamState, now_ms: i64) {
        info!(from = self.current_state.as_str(), to = new_state.as_str(), "dream state transition");
        self.current_state = new_state;
        self.phase_start_ms = now_ms;
    }

    /// `update(current_emotions, active_phase, amyghaleon_alert)`: the
    /// regular tick, driven by the caller's notion of "now" so the cycle
    /// is deterministic under test.
    pub async fn update(
        &mut self,
        current_emotions: EmotionVector,
        active_phase: Phase,
        amyghaleon_alert: bool,
        now_ms: i64,
        memory_store: &MemoryStore,
        sink: &mut dyn DreamSink,
    ) -> DreamState {
        self.current_emotions = current_emotions;
        self.active_phase = active_phase;

        if amyghaleon_alert && self.current_state.is_dreaming() {
            self.stats.total_interruptions += 1;
            self.transition_to(DreamState::Interrupted, now_ms);
            return self.current_state;
        }

        if self.current_state == DreamState::Interrupted {
            if !amyghaleon_alert {
                self.last_dream_end_ms = now_ms;
                self.cycle_start_ms = now_ms;
                self.transition_to(DreamState::Awake, now_ms);
            }
            return self.current_state;
        }

        if self.current_state == DreamState::Awake {
            let mct_non_empty = !memory_store.is_empty().await;
            if self.should_start_dream(active_phase, amyghaleon_alert, mct_non_empty, current_emotions.mean(), now_ms)
            {
                self.transition_to(DreamState::DreamScan, now_ms);
            }
            return self.current_state;
        }

        let elapsed = now_ms - self.phase_start_ms;
        if elapsed < self.phase_duration_ms(self.current_state) {
            return self.current_state;
        }

        match self.current_state {
            DreamState::DreamScan => {
                self.execute_scan_phase(memory_store).await;
                self.transition_to(DreamState::DreamConsolidate, now_ms);
            }
            DreamState::DreamConsolidate => {
                self.execute_consolidate_phase(sink);
                self.transition_to(DreamState::DreamExplore, now_ms);
            }
            DreamState::DreamExplore => {
                self.execute_explore_phase(sink);
                self.transition_to(DreamState::DreamCleanup, now_ms);
            }
            DreamState::DreamCleanup => {
                self.execute_cleanup_phase(memory_store, sink).await;
                self.cycle_start_ms = now_ms;
                self.stats.total_cycles_completed += 1;
                self.transition_to(DreamState::Awake, now_ms);
            }
            DreamState::Awake | DreamState::Interrupted => unreachable!(),
        }

        self.current_state
    }

    pub fn force_dream_start(&mut self, now_ms: i64) {
        if self.current_state == DreamState::Awake {
            self.transition_to(DreamState::DreamScan, now_ms);
        }
    }

    pub fn interrupt_dream(&mut self, now_ms: i64) {
        if self.current_state.is_dreaming() {
            self.stats.total_interruptions += 1;
            self.transition_to(DreamState::Interrupted, now_ms);
        }
    }

    pub fn ingest_causal_snapshot(&mut self, links: Vec<CausalLink>, top_trigger_words: Vec<String>) {
        self.causal_links = links;
        self.top_trigger_words = top_trigger_words;
    }

    fn calculate_consolidation_score(&self, memory: &Memory) -> f64 {
        let distance = self.current_emotions.normalised_distance(&memory.emotions);
        let mut score = self.config.rho * distance
        + self.config.lambda * memory.feedback
        + self.config.eta * ((1.0 + memory.usage_count as f64).ln() / 5.0).min(1.0)
        + self.config.theta * memory.decisional_influence;
        if memory.is_social {
            score *= 1.2;
        }
        if memory.is_trauma {
            score = score.max(self.config.consolidation_threshold * 2.0);
        }
        score.clamp(0.0, 1.0)
    }

    async fn execute_scan_phase(&mut self, memory_store: &MemoryStore) {
        let mut memories = memory_store.snapshot().await;
        for memory in memories.iter_mut() {
            memory.consolidation_score = self.calculate_consolidation_score(memory);
        }
        memories.sort_by(|a, b| b.consolidation_score.partial_cmp(&a.consolidation_score).unwrap());
        self.scored_memories = memories;
    }

    fn execute_consolidate_phase(&mut self, sink: &mut dyn DreamSink) {
        let mut consolidated = 0u64;
        let mut score_sum = 0.0;
        for memory in &self.scored_memories {
            if memory.consolidation_score >= self.config.consolidation_threshold || memory.is_trauma {
                sink.emit(DreamCommand::Consolidate { memory_id: memory.id });
                consolidated += 1;
                score_sum += memory.consolidation_score;
            }
        }
        if consolidated > 0 {
            self.stats.total_memories_consolidated += consolidated;
            let total_seen = self.stats.total_memories_consolidated as f64;
            self.stats.average_consolidation_score +=
            (score_sum / consolidated as f64 - self.stats.average_consolidation_score) * (consolidated as f64 / total_seen);
        }

        let top: Vec<&Memory> = self.scored_memories.iter().take(10).collect();
        for i in 0..top.len() {
            for j in (i + 1)..top.len() {
                if can_create_association(top[i], top[j]) {
                    let weight = ((top[i].consolidation_score + top[j].consolidation_score) / 2.0
                    * self.config.reinforcement_factor)
                    .min(1.0);
                    sink.emit(DreamCommand::ReinforceEdge {
                            source_id: top[i].id,
                            target_id: top[j].id,
                            new_weight: weight,
                    });
                }
            }
        }
    }

    fn execute_explore_phase(&mut self, sink: &mut dyn DreamSink) {
        let sigma = self.config.sigma_for(self.active_phase);
        let normal = Normal::new(0.0, sigma).expect("sigma must be positive");
        let n = self.scored_memories.len();
        for i in 0..n {
            for j in (i + 2)..n {
                let noise: f64 = normal.sample(&mut self.rng).abs();
                if noise <= sigma / 2.0 {
                    continue;
                }
                let distance = self.scored_memories[i].emotions.normalised_distance(&self.scored_memories[j].emotions);
                let similarity = (1.0 - distance).max(0.0);
                if similarity + noise > 0.6 {
                    sink.emit(DreamCommand::CreateEdge {
                            source_id: self.scored_memories[i].id,
                            target_id: self.scored_memories[j].id,
                            weight: (similarity * noise).min(1.0),
                            relation: "stochastic".to_string(),
                    });
                    self.stats.total_edges_created += 1;
                }
            }
        }
        self.explore_causal_associations(sink);
    }

    fn explore_causal_associations(&mut self, sink: &mut dyn DreamSink) {
        use std::collections::HashMap;
        let mut by_word: HashMap<&str, Vec<(&Memory, &CausalLink)>> = HashMap::new();
        for link in &self.causal_links {
            for memory in &self.scored_memories {
                if memory.emotions.index_of_dominant() == link.dominant_emotion_index {
                    by_word.entry(link.word_lemma.as_str()).or_default().push((memory, link));
                }
            }
        }
        for group in by_word.values() {
            let limited: Vec<&(&Memory, &CausalLink)> = group.iter().take(5).collect();
            for i in 0..limited.len() {
                for j in (i + 1)..limited.len().min(5) {
                    let (mem_a, link) = limited[i];
                    let (mem_b, _) = limited[j];
                    if mem_a.id == mem_b.id {
                        continue;
                    }
                    sink.emit(DreamCommand::CreateEdge {
                            source_id: mem_a.id,
                            target_id: mem_b.id,
                            weight: (link.causal_strength * 0.8).min(1.0),
                            relation: "causal_association".to_string(),
                    });
                    self.stats.total_edges_created += 1;
                }
            }
        }
    }

    async fn execute_cleanup_phase(&mut self, memory_store: &MemoryStore, sink: &mut dyn DreamSink) {
        let mut forgotten = 0u64;
        for memory in &self.scored_memories {
            if memory.is_trauma {
                continue;
            }
            let decayed = memory.consolidation_score * (-self.config.forget_decay_rate).exp();
            if decayed < self.config.min_weight_before_deletion {
                sink.emit(DreamCommand::Forget { memory_id: memory.id });
                forgotten += 1;
            }
        }
        self.stats.total_memories_forgotten += forgotten;
        memory_store.clear().await;
        self.scored_memories.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcee_types::MemoryKind;

    fn memory(is_trauma: bool, feedback: f64) -> Memory {
        let mut m = Memory::new(MemoryKind::Episodic, EmotionVector::zero(), Phase::Serenite, "tag", 0);
        m.is_trauma = is_trauma;
        m.feedback = feedback;
        m
    }

    #[tokio::test]
    async fn empty_mct_blocks_dream_start() {
        let store = MemoryStore::new();
        let mut engine = DreamEngine::with_seed(DreamConfig::default(), 0, 1);
        let mut sink = VecSink::default();
        let state = engine
        .update(EmotionVector::zero(), Phase::Serenite, false, 100_000_000, &store, &mut sink)
        .await;
        assert_eq!(state, DreamState::Awake);
    }

    #[tokio::test]
    async fn trauma_is_never_forgotten_and_always_consolidated() {
        let store = MemoryStore::new();
        let mut trauma = memory(true, 0.0);
        trauma.id = Uuid::new_v4();
        let trauma_id = trauma.id;
        store.record(trauma, Phase::Peur).await;

        let mut cfg = DreamConfig::default();
        cfg.consolidation_threshold = 0.99;
        cfg.min_time_since_last_dream_s = 0.0;
        let mut engine = DreamEngine::with_seed(cfg, 0, 7);
        let mut sink = VecSink::default();

        engine.force_dream_start(0);
        engine.execute_scan_phase(&store).await;
        engine.execute_consolidate_phase(&mut sink);

        let consolidate_count = sink
        .0
        .iter()
        .filter(|c| matches!(c, DreamCommand::Consolidate { memory_id } if *memory_id == trauma_id))
        .count();
        assert_eq!(consolidate_count, 1);
        assert!(sink.0.iter().all(|c| !matches!(c, DreamCommand::Forget { memory_id } if *memory_id == trauma_id)));
    }

    #[tokio::test]
    async fn interrupted_dream_resumes_to_awake() {
        let store = MemoryStore::new();
        let mut engine = DreamEngine::with_seed(DreamConfig::default(), 0, 3);
        let mut sink = VecSink::default();
        engine.force_dream_start(0);
        let _ = engine.update(EmotionVector::zero(), Phase::Serenite, false, 0, &store, &mut sink).await;
        // force into explore, then interrupt
        engine.current_state = DreamState::DreamExplore;
        let state = engine.update(EmotionVector::zero(), Phase::Serenite, true, 10, &store, &mut sink).await;
        assert_eq!(state, DreamState::Interrupted);
        assert_eq!(engine.stats().total_interruptions, 1);

        let state = engine.update(EmotionVector::zero(), Phase::Serenite, false, 20, &store, &mut sink).await;
        assert_eq!(state, DreamState::Awake);
    }
}
