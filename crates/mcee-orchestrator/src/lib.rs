//! Component H: the pipeline orchestrator. Wires A→B→C→D→E→F→G into a
//! single ordered tick, behind a shared-state policy of one lock per
//! buffer, released before compute.

mod metrics;
mod phase_table;

pub use metrics::Metrics;
pub use phase_table::default_phase_configs;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use mcee_amygdala::{self as amygdala, EmergencyResponse};
use mcee_context::{ContextConfig, Contextualiser};
use mcee_dream::{DreamConfig, DreamEngine, DreamSink, DreamState};
use mcee_memory::MemoryStore;
use mcee_phase::{default_profiles, PhaseDetector, TransitionSink};
use mcee_types::{
    Context, ContextualisedState, EmotionVector, Error, MemoryKind, Phase, PhaseConfig, Result,
};
use mcee_updater::{
    global_emotion, global_variance, ConsciousnessConfig, ConsciousnessEngine, ConsciousnessSnapshot,
    EmotionUpdater,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

const FEAR_DWELL_DECAY_MS: i64 = 60_000;
const FEAR_DWELL_FORCE_TRANSITION_MS: i64 = 300_000;
const FEAR_DECAY_FACTOR: f64 = 0.95;
const FEAR_FORCE_TRANSITION_CEILING: f64 = 0.6;
const WISDOM_PEUR_DECAY: f64 = 0.95;
const WISDOM_GROWTH_SCALE: f64 = 0.001;

/// Scalar feedback the host application sets out of band; distinct from the boolean `ExternalFeedback`
/// carried inside `Context`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Feedback {
    pub external: f64,
    pub internal: f64,
}

impl Feedback {
    pub fn total(&self) -> f64 {
        ((self.external + self.internal) / 2.0).clamp(-1.0, 1.0)
    }

    /// Merges newly-observed external feedback (e.g. from a text-sentiment
    /// channel) with the existing value, 30/70 weighted toward the new
    /// reading, matching the original engine's speech-feedback blend.
    pub fn blend_external(&mut self, new_value: f64) {
        self.external = (self.external * 0.3 + new_value * 0.7).clamp(-1.0, 1.0);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub phase_transitions: u64,
    pub emergency_triggers: u64,
    pub wisdom: f64,
}

/// Everything a tick publishes: the contextualised state, the active
/// phase, the post-update emotions/energy/variance, and (if triggered)
/// the emergency response.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub contextualised: ContextualisedState,
    pub phase: Phase,
    pub emotions: EmotionVector,
    pub global_energy: f64,
    pub global_variance: f64,
    pub consciousness: ConsciousnessSnapshot,
    pub wisdom: f64,
    pub emergency: Option<EmergencyResponse>,
    pub auto_memory_id: Option<uuid::Uuid>,
    pub trauma_id: Option<uuid::Uuid>,
    pub processing_ms: f64,
}

struct PhaseState {
    detector: PhaseDetector,
    configs: HashMap<Phase, PhaseConfig>,
}

/// Holds every component and the cross-tick state the pipeline needs.
/// Single-writer fields are behind `tokio::sync::RwLock` so a consumer
/// task and the processing task never observe a torn read.
pub struct Orchestrator {
    contextualiser: RwLock<Contextualiser>,
    phase: RwLock<PhaseState>,
    updater: EmotionUpdater,
    memory: Arc<MemoryStore>,
    dream: RwLock<DreamEngine>,
    consciousness: RwLock<ConsciousnessEngine>,
    feedback: RwLock<Feedback>,
    wisdom: RwLock<f64>,
    previous_global_energy: RwLock<f64>,
    previous_emotions: RwLock<EmotionVector>,
    stats: RwLock<Stats>,
    metrics: Metrics,
}

impl Orchestrator {
    pub fn new(now_ms: i64) -> Self {
        Orchestrator {
            contextualiser: RwLock::new(Contextualiser::new(ContextConfig::default())),
            phase: RwLock::new(PhaseState {
                    detector: PhaseDetector::new(default_profiles(), Phase::Serenite, now_ms),
                    configs: default_phase_configs(),
            }),
            updater: EmotionUpdater::new(),
            memory: Arc::new(MemoryStore::new()),
            dream: RwLock::new(DreamEngine::new(DreamConfig::default(), now_ms)),
            consciousness: RwLock::new(ConsciousnessEngine::new(ConsciousnessConfig::default())),
            feedback: RwLock::new(Feedback::default()),
            wisdom: RwLock::new(0.5),
            previous_global_energy: RwLock::new(0.0),
            previous_emotions: RwLock::new(EmotionVector::zero()),
            stats: RwLock::new(Stats::default()),
            metrics: Metrics::new(),
        }
    }

    pub fn memory_store(&self) -> Arc<MemoryStore> {
        self.memory.clone()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    pub async fn set_feedback(&self, external: f64, internal: f64) {
        let mut fb = self.feedback.write().await;
        fb.external = external.clamp(-1.0, 1.0);
        fb.internal = internal.clamp(-1.0, 1.0);
    }

    pub async fn blend_external_feedback(&self, new_value: f64) {
        let mut fb = self.feedback.write().await;
        fb.blend_external(new_value);
    }

    /// Feeds an externally-reported trauma signal into the contextualiser's
    /// `global_danger` term (spec.md §4.A); clamped to `[0,1]` there.
    pub async fn set_trauma_signal(&self, value: f64) {
        self.contextualiser.write().await.set_trauma_signal(value);
    }

    pub async fn stats(&self) -> Stats {
        *self.stats.read().await
    }

    pub async fn force_phase_transition(&self, phase: Phase, reason: &'static str, now_ms: i64) {
        let mut state = self.phase.write().await;
        let mut sink = CountingSink { transitions: 0 };
        state.detector.force_transition(phase, reason, now_ms, &mut sink);
        drop(state);
        if sink.transitions > 0 {
            self.stats.write().await.phase_transitions += sink.transitions;
        }
    }

    /// Runs one full tick of the pipeline.
    pub async fn tick(&self, raw: &EmotionVector, ctx: &Context, now_ms: i64) -> Result<TickOutcome> {
        let start = Instant::now();

        // 1-2. Contextualise + classify danger.
        let contextualised = self.contextualiser.write().await.contextualise(raw, ctx)?;

        // 3. Detect phase using the contextualised vector; pick up its config.
        let (phase, phase_config, phase_transitioned) = {
            let mut state = self.phase.write().await;
            let mut sink = CountingSink { transitions: 0 };
            let phase = state.detector.detect(&contextualised.emotions, now_ms, &mut sink);
            let config = *state
            .configs
            .get(&phase)
            .ok_or_else(|| Error::InvariantViolation {
                    component: "mcee-orchestrator".to_string(),
                    detail: format!("no PhaseConfig for {:?}", phase),
            })?;
            (phase, config, sink.transitions)
        };
        if phase_transitioned > 0 {
            self.stats.write().await.phase_transitions += phase_transitioned;
        }

        // 4. Retrieve top-k memories and compute influence.
        let matches = self.memory.query(phase, &contextualised.emotions, 10).await;
        for m in &matches {
            self.memory.update_activation(m.memory.id, now_ms).await;
        }
        let memory_influence = MemoryStore::compute_influences(&matches, phase_config.delta);
        let memory_intensities: Vec<f64> = matches.iter().map(|m| m.memory.emotions.max()).collect();

        // 5. Emergency check; short-circuits the rest of the tick.
        let threshold = phase_config
        .amygdala_threshold_override
        .unwrap_or_else(|| mcee_gradients::adaptive_alert_threshold(contextualised.danger_gradient, &ContextConfig::default().gradients));
        if amygdala::check(&contextualised.emotions, &memory_intensities, threshold) {
            let response = amygdala::respond(
                contextualised.danger_level,
                vec![("danger_gradient".to_string(), contextualised.danger_gradient)],
            );
            self.stats.write().await.emergency_triggers += 1;

            let trauma_id = self
            .memory
            .create_potential_trauma(
                contextualised.emotions,
                phase,
                contextualised.alert_flag,
                "emergency",
                now_ms,
            )
            .await;

            let wisdom = *self.wisdom.read().await;
            let global_energy = *self.previous_global_energy.read().await;
            info!(?phase, action = ?response.action, "tick short-circuited by emergency controller");
            return Ok(TickOutcome {
                    contextualised,
                    phase,
                    emotions: *self.updater.state.current.read().await,
                    global_energy,
                    global_variance: 0.0,
                    consciousness: self.consciousness.write().await.update(wisdom, 0.0, 0.0, 1.0, 0.0, 0.0),
                    wisdom,
                    emergency: Some(response),
                    auto_memory_id: None,
                    trauma_id,
                    processing_ms: start.elapsed().as_secs_f64() * 1000.0,
            });
        }

        // 6. Update emotions with memory influence, feedback, wisdom, trend.
        let feedback_total = self.feedback.read().await.total();
        let previous = *self.previous_emotions.read().await;
        let mut trend = EmotionVector::zero();
        for i in 0..mcee_types::EMOTION_COUNT {
            trend[i] = contextualised.emotions[i] - previous[i];
        }
        let wisdom_before = *self.wisdom.read().await;
        let next_emotions = self
        .updater
        .update(
            feedback_total,
            &memory_influence,
            &contextualised.emotions,
            wisdom_before,
            &trend,
            &phase_config,
            now_ms,
        )
        .await;
        *self.previous_emotions.write().await = contextualised.emotions;

        // 7. Update wisdom.
        let wisdom = {
            let mut w = self.wisdom.write().await;
            *w = if phase == Phase::Peur {
                *w * WISDOM_PEUR_DECAY
            } else {
                *w + phase_config.learning_rate * WISDOM_GROWTH_SCALE
            }
            .clamp(0.0, 1.0);
            self.stats.write().await.wisdom = *w;
            *w
        };

        // 8. Phase-specific fear-loop handling.
        if phase == Phase::Peur {
            self.handle_fear_loop(now_ms).await;
        }

        let memories_snapshot = self.memory.snapshot().await;
        let variance = global_variance(&next_emotions, &memories_snapshot);
        let previous_global_energy = *self.previous_global_energy.read().await;
        let energy = global_emotion(&next_emotions, previous_global_energy, variance);
        *self.previous_global_energy.write().await = energy;

        // 9. `consolidate_flag ⇒ M` is recorded into the MCT before publish
        // (spec.md:63); the flag already folds the significance-vs-adaptive-mlt
        // test (spec.md:102), so no separate intensity threshold is applied here.
        let auto_memory_id = if contextualised.consolidate_flag {
            let dominant = next_emotions.dominant_name();
            let tag = format!("auto_{dominant}_{now_ms}");
            let memory = mcee_types::Memory::new(MemoryKind::Episodic, next_emotions, phase, tag, now_ms);
            Some(self.memory.record(memory, phase).await)
        } else {
            None
        };

        let emotional_contrib = next_emotions.mean();
        let memory_contrib = if matches.is_empty() {
            0.0
        } else {
            matches.iter().map(|m| m.activation_strength * m.similarity).sum::<f64>() / matches.len() as f64
        };
        let max_trauma_intensity = memories_snapshot
        .iter()
        .filter(|m| m.is_trauma)
        .map(|m| m.emotions.max())
        .fold(0.0_f64, f64::max);
        let consciousness = self.consciousness.write().await.update(
            wisdom,
            emotional_contrib,
            memory_contrib,
            max_trauma_intensity,
            feedback_total,
            contextualised.danger_gradient,
        );

        Ok(TickOutcome {
                contextualised,
                phase,
                emotions: next_emotions,
                global_energy: energy,
                global_variance: variance,
                consciousness,
                wisdom,
                emergency: None,
                auto_memory_id,
                trauma_id: None,
                processing_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    async fn handle_fear_loop(&self, now_ms: i64) {
        let dwell_ms = {
            let state = self.phase.read().await;
            state.detector.time_in_phase_ms(now_ms)
        };
        if dwell_ms <= FEAR_DWELL_DECAY_MS {
            return;
        }

        let mut current = self.updater.state.current.write().await;
        const FEAR_INDEX: usize = 14;
        const HORROR_INDEX: usize = 15;
        current[FEAR_INDEX] *= FEAR_DECAY_FACTOR;
        current[HORROR_INDEX] *= FEAR_DECAY_FACTOR;
        let (fear, horror) = (current[FEAR_INDEX], current[HORROR_INDEX]);
        drop(current);

        warn!(dwell_ms, "forced fear-index decay in PEUR phase");

        if dwell_ms > FEAR_DWELL_FORCE_TRANSITION_MS && fear.max(horror) < FEAR_FORCE_TRANSITION_CEILING {
            self.force_phase_transition(Phase::Anxiete, "FEAR_TIMEOUT", now_ms).await;
        }
    }

    /// Ticks the dream engine independently of the main pipeline; `alert` should reflect the most recent
    /// tick's emergency flag.
    pub async fn dream_tick(&self, alert: bool, now_ms: i64, sink: &mut dyn DreamSink) -> DreamState {
        let emotions = *self.updater.state.current.read().await;
        let phase = self.phase.read().await.detector.current_phase();
        self.dream.write().await.update(emotions, phase, alert, now_ms, &self.memory, sink).await
    }

    pub async fn force_dream_start(&self, now_ms: i64) {
        self.dream.write().await.force_dream_start(now_ms);
    }

    pub async fn interrupt_dream(&self, now_ms: i64) {
        self.dream.write().await.interrupt_dream(now_ms);
    }

    pub async fn record_processing_time(&self, elapsed_ms: f64) {
        self.metrics.record(elapsed_ms).await;
    }

    /// Snapshot of the dream engine for the outbound "Dream status"
    /// message: state name, cycle/phase progress, time since
    /// the last dream, and the running counters.
    pub async fn dream_status(&self, now_ms: i64) -> DreamStatus {
        let dream = self.dream.read().await;
        DreamStatus {
            state: dream.current_state(),
            cycle_progress: dream.cycle_progress(now_ms),
            phase_progress: dream.dream_phase_progress(now_ms),
            seconds_since_last_dream: dream.time_since_last_dream_s(now_ms),
            stats: dream.stats(),
        }
    }

    pub async fn clear_memory_store(&self) {
        self.memory.clear().await;
    }

    pub async fn reset_dream_stats(&self) {
        self.dream.write().await.reset_stats();
    }
}

/// Everything [`Orchestrator::dream_status`] exposes for the outbound
/// dream-status message; kept separate from [`mcee_dream::DreamEngine`]
/// so callers don't need a lock held across the read.
#[derive(Debug, Clone, Copy)]
pub struct DreamStatus {
    pub state: DreamState,
    pub cycle_progress: f64,
    pub phase_progress: f64,
    pub seconds_since_last_dream: f64,
    pub stats: mcee_types::DreamStats,
}

struct CountingSink {
    transitions: u64,
}

impl TransitionSink for CountingSink {
    fn emit(&mut self, transition: mcee_types::PhaseTransition) {
        self.transitions += 1;
        info!(
            from = transition.from.as_str(),
            to = transition.to.as_str(),
            forced = transition.forced,
            "phase transition"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcee_types::{ExternalFeedback, PhysicalSensors, TechnicalState};

    fn calm_context(ts: i64) -> Context {
        Context {
            physical: PhysicalSensors { temperature: 0.3, volume: 0.2, luminosity: 0.5, gyro_instability: 0.1 },
            technical: TechnicalState { cpu_temp_c: 50.0, gpu_temp_c: 55.0, cpu_load: 0.2, ram_usage: 0.3, stability: 0.99 },
            feedback: ExternalFeedback { positive_validation: true, encouragement: false, external_alert: false, social_interaction: false },
            timestamp_ms: ts,
        }
    }

    #[tokio::test]
    async fn nominal_tick_produces_an_outcome_without_emergency() {
        let orchestrator = Orchestrator::new(0);
        let raw = EmotionVector::zero();
        let ctx = calm_context(1000);
        let outcome = orchestrator.tick(&raw, &ctx, 1000).await.unwrap();
        assert!(outcome.emergency.is_none());
        assert!((0.0..=1.0).contains(&outcome.global_energy));
    }

    #[tokio::test]
    async fn extreme_fear_triggers_emergency_short_circuit() {
        let orchestrator = Orchestrator::new(0);
        let mut raw = EmotionVector::zero();
        raw[14] = 0.99; // Fear
        raw[15] = 0.95; // Horror
        let ctx = calm_context(1000);
        let outcome = orchestrator.tick(&raw, &ctx, 1000).await.unwrap();
        assert!(outcome.emergency.is_some());
        assert_eq!(orchestrator.stats().await.emergency_triggers, 1);
    }

    /// spec.md:63 (`consolidate_flag ⇒ M` recorded before publish) and the
    /// §8 nominal-tick property `consolidate_flag = (S ≥ adaptive_mlt)`
    /// (spec.md:289): a significance high enough to clear the adaptive MLT
    /// threshold, reached with a mean post-update intensity well below 0.5,
    /// must land a memory in the MCT on the very first tick.
    #[tokio::test]
    async fn consolidate_flag_records_a_memory_even_at_low_mean_intensity() {
        let orchestrator = Orchestrator::new(0);
        orchestrator.set_trauma_signal(1.0).await;

        let mut raw = EmotionVector::zero();
        for i in [4usize, 6, 7, 9, 10, 11, 14, 15, 20] {
            raw[i] = 0.6;
        }
        let ctx = Context {
            physical: PhysicalSensors { temperature: 1.0, volume: 1.0, luminosity: 1.0, gyro_instability: 1.0 },
            technical: TechnicalState { cpu_temp_c: 95.0, gpu_temp_c: 95.0, cpu_load: 1.0, ram_usage: 1.0, stability: 0.0 },
            feedback: ExternalFeedback { positive_validation: true, encouragement: true, external_alert: false, social_interaction: false },
            timestamp_ms: 1000,
        };

        let outcome = orchestrator.tick(&raw, &ctx, 1000).await.unwrap();

        assert!(outcome.emergency.is_none());
        assert!(outcome.contextualised.consolidate_flag);
        assert!(outcome.emotions.mean() <= 0.5);
        assert!(outcome.auto_memory_id.is_some());
        assert_eq!(orchestrator.memory_store().len().await, 1);
    }
}
