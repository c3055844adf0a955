//! Component B: the contextualiser. Turns a raw 24-vector plus a
//! `Context` snapshot into a `ContextualisedState`, tracking just enough
//! history (last label, last change time) to compute transition boosts
//! and novelty across ticks.

use mcee_gradients::{self as gradients, GradientConfig};
use mcee_types::{
    clamp01, require_range, ConsolidationPriority, Context, ContextLabel, ContextualisedState,
    EmotionVector, Error, Result, EMOTION_COUNT,
};
use serde::{Deserialize, Serialize};

/// Indices of emotions treated as "positive" for the joyful-social
/// detection rule and the context-dependent weighting in step 5.
const POSITIVE_INDICES: [usize; 14] = [0, 1, 2, 3, 5, 8, 12, 13, 16, 17, 19, 21, 22, 23];
/// Indices of emotions treated as "stress" indicators.
const STRESS_INDICES: [usize; 9] = [4, 6, 7, 9, 10, 11, 14, 15, 20];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextCoefficients {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub epsilon: f64,
    pub eta: f64,
}

impl Default for ContextCoefficients {
    fn default() -> Self {
        ContextCoefficients {
            alpha: 0.1,
            beta: 0.15,
            gamma: 0.1,
            delta: 0.1,
            epsilon: 0.1,
            eta: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub coefficients: ContextCoefficients,
    pub gradients: GradientConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            coefficients: ContextCoefficients::default(),
            gradients: GradientConfig::default(),
        }
    }
}

/// Holds the cross-tick state (last label, last change timestamp) the
/// pure formulas in step 3/6 need.
pub struct Contextualiser {
    config: ContextConfig,
    last_label: Option<ContextLabel>,
    last_change_ms: i64,
    last_trauma_signal: f64,
}

impl Contextualiser {
    pub fn new(config: ContextConfig) -> Self {
        Contextualiser {
            config,
            last_label: None,
            last_change_ms: 0,
            last_trauma_signal: 0.0,
        }
    }

    pub fn set_trauma_signal(&mut self, value: f64) {
        self.last_trauma_signal = value.clamp(0.0, 1.0);
    }

    fn validate(raw: &EmotionVector, ctx: &Context) -> Result<()> {
        for v in raw.as_slice() {
            require_range("emotion", *v, 0.0, 1.0)?;
        }
        require_range("cpu_load", ctx.technical.cpu_load, 0.0, 1.0)?;
        require_range("ram_usage", ctx.technical.ram_usage, 0.0, 1.0)?;
        require_range("stability", ctx.technical.stability, 0.0, 1.0)?;
        require_range("gyro_instability", ctx.physical.gyro_instability, 0.0, 1.0)?;
        require_range("volume", ctx.physical.volume, 0.0, 1.0)?;
        require_range("temperature", ctx.physical.temperature, 0.0, 1.0)?;
        require_range("luminosity", ctx.physical.luminosity, 0.0, 1.0)?;
        Ok(())
    }

    fn detect_context(raw: &EmotionVector, ctx: &Context) -> ContextLabel {
        let t = &ctx.technical;
        let p = &ctx.physical;
        if t.cpu_load > 0.7 || t.ram_usage > 0.8 || t.cpu_temp_c.max(t.gpu_temp_c) > 75.0 {
            return ContextLabel::StressTechnique;
        }
        if p.gyro_instability > 0.8 || p.volume > 0.8 {
            return ContextLabel::UrgencePhysique;
        }
        let positive_sum: f64 = POSITIVE_INDICES.iter().map(|i| raw[*i]).sum();
        if positive_sum > 2.0 && ctx.feedback.social_interaction {
            return ContextLabel::JoieSociale;
        }
        let total_intensity: f64 = raw.as_slice().iter().sum();
        if total_intensity < 3.0 && p.gyro_instability < 0.3 && t.cpu_load < 0.5 {
            return ContextLabel::RoutineStable;
        }
        ContextLabel::ContexteGeneral
    }

    fn feedback_influence(ctx: &Context) -> f64 {
        0.3 * ctx.feedback.positive_count() as f64 - 0.5 * (ctx.feedback.external_alert as u8 as f64)
    }

    fn technical_influence(ctx: &Context) -> f64 {
        let t = &ctx.technical;
        let cpu_excess = (t.cpu_load - 0.7).max(0.0);
        let ram_excess = (t.ram_usage - 0.8).max(0.0);
        let temp_factor = gradients::temp_critical(t.cpu_temp_c, t.gpu_temp_c);
        -(0.3 * cpu_excess + 0.25 * ram_excess + 0.35 * temp_factor + 0.1 * (1.0 - t.stability))
    }

    fn physical_influence(ctx: &Context) -> f64 {
        let p = &ctx.physical;
        0.2 * p.temperature + 0.3 * p.volume + 0.2 * p.luminosity + 0.3 * p.gyro_instability
    }

    fn memory_influence(label: ContextLabel) -> f64 {
        match label {
            ContextLabel::StressTechnique | ContextLabel::UrgencePhysique => 0.3,
            _ => 0.1,
        }
    }

    fn context_weight(label: ContextLabel, index: usize) -> f64 {
        let is_positive = POSITIVE_INDICES.contains(&index);
        let is_stress = STRESS_INDICES.contains(&index);
        match label {
            ContextLabel::JoieSociale => {
                if is_positive {
                    1.5
                } else if is_stress {
                    0.5
                } else {
                    1.0
                }
            }
            ContextLabel::StressTechnique | ContextLabel::UrgencePhysique => {
                if is_stress {
                    1.5
                } else if is_positive {
                    0.5
                } else {
                    1.0
                }
            }
            _ => 1.0,
        }
    }

    /// Runs the full contextualisation pipeline. Fails with
    /// `MissingInput`/`OutOfRange` rather than clamping malformed input.
    pub fn contextualise(&mut self, raw: &EmotionVector, ctx: &Context) -> Result<ContextualisedState> {
        Self::validate(raw, ctx)?;

        let g_env = gradients::environmental(&ctx.physical, &self.config.gradients);
        let g_sys = gradients::system_stress(&ctx.technical, &self.config.gradients);
        let g_global = gradients::global_danger(
            g_env,
            g_sys,
            self.last_trauma_signal,
            ctx.physical.gyro_instability,
            &self.config.gradients,
        );
        let danger_level = gradients::classify(g_global, &self.config.gradients);

        let label = Self::detect_context(raw, ctx);
        let changed = self.last_label != Some(label);
        if changed {
            self.last_change_ms = ctx.timestamp_ms;
        }
        let seconds_since_change = ((ctx.timestamp_ms - self.last_change_ms).max(0) as f64) / 1000.0;

        let coeff = self.config.coefficients;
        let fb = Self::feedback_influence(ctx);
        let tech = Self::technical_influence(ctx);
        let phys = Self::physical_influence(ctx);
        let mem = Self::memory_influence(label);
        let transition_boost = if changed { 0.2 } else { 0.0 };
        let danger_mod = -0.3 * g_global;

        let delta = coeff.alpha * fb
        + coeff.beta * tech
        + coeff.gamma * phys
        + coeff.delta * mem
        + coeff.epsilon * transition_boost
        + coeff.eta * danger_mod;

        let mut cx = *raw;
        for i in 0..EMOTION_COUNT {
            cx[i] = clamp01(cx[i] + delta);
        }

        let active: Vec<usize> = (0..EMOTION_COUNT).filter(|i| cx[*i] > 0.1).collect();
        let coherence = if active.is_empty() {
            1.0
        } else {
            let weighted_active = active.iter().filter(|i| Self::context_weight(label, **i) > 1.0).count();
            weighted_active as f64 / active.len() as f64
        };

        let weight_sum: f64 = (0..EMOTION_COUNT).map(|i| Self::context_weight(label, i)).sum();
        let weighted_mean = if weight_sum > 0.0 {
            (0..EMOTION_COUNT).map(|i| Self::context_weight(label, i) * cx[i]).sum::<f64>() / weight_sum
        } else {
            0.0
        };
        let emotion_globale = clamp01(weighted_mean * coherence);

        let novelty = if changed { 0.8 } else { 0.2 };
        let duration_factor = (seconds_since_change / 60.0).min(1.0);
        let significance = clamp01(
            0.35 * cx.mean() + 0.20 * novelty + 0.15 * coherence + 0.20 * g_global + 0.10 * duration_factor,
        );

        let adaptive_alert = gradients::adaptive_alert_threshold(g_global, &self.config.gradients);
        let adaptive_mlt = gradients::adaptive_mlt_threshold(g_global, &self.config.gradients);
        let alert_flag = g_global > adaptive_alert || cx.max() > adaptive_alert;
        let consolidate_flag = significance >= adaptive_mlt;
        let priority = if g_global > 0.8 {
            ConsolidationPriority::Critical
        } else if g_global > 0.6 {
            ConsolidationPriority::High
        } else {
            ConsolidationPriority::Normal
        };

        self.last_label = Some(label);

        Ok(ContextualisedState {
                emotions: cx,
                emotion_globale,
                context_label: label,
                context_confidence: coherence,
                danger_gradient: g_global,
                danger_level,
                alert_flag,
                consolidate_flag,
                consolidation_priority: priority,
                significance,
                coherence,
                timestamp_ms: ctx.timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcee_types::{ExternalFeedback, PhysicalSensors, TechnicalState};

    fn base_context(ts: i64) -> Context {
        Context {
            physical: PhysicalSensors {
                temperature: 0.5,
                volume: 0.2,
                luminosity: 0.7,
                gyro_instability: 0.1,
            },
            technical: TechnicalState {
                cpu_temp_c: 55.0,
                gpu_temp_c: 60.0,
                cpu_load: 0.3,
                ram_usage: 0.5,
                stability: 0.95,
            },
            feedback: ExternalFeedback {
                positive_validation: true,
                encouragement: false,
                external_alert: false,
                social_interaction: true,
            },
            timestamp_ms: ts,
        }
    }

    #[test]
    fn nominal_tick_detects_joie_sociale() {
        let mut engine = Contextualiser::new(ContextConfig::default());
        let mut raw = EmotionVector::zero();
        raw[17] = 0.8; // Joy
        raw[3] = 0.1; // Amusement
        let ctx = base_context(1000);
        let out = engine.contextualise(&raw, &ctx).unwrap();
        assert_eq!(out.context_label, ContextLabel::JoieSociale);
        assert!(!out.alert_flag);
    }

    #[test]
    fn cpu_stress_detects_stress_technique() {
        let mut engine = Contextualiser::new(ContextConfig::default());
        let raw = EmotionVector::zero();
        let mut ctx = base_context(1000);
        ctx.technical.cpu_load = 0.9;
        ctx.technical.cpu_temp_c = 80.0;
        let out = engine.contextualise(&raw, &ctx).unwrap();
        assert_eq!(out.context_label, ContextLabel::StressTechnique);
    }

    #[test]
    fn physical_urgency_triggers_alert() {
        let mut engine = Contextualiser::new(ContextConfig::default());
        let mut raw = EmotionVector::zero();
        raw[14] = 0.95; // Fear
        let mut ctx = base_context(1000);
        ctx.physical.volume = 0.9;
        ctx.physical.gyro_instability = 0.85;
        let out = engine.contextualise(&raw, &ctx).unwrap();
        assert_eq!(out.context_label, ContextLabel::UrgencePhysique);
        assert!(out.alert_flag);
    }

    #[test]
    fn missing_and_out_of_range_inputs_are_rejected() {
        let mut engine = Contextualiser::new(ContextConfig::default());
        let raw = EmotionVector::zero();
        let mut ctx = base_context(1000);
        ctx.technical.cpu_load = 1.5;
        let err = engine.contextualise(&raw, &ctx).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));
    }

    #[test]
    fn idempotent_once_label_has_settled() {
        let mut engine = Contextualiser::new(ContextConfig::default());
        let mut raw = EmotionVector::zero();
        raw[8] = 0.3; // Calm
        let ctx = base_context(1000);
        // First tick always carries the initial-transition boost; compare
        // the second and third ticks, where the label is already settled.
        let _ = engine.contextualise(&raw, &ctx).unwrap();
        let second = engine.contextualise(&raw, &base_context(1000)).unwrap();
        let third = engine.contextualise(&raw, &base_context(1000)).unwrap();
        assert!((second.emotion_globale - third.emotion_globale).abs() < 1e-9);
        assert_eq!(second.context_label, third.context_label);
    }
}
