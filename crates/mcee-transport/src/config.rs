//! Flat `key=value` runtime configuration.
//!
//! Shaped like a typed config model: one typed struct, `Default` impl,
//! keys overridable from an external source, but the
//! wire format itself is hand-rolled: `#`/`;` comment lines, bare
//! `key=value` pairs, no sections, no quoting. Unknown keys are logged
//! and skipped; a key whose value fails to parse as the expected numeric
//! type keeps the field's default rather than aborting the load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub rabbitmq_host: String,
    pub rabbitmq_port: u16,
    pub rabbitmq_username: String,
    pub rabbitmq_password: String,
    pub queue_emotional_input: String,
    pub queue_context_input: String,
    pub queue_consciousness_output: String,
    pub queue_amygdaleon_output: String,
    pub queue_mlt_output: String,
    pub frequence_maj_hz: f64,
    pub latence_max_ms: f64,

    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub epsilon: f64,
    pub theta: f64,
    pub eta: f64,

    pub omega1: f64,
    pub omega2: f64,
    pub omega3: f64,
    pub omega4: f64,
    pub sigma1: f64,
    pub sigma2: f64,
    pub sigma3: f64,
    pub sigma4: f64,

    pub pi_env: f64,
    pub pi_sys: f64,
    pub pi_trauma: f64,
    pub pi_instab: f64,

    pub seuil_amyghaleon: f64,
    pub seuil_mlt_base: f64,
    pub seuil_variation_critique: f64,
    pub seuil_normal_max: f64,
    pub seuil_surveillance_max: f64,
    pub seuil_alerte_max: f64,
    pub seuil_critique_max: f64,

    pub charge_cpu_max: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            rabbitmq_host: "localhost".to_string(),
            rabbitmq_port: 5672,
            rabbitmq_username: "guest".to_string(),
            rabbitmq_password: "guest".to_string(),
            queue_emotional_input: "mcee.emotional.input".to_string(),
            queue_context_input: "mcee.context.input".to_string(),
            queue_consciousness_output: "mcee.consciousness.output".to_string(),
            queue_amygdaleon_output: "mcee.amygdaleon.output".to_string(),
            queue_mlt_output: "mcee.mlt.output".to_string(),
            frequence_maj_hz: 10.0,
            latence_max_ms: 100.0,

            alpha: 0.1,
            beta: 0.15,
            gamma: 0.1,
            delta: 0.1,
            epsilon: 0.1,
            theta: 0.1,
            eta: 0.1,

            omega1: 0.3,
            omega2: 0.3,
            omega3: 0.2,
            omega4: 0.2,
            sigma1: 0.3,
            sigma2: 0.3,
            sigma3: 0.25,
            sigma4: 0.15,

            pi_env: 0.3,
            pi_sys: 0.3,
            pi_trauma: 0.25,
            pi_instab: 0.15,

            seuil_amyghaleon: 0.9,
            seuil_mlt_base: 0.65,
            seuil_variation_critique: 0.3,
            seuil_normal_max: 0.2,
            seuil_surveillance_max: 0.4,
            seuil_alerte_max: 0.6,
            seuil_critique_max: 0.8,

            charge_cpu_max: 0.9,
        }
    }
}

impl RuntimeConfig {
    /// Builds a [`mcee_gradients::GradientConfig`] from the subset of
    /// keys that feed it, so the loaded config drives component A
    /// directly rather than being read back field by field at call
    /// sites.
    pub fn to_gradient_config(&self) -> mcee_gradients::GradientConfig {
        mcee_gradients::GradientConfig {
            omega: [self.omega1, self.omega2, self.omega3, self.omega4],
            sigma: [self.sigma1, self.sigma2, self.sigma3, self.sigma4],
            pi_env: self.pi_env,
            pi_sys: self.pi_sys,
            pi_trauma: self.pi_trauma,
            pi_instab: self.pi_instab,
            base_mlt_threshold: self.seuil_mlt_base,
            base_alert_threshold: self.seuil_amyghaleon,
            seuil_normal_max: self.seuil_normal_max,
            seuil_surveillance_max: self.seuil_surveillance_max,
            seuil_alerte_max: self.seuil_alerte_max,
            seuil_critique_max: self.seuil_critique_max,
        }
    }
}

/// Parses the flat `key=value` config text described in. Returns
/// a [`RuntimeConfig`] seeded with defaults and then overridden key by
/// key; unrecognised keys are logged and ignored, malformed numeric
/// values keep the existing (default) field untouched.
pub fn parse(text: &str) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    let raw = raw_pairs(text);
    for (key, value) in &raw {
        apply(&mut config, key, value);
    }
    config
}

/// Splits the text into `key=value` pairs, skipping blank lines and
/// `#`/`;`-prefixed comments.
fn raw_pairs(text: &str) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(line, "config line has no '=', skipping");
            continue;
        };
        pairs.insert(key.trim().to_string(), value.trim().to_string());
    }
    pairs
}

fn apply(config: &mut RuntimeConfig, key: &str, value: &str) {
    macro_rules! set_f64 {
        ($field:ident) => {{
                match value.parse::<f64>() {
                    Ok(v) => config.$field = v,
                    Err(_) => warn!(key, value, "malformed numeric value, keeping default"),
                }
        }};
    }

    match key {
        "rabbitmq_host" => config.rabbitmq_host = value.to_string(),
        "rabbitmq_port" => match value.parse::<u16>() {
            Ok(v) => config.rabbitmq_port = v,
            Err(_) => warn!(key, value, "malformed numeric value, keeping default"),
        },
        "rabbitmq_username" => config.rabbitmq_username = value.to_string(),
        "rabbitmq_password" => config.rabbitmq_password = value.to_string(),
        "queue_emotional_input" => config.queue_emotional_input = value.to_string(),
        "queue_context_input" => config.queue_context_input = value.to_string(),
        "queue_consciousness_output" => config.queue_consciousness_output = value.to_string(),
        "queue_amygdaleon_output" => config.queue_amygdaleon_output = value.to_string(),
        "queue_mlt_output" => config.queue_mlt_output = value.to_string(),
        "frequence_maj_hz" => match value.parse::<f64>() {
            Ok(v) if (1.0..=1000.0).contains(&v) => config.frequence_maj_hz = v,
            _ => warn!(key, value, "out of range or malformed, keeping default"),
        },
        "latence_max_ms" => set_f64!(latence_max_ms),
        "alpha" => set_f64!(alpha),
        "beta" => set_f64!(beta),
        "gamma" => set_f64!(gamma),
        "delta" => set_f64!(delta),
        "epsilon" => set_f64!(epsilon),
        "theta" => set_f64!(theta),
        "eta" => set_f64!(eta),
        "omega1" => set_f64!(omega1),
        "omega2" => set_f64!(omega2),
        "omega3" => set_f64!(omega3),
        "omega4" => set_f64!(omega4),
        "sigma1" => set_f64!(sigma1),
        "sigma2" => set_f64!(sigma2),
        "sigma3" => set_f64!(sigma3),
        "sigma4" => set_f64!(sigma4),
        "pi_env" => set_f64!(pi_env),
        "pi_sys" => set_f64!(pi_sys),
        "pi_trauma" => set_f64!(pi_trauma),
        "pi_instab" => set_f64!(pi_instab),
        "seuil_amyghaleon" => set_f64!(seuil_amyghaleon),
        "seuil_mlt_base" => set_f64!(seuil_mlt_base),
        "seuil_variation_critique" => set_f64!(seuil_variation_critique),
        "seuil_normal_max" => set_f64!(seuil_normal_max),
        "seuil_surveillance_max" => set_f64!(seuil_surveillance_max),
        "seuil_alerte_max" => set_f64!(seuil_alerte_max),
        "seuil_critique_max" => set_f64!(seuil_critique_max),
        "charge_cpu_max" => set_f64!(charge_cpu_max),
        other => warn!(key = other, "unknown config key, ignoring"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let text = "# a comment\n; another\n\nrabbitmq_host=broker.local\n";
        let config = parse(text);
        assert_eq!(config.rabbitmq_host, "broker.local");
    }

    #[test]
    fn unknown_key_is_ignored_without_panicking() {
        let text = "not_a_real_key=123\nrabbitmq_port=5673\n";
        let config = parse(text);
        assert_eq!(config.rabbitmq_port, 5673);
    }

    #[test]
    fn malformed_numeric_keeps_default() {
        let default = RuntimeConfig::default();
        let text = "alpha=not-a-number\n";
        let config = parse(text);
        assert_eq!(config.alpha, default.alpha);
    }

    #[test]
    fn frequence_out_of_range_keeps_default() {
        let default = RuntimeConfig::default();
        let text = "frequence_maj_hz=5000\n";
        let config = parse(text);
        assert_eq!(config.frequence_maj_hz, default.frequence_maj_hz);
    }

    #[test]
    fn round_trips_through_serde_json() {
        let config = RuntimeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
