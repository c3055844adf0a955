//! Pure numeric core for danger gradients and adaptive thresholds
//! (component A). Every function here is total over its domain and has
//! no failure mode — invalid inputs are a caller responsibility upstream.

use mcee_types::{DangerLevel, PhysicalSensors, TechnicalState};
use serde::{Deserialize, Serialize};

/// Weights and thresholds for the gradient calculator. Defaults mirror
/// the reference coefficients named in config key list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    pub omega: [f64; 4],
    pub sigma: [f64; 4],
    pub pi_env: f64,
    pub pi_sys: f64,
    pub pi_trauma: f64,
    pub pi_instab: f64,
    pub base_mlt_threshold: f64,
    pub base_alert_threshold: f64,
    pub seuil_normal_max: f64,
    pub seuil_surveillance_max: f64,
    pub seuil_alerte_max: f64,
    pub seuil_critique_max: f64,
}

impl Default for GradientConfig {
    fn default() -> Self {
        GradientConfig {
            omega: [0.3, 0.3, 0.2, 0.2],
            sigma: [0.3, 0.3, 0.25, 0.15],
            pi_env: 0.3,
            pi_sys: 0.3,
            pi_trauma: 0.25,
            pi_instab: 0.15,
            base_mlt_threshold: 0.65,
            base_alert_threshold: 0.9,
            seuil_normal_max: 0.2,
            seuil_surveillance_max: 0.4,
            seuil_alerte_max: 0.6,
            seuil_critique_max: 0.8,
        }
    }
}

/// `temp_critical`: step function of the hotter of cpu/gpu temperature.
pub fn temp_critical(cpu_temp_c: f64, gpu_temp_c: f64) -> f64 {
    let hottest = cpu_temp_c.max(gpu_temp_c);
    if hottest < 60.0 {
        0.0
    } else if hottest < 75.0 {
        0.3
    } else if hottest < 85.0 {
        0.7
    } else {
        1.0
    }
}

/// `environmental(P) -> g_env`. Orientation is not an independently
/// sampled sensor (see DESIGN.md Open Question 6); the `omega[3]` term
/// reuses gyro instability, matching the original's convention of
/// folding orientation into the gyro channel.
pub fn environmental(sensors: &PhysicalSensors, cfg: &GradientConfig) -> f64 {
    let g = cfg.omega[0] * sensors.gyro_instability
    + cfg.omega[1] * (sensors.volume - 0.8).max(0.0)
    + cfg.omega[2] * (sensors.temperature - 0.5).abs()
    + cfg.omega[3] * sensors.gyro_instability;
    g.min(1.0)
}

/// `system_stress(T) -> g_sys`.
pub fn system_stress(technical: &TechnicalState, cfg: &GradientConfig) -> f64 {
    let g = cfg.sigma[0] * (technical.cpu_load - 0.7).max(0.0)
    + cfg.sigma[1] * (technical.ram_usage - 0.8).max(0.0)
    + cfg.sigma[2] * temp_critical(technical.cpu_temp_c, technical.gpu_temp_c)
    + cfg.sigma[3] * (1.0 - technical.stability);
    g.min(1.0)
}

/// `global_danger(g_env, g_sys, trauma, instab) -> g_global`.
pub fn global_danger(g_env: f64, g_sys: f64, trauma: f64, instab: f64, cfg: &GradientConfig) -> f64 {
    let g = cfg.pi_env * g_env + cfg.pi_sys * g_sys + cfg.pi_trauma * trauma + cfg.pi_instab * instab;
    g.min(1.0)
}

/// `classify(g_global) -> DangerLevel`. At a boundary value the lower
/// level is returned, so thresholds use strict `>`.
pub fn classify(g_global: f64, cfg: &GradientConfig) -> DangerLevel {
    if g_global > cfg.seuil_critique_max {
        DangerLevel::Urgency
    } else if g_global > cfg.seuil_alerte_max {
        DangerLevel::Critical
    } else if g_global > cfg.seuil_surveillance_max {
        DangerLevel::Alert
    } else if g_global > cfg.seuil_normal_max {
        DangerLevel::Surveillance
    } else {
        DangerLevel::Normal
    }
}

/// `adaptive_mlt_threshold(g_global) = max(0.45, base - 0.20 * g_global)`
/// (DESIGN.md Open Question 2).
pub fn adaptive_mlt_threshold(g_global: f64, cfg: &GradientConfig) -> f64 {
    (cfg.base_mlt_threshold - 0.20 * g_global).max(0.45)
}

/// `adaptive_alert_threshold(g_global) = max(0.75, base - 0.15 * g_global)`.
pub fn adaptive_alert_threshold(g_global: f64, cfg: &GradientConfig) -> f64 {
    (cfg.base_alert_threshold - 0.15 * g_global).max(0.75)
}

/// `critical_pattern`: sustained, steep, high danger.
pub fn critical_pattern(g_global: f64, g_derivative: f64, persistence_s: f64) -> bool {
    g_global > 0.8 && g_derivative > 0.3 && persistence_s > 30.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_boundary_returns_lower_level() {
        let cfg = GradientConfig::default();
        assert_eq!(classify(cfg.seuil_normal_max, &cfg), DangerLevel::Normal);
        assert_eq!(classify(cfg.seuil_normal_max + 1e-6, &cfg), DangerLevel::Surveillance);
    }

    #[test]
    fn adaptive_thresholds_are_monotonic_and_bounded() {
        let cfg = GradientConfig::default();
        let low = adaptive_alert_threshold(0.1, &cfg);
        let high = adaptive_alert_threshold(0.9, &cfg);
        assert!(low >= high);
        assert!(high >= 0.75);

        let low_mlt = adaptive_mlt_threshold(0.1, &cfg);
        let high_mlt = adaptive_mlt_threshold(0.9, &cfg);
        assert!(low_mlt >= high_mlt);
        assert!(high_mlt >= 0.45);
    }

    #[test]
    fn temp_critical_steps() {
        assert_eq!(temp_critical(50.0, 40.0), 0.0);
        assert_eq!(temp_critical(70.0, 40.0), 0.3);
        assert_eq!(temp_critical(80.0, 40.0), 0.7);
        assert_eq!(temp_critical(90.0, 40.0), 1.0);
    }

    #[test]
    fn gradients_stay_within_unit_interval() {
        let cfg = GradientConfig::default();
        let sensors = PhysicalSensors {
            temperature: 1.0,
            volume: 1.0,
            luminosity: 1.0,
            gyro_instability: 1.0,
        };
        let technical = TechnicalState {
            cpu_temp_c: 120.0,
            gpu_temp_c: 120.0,
            cpu_load: 1.0,
            ram_usage: 1.0,
            stability: 0.0,
        };
        let g_env = environmental(&sensors, &cfg);
        let g_sys = system_stress(&technical, &cfg);
        assert!((0.0..=1.0).contains(&g_env));
        assert!((0.0..=1.0).contains(&g_sys));
        let g_global = global_danger(g_env, g_sys, 1.0, 1.0, &cfg);
        assert!((0.0..=1.0).contains(&g_global));
    }
}
