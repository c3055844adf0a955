//! `--demo`: runs a fixed sequence of emotion scenarios against a fresh
//! [`Orchestrator`] without a bus, printing the resulting phase and
//! danger level after each tick. Scenario shape (base value plus a
//! handful of elevated emotions per step, calm → joy → exploration →
//! anxiety → fear/urgency → recovery) is carried over from the original
//! engine's own demo sequence.

use std::collections::HashMap;

use mcee_orchestrator::Orchestrator;
use mcee_types::{Context, EmotionVector, ExternalFeedback, PhysicalSensors, TechnicalState};

struct Scenario {
    title: &'static str,
    base: f64,
    elevated: &'static [(&'static str, f64)],
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        title: "calm state (SERENITE)",
        base: 0.1,
        elevated: &[("Calm", 0.8), ("Satisfaction", 0.6), ("Relief", 0.4)],
    },
    Scenario {
        title: "rising joy (transition to JOIE)",
        base: 0.1,
        elevated: &[("Joy", 0.85), ("Excitement", 0.7), ("Satisfaction", 0.6), ("Triumph", 0.5)],
    },
    Scenario {
        title: "exploration mode (curiosity)",
        base: 0.1,
        elevated: &[("Interest", 0.8), ("Fascination", 0.75), ("Excitement", 0.5), ("Awe", 0.6)],
    },
    Scenario {
        title: "rising anxiety",
        base: 0.1,
        elevated: &[("Anxiety", 0.7), ("Confusion", 0.5), ("Fear", 0.3)],
    },
    Scenario {
        title: "URGENCY - intense fear",
        base: 0.05,
        elevated: &[("Fear", 0.9), ("Horror", 0.7), ("Anxiety", 0.8)],
    },
    Scenario {
        title: "gradual return to calm",
        base: 0.1,
        elevated: &[("Relief", 0.7), ("Calm", 0.5), ("Fear", 0.2)],
    },
];

fn context(ts: i64) -> Context {
    Context {
        physical: PhysicalSensors { temperature: 0.3, volume: 0.2, luminosity: 0.5, gyro_instability: 0.1 },
        technical: TechnicalState { cpu_temp_c: 50.0, gpu_temp_c: 55.0, cpu_load: 0.2, ram_usage: 0.3, stability: 0.95 },
        feedback: ExternalFeedback {
            positive_validation: false,
            encouragement: false,
            external_alert: false,
            social_interaction: false,
        },
        timestamp_ms: ts,
    }
}

fn vector_for(scenario: &Scenario) -> EmotionVector {
    let mut map: HashMap<String, f64> =
    mcee_types::EMOTION_NAMES.iter().map(|n| (n.to_string(), scenario.base)).collect();
    for (name, value) in scenario.elevated {
        map.insert(name.to_string(), *value);
    }
    EmotionVector::from_named_map(&map).expect("demo scenarios name valid emotion labels")
}

pub async fn run(orchestrator: &Orchestrator) {
    println!("=== mcee demo mode: emotion scenario walkthrough ===\n");

    let mut now = 0i64;
    for scenario in SCENARIOS {
        println!("--- {} ---", scenario.title);
        let raw = vector_for(scenario);
        now += 2_000;
        let ctx = context(now);
        match orchestrator.tick(&raw, &ctx, now).await {
            Ok(outcome) => {
                println!(
                    " phase={:?} danger={:?} emergency={} global_energy={:.3}",
                    outcome.phase,
                    outcome.contextualised.danger_level,
                    outcome.emergency.is_some(),
                    outcome.global_energy,
                );
            }
            Err(e) => println!(" tick failed: {e}"),
        }
        println!();
    }

    let stats = orchestrator.stats().await;
    let memory_count = orchestrator.memory_store().len().await;
    println!("=== demo statistics ===");
    println!(" phase transitions : {}", stats.phase_transitions);
    println!(" emergency triggers: {}", stats.emergency_triggers);
    println!(" memories recorded : {memory_count}");
    println!(" wisdom : {:.3}", stats.wisdom);
}
