//! Process entrypoint: parses the CLI surface, loads the flat
//! `key=value` config, wires an [`Orchestrator`] to an in-process
//! [`MessageBus`], and runs consumer/processing/dream tasks until
//! SIGINT/SIGTERM requests a graceful shutdown.

mod demo;

use std::fs;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mcee_orchestrator::Orchestrator;
use mcee_transport::{
    cli::{Args, EXIT_FATAL, EXIT_OK},
    codec::{self, ControlCommand},
    config::{self, RuntimeConfig},
    topics, DreamStatusPayload, InProcessBus, MemoryToConsolidatePayload, MessageBus,
};
use mcee_types::{Context, EmotionVector, ExternalFeedback, PhysicalSensors, TechnicalState};
use tokio::sync::{watch, RwLock};
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

use clap::Parser;

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as i64
}

/// Neutral baseline context used before the first "context" message
/// arrives, and re-read by the timer-driven tick.
fn neutral_context(now: i64) -> Context {
    Context {
        physical: PhysicalSensors { temperature: 0.3, volume: 0.2, luminosity: 0.5, gyro_instability: 0.0 },
        technical: TechnicalState { cpu_temp_c: 45.0, gpu_temp_c: 45.0, cpu_load: 0.1, ram_usage: 0.2, stability: 1.0 },
        feedback: ExternalFeedback {
            positive_validation: false,
            encouragement: false,
            external_alert: false,
            social_interaction: false,
        },
        timestamp_ms: now,
    }
}

fn load_config(args: &Args) -> RuntimeConfig {
    let mut runtime_config = match &args.config {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => config::parse(&text),
            Err(e) => {
                warn!(path, error = %e, "config file not readable, using defaults");
                RuntimeConfig::default()
            }
        },
        None => RuntimeConfig::default(),
    };
    if let Some(host) = &args.host {
        runtime_config.rabbitmq_host = host.clone();
    }
    if let Some(port) = args.port {
        runtime_config.rabbitmq_port = port;
    }
    if let Some(user) = &args.user {
        runtime_config.rabbitmq_username = user.clone();
    }
    if let Some(pass) = &args.pass {
        runtime_config.rabbitmq_password = pass.clone();
    }
    runtime_config
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

    let args = Args::parse();

    if args.llm_test {
        info!("--llm-test is a no-op: this runtime has no LLM dependency");
        return ExitCode::from(EXIT_OK as u8);
    }

    let runtime_config = load_config(&args);
    info!(
        host = %runtime_config.rabbitmq_host,
        port = runtime_config.rabbitmq_port,
        "configuration loaded"
    );

    let orchestrator = Arc::new(Orchestrator::new(now_ms()));

    if args.demo {
        demo::run(&orchestrator).await;
        return ExitCode::from(EXIT_OK as u8);
    }

    match run_service(orchestrator, &runtime_config).await {
        Ok(()) => ExitCode::from(EXIT_OK as u8),
        Err(e) => {
            error!(error = %e, "fatal error");
            ExitCode::from(EXIT_FATAL as u8)
        }
    }
}

async fn run_service(orchestrator: Arc<Orchestrator>, runtime_config: &RuntimeConfig) -> anyhow::Result<()> {
    let bus: Arc<InProcessBus> = Arc::new(InProcessBus::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let last_raw = Arc::new(RwLock::new(EmotionVector::zero()));
    let last_context = Arc::new(RwLock::new(neutral_context(now_ms())));
    let last_alert = Arc::new(AtomicBool::new(false));

    let raw_task = spawn_raw_emotions_consumer(bus.clone(), last_raw.clone(), shutdown_rx.clone());
    let context_task = spawn_context_consumer(
        bus.clone(),
        orchestrator.clone(),
        last_raw.clone(),
        last_context.clone(),
        last_alert.clone(),
        shutdown_rx.clone(),
    );
    let timer_task = spawn_timer_tick(
        bus.clone(),
        orchestrator.clone(),
        last_raw.clone(),
        last_context.clone(),
        last_alert.clone(),
        runtime_config.frequence_maj_hz,
        shutdown_rx.clone(),
    );
    let speech_task = spawn_speech_consumer(bus.clone(), orchestrator.clone(), shutdown_rx.clone());
    let control_task =
    spawn_control_consumer(bus.clone(), orchestrator.clone(), shutdown_rx.clone());
    let dream_task = spawn_dream_loop(bus.clone(), orchestrator.clone(), last_alert.clone(), shutdown_rx.clone());

    info!("mcee runtime started; press Ctrl+C to stop");
    wait_for_shutdown_signal().await;
    info!("shutdown requested, draining tasks");
    let _ = shutdown_tx.send(true);

    let _ = tokio::join!(raw_task, context_task, timer_task, speech_task, control_task, dream_task);
    info!("mcee runtime stopped cleanly");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn spawn_raw_emotions_consumer(
    bus: Arc<InProcessBus>,
    last_raw: Arc<RwLock<EmotionVector>>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
            let mut rx = bus.subscribe(topics::RAW_EMOTIONS).await;
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    message = rx.recv() => {
                        let Ok(bytes) = message else { continue };
                        match codec::decode_raw_emotions(&bytes) {
                            Ok(vector) => *last_raw.write().await = vector,
                            Err(e) => warn!(error = %e, "dropping malformed raw-emotions message"),
                        }
                    }
                }
            }
    })
}

fn spawn_context_consumer(
    bus: Arc<InProcessBus>,
    orchestrator: Arc<Orchestrator>,
    last_raw: Arc<RwLock<EmotionVector>>,
    last_context: Arc<RwLock<mcee_types::Context>>,
    last_alert: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
            let mut rx = bus.subscribe(topics::CONTEXT).await;
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    message = rx.recv() => {
                        let Ok(bytes) = message else { continue };
                        let ctx = match codec::decode_context(&bytes) {
                            Ok(ctx) => ctx,
                            Err(e) => { warn!(error = %e, "dropping malformed context message"); continue }
                        };
                        *last_context.write().await = ctx;
                        let raw = *last_raw.read().await;
                        let now = ctx.timestamp_ms;
                        match orchestrator.tick(&raw, &ctx, now).await {
                            Ok(outcome) => {
                                orchestrator.record_processing_time(outcome.processing_ms).await;
                                last_alert.store(outcome.emergency.is_some(), Ordering::Relaxed);
                                publish_tick_outcome(&bus, &orchestrator, &outcome).await;
                            }
                            Err(e) => error!(error = %e, "tick failed"),
                        }
                    }
                }
            }
    })
}

/// Timer fallback for the processing condition. Runs the pipeline
/// against whatever raw emotions/context are last-known, independent of
/// new arrivals, so the orchestrator keeps producing ticks even when
/// upstream traffic is idle.
fn spawn_timer_tick(
    bus: Arc<InProcessBus>,
    orchestrator: Arc<Orchestrator>,
    last_raw: Arc<RwLock<EmotionVector>>,
    last_context: Arc<RwLock<mcee_types::Context>>,
    last_alert: Arc<AtomicBool>,
    frequence_maj_hz: f64,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs_f64(1.0 / frequence_maj_hz));
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        let raw = *last_raw.read().await;
                        let mut ctx = *last_context.read().await;
                        ctx.timestamp_ms = now_ms();
                        match orchestrator.tick(&raw, &ctx, ctx.timestamp_ms).await {
                            Ok(outcome) => {
                                orchestrator.record_processing_time(outcome.processing_ms).await;
                                last_alert.store(outcome.emergency.is_some(), Ordering::Relaxed);
                                publish_tick_outcome(&bus, &orchestrator, &outcome).await;
                            }
                            Err(e) => error!(error = %e, "timer-driven tick failed"),
                        }
                    }
                }
            }
    })
}

async fn publish_tick_outcome(
    bus: &InProcessBus,
    orchestrator: &Orchestrator,
    outcome: &mcee_orchestrator::TickOutcome,
) {
    let payload = mcee_transport::ContextualisedStatePayload::from_state(&outcome.contextualised, None);
    match payload.encode() {
        Ok(bytes) => {
            let _ = bus.publish(topics::CONTEXTUALISED_STATE, bytes).await;
        }
        Err(e) => error!(error = %e, "failed to encode contextualised-state payload"),
    }

    if let Some(response) = &outcome.emergency {
        let critical: Vec<String> = mcee_types::EMOTION_NAMES
        .iter()
        .enumerate()
        .filter(|(i, _)| outcome.emotions[*i] > 0.7)
        .map(|(_, name)| name.to_string())
        .collect();
        let alert = mcee_transport::AlertPayload::from_emergency(&outcome.contextualised, response, critical, None);
        match alert.encode() {
            Ok(bytes) => {
                let _ = bus.publish(topics::ALERT, bytes).await;
            }
            Err(e) => error!(error = %e, "failed to encode alert payload"),
        }
    }

    if outcome.contextualised.consolidate_flag {
        let memory_id = outcome.auto_memory_id.or(outcome.trauma_id);
        let snapshot = orchestrator.memory_store().snapshot().await;
        if let Some(memory) = memory_id.and_then(|id| snapshot.into_iter().find(|m| m.id == id)) {
            let payload = MemoryToConsolidatePayload::new(
                &memory,
                outcome.emotions,
                outcome.contextualised.context_label,
                outcome.contextualised.consolidation_priority,
                outcome.contextualised.significance,
            );
            match payload.encode() {
                Ok(bytes) => {
                    let _ = bus.publish(topics::MEMORY_TO_CONSOLIDATE, bytes).await;
                }
                Err(e) => error!(error = %e, "failed to encode memory-to-consolidate payload"),
            }
        }
    }
}

fn spawn_speech_consumer(
    bus: Arc<InProcessBus>,
    orchestrator: Arc<Orchestrator>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
            let mut rx = bus.subscribe(topics::SPEECH_TEXT).await;
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    message = rx.recv() => {
                        let Ok(bytes) = message else { continue };
                        match codec::decode_speech_text(&bytes) {
                            Ok(speech) => {
                                let sentiment = speech.confidence * 2.0 - 1.0;
                                orchestrator.blend_external_feedback(sentiment).await;
                            }
                            Err(e) => warn!(error = %e, "dropping malformed speech-text message"),
                        }
                    }
                }
            }
    })
}

fn spawn_control_consumer(
    bus: Arc<InProcessBus>,
    orchestrator: Arc<Orchestrator>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
            let mut rx = bus.subscribe(topics::CONTROL).await;
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    message = rx.recv() => {
                        let Ok(bytes) = message else { continue };
                        let command = match codec::decode_control_command(&bytes) {
                            Ok(c) => c,
                            Err(e) => { warn!(error = %e, "dropping malformed control command"); continue }
                        };
                        handle_control_command(&bus, &orchestrator, command).await;
                    }
                }
            }
    })
}

async fn handle_control_command(bus: &InProcessBus, orchestrator: &Orchestrator, command: ControlCommand) {
    let now = now_ms();
    match command {
        ControlCommand::ForceDreamStart { .. } => {
            orchestrator.force_dream_start(now).await;
            info!("dream cycle force-started by control command");
        }
        ControlCommand::InterruptDream { .. } => {
            orchestrator.interrupt_dream(now).await;
            info!("dream cycle interrupted by control command");
        }
        ControlCommand::GetStatus { .. } => {
            let status = orchestrator.dream_status(now).await;
            let payload = DreamStatusPayload {
                state: status.state.as_str(),
                cycle_progress: status.cycle_progress,
                phase_progress: status.phase_progress,
                seconds_since_last_dream: status.seconds_since_last_dream,
                stats: status.stats,
            };
            match payload.encode() {
                Ok(bytes) => {
                    let _ = bus.publish(topics::DREAM_STATUS, bytes).await;
                }
                Err(e) => error!(error = %e, "failed to encode dream-status payload"),
            }
        }
        ControlCommand::ClearMct { .. } => {
            orchestrator.clear_memory_store().await;
            info!("medium-term memory cleared by control command");
        }
        ControlCommand::ResetStats { .. } => {
            orchestrator.reset_dream_stats().await;
            info!("dream-cycle statistics reset by control command");
        }
        ControlCommand::SetConfig { data } => {
            warn!(?data, "set_config received; live reconfiguration is not wired in this runtime, ignoring");
        }
    }
}

fn spawn_dream_loop(
    bus: Arc<InProcessBus>,
    orchestrator: Arc<Orchestrator>,
    last_alert: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        let alert = last_alert.load(Ordering::Relaxed);
                        let mut sink = mcee_dream::VecSink::default();
                        let _ = orchestrator.dream_tick(alert, now_ms(), &mut sink).await;
                        for command in sink.0.drain(..) {
                            match codec::encode_dream_command(&command) {
                                Ok(bytes) => { let _ = bus.publish(topics::DREAM_COMMAND, bytes).await; }
                                Err(e) => error!(error = %e, "failed to encode dream command"),
                            }
                        }
                    }
                }
            }
    })
}
