//! Inbound/outbound JSON shapes. Field names are kept in the
//! original labelled form the wire format specifies rather than
//! translated to the English identifiers used internally — a consumer
//! of this bus is a separate process that already speaks this vocabulary.

use std::collections::HashMap;

use mcee_amygdala::EmergencyResponse;
use mcee_types::{
    Context, ContextualisedState, DreamCommand as TypedDreamCommand, DreamStats, EmotionVector,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TransportError};

/// Inbound speech/text feedback.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechText {
    pub text: String,
    pub source: String,
    pub confidence: f64,
}

/// Inbound control command. `data` is left as a raw JSON value
/// since its shape is command-specific and not spelled out further.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    ForceDreamStart { data: Option<Value> },
    InterruptDream { data: Option<Value> },
    GetStatus { data: Option<Value> },
    ClearMct { data: Option<Value> },
    ResetStats { data: Option<Value> },
    SetConfig { data: Value },
}

/// Decodes the raw-emotions inbound payload: a JSON object keyed by the
/// 24 labelled emotion names. Unknown keys are ignored by
/// [`EmotionVector::from_named_map`]; a missing key is rejected.
pub fn decode_raw_emotions(bytes: &[u8]) -> Result<EmotionVector> {
    let map: HashMap<String, f64> = serde_json::from_slice(bytes)?;
    EmotionVector::from_named_map(&map).map_err(|e| TransportError::Decode(to_json_error(e)))
}

/// Decodes an inbound context update.
pub fn decode_context(bytes: &[u8]) -> Result<Context> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn decode_speech_text(bytes: &[u8]) -> Result<SpeechText> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn decode_control_command(bytes: &[u8]) -> Result<ControlCommand> {
    Ok(serde_json::from_slice(bytes)?)
}

fn to_json_error(err: mcee_types::Error) -> serde_json::Error {
    <serde_json::Error as serde::de::Error>::custom(err.to_string())
}

/// Outbound contextualised-state payload.
#[derive(Debug, Clone, Serialize)]
pub struct ContextualisedStatePayload {
    pub emotions_contextualisees: [f64; mcee_types::EMOTION_COUNT],
    pub emotion_globale: f64,
    pub contexte_detecte: &'static str,
    pub confiance_contexte: f64,
    pub gradient_danger_global: f64,
    pub niveau_danger: u8,
    pub signal_amyghaleon: bool,
    pub souvenir_a_consolider: bool,
    pub priorite_mlt: u8,
    pub text_id: Option<String>,
    pub timestamp_ms: i64,
}

impl ContextualisedStatePayload {
    pub fn from_state(state: &ContextualisedState, text_id: Option<String>) -> Self {
        ContextualisedStatePayload {
            emotions_contextualisees: state.emotions.0,
            emotion_globale: state.emotion_globale,
            contexte_detecte: context_label_str(state.context_label),
            confiance_contexte: state.context_confidence,
            gradient_danger_global: state.danger_gradient,
            niveau_danger: state.danger_level.as_index(),
            signal_amyghaleon: state.alert_flag,
            souvenir_a_consolider: state.consolidate_flag,
            priorite_mlt: state.consolidation_priority as u8,
            text_id,
            timestamp_ms: state.timestamp_ms,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

fn context_label_str(label: mcee_types::ContextLabel) -> &'static str {
    use mcee_types::ContextLabel::*;
    match label {
        StressTechnique => "stress_technique",
        UrgencePhysique => "urgence_physique",
        JoieSociale => "joie_sociale",
        RoutineStable => "routine_stable",
        ContexteGeneral => "contexte_general",
    }
}

/// Outbound alert payload.
#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    pub urgence: bool,
    pub niveau_danger: u8,
    pub gradient_danger_global: f64,
    pub contexte_detecte: &'static str,
    pub emotions_critiques: Vec<String>,
    pub gradients_declencheurs: HashMap<String, f64>,
    pub recommandation_intervention: &'static str,
    pub text_id: Option<String>,
    pub timestamp_ms: i64,
}

impl AlertPayload {
    pub fn from_emergency(
        state: &ContextualisedState,
        response: &EmergencyResponse,
        critical_emotions: Vec<String>,
        text_id: Option<String>,
    ) -> Self {
        AlertPayload {
            urgence: state.alert_flag,
            niveau_danger: response.danger_level.as_index(),
            gradient_danger_global: state.danger_gradient,
            contexte_detecte: context_label_str(state.context_label),
            emotions_critiques: critical_emotions,
            gradients_declencheurs: response.trigger_gradients.iter().cloned().collect(),
            recommandation_intervention: recommendation_str(response.action),
            text_id,
            timestamp_ms: state.timestamp_ms,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

fn recommendation_str(action: mcee_amygdala::EmergencyAction) -> &'static str {
    use mcee_amygdala::EmergencyAction::*;
    match action {
        Fuite => "fuite",
        Blocage => "blocage",
        Alerte => "alerte",
        Surveillance => "surveillance",
    }
}

/// Outbound memory-to-consolidate payload.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryToConsolidatePayload {
    pub id: uuid::Uuid,
    pub statut: &'static str,
    pub priorite: u8,
    pub emotions_brutes: [f64; mcee_types::EMOTION_COUNT],
    pub emotions_contextualisees: [f64; mcee_types::EMOTION_COUNT],
    pub contexte_detecte: &'static str,
    pub score_significativite: f64,
    pub recommandation_traitement: &'static str,
    pub timestamp_ms: i64,
}

impl MemoryToConsolidatePayload {
    pub fn new(
        memory: &mcee_types::Memory,
        raw_emotions: EmotionVector,
        context_label: mcee_types::ContextLabel,
        priority: mcee_types::ConsolidationPriority,
        significance: f64,
    ) -> Self {
        MemoryToConsolidatePayload {
            id: memory.id,
            statut: if memory.is_trauma { "trauma" } else { "pending" },
            priorite: priority as u8,
            emotions_brutes: raw_emotions.0,
            emotions_contextualisees: memory.emotions.0,
            contexte_detecte: context_label_str(context_label),
            score_significativite: significance,
            recommandation_traitement: if memory.is_trauma {
                "consolidation_prioritaire"
            } else {
                "consolidation_standard"
            },
            timestamp_ms: memory.timestamp_ms,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Outbound dream-command envelope; this is just a thin re-export point
/// since [`TypedDreamCommand`] already carries the exact `command`/`data`
/// shape wants via its `#[serde(tag = "command")]` attribute.
pub fn encode_dream_command(command: &TypedDreamCommand) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(command)?)
}

/// Outbound dream-status payload.
#[derive(Debug, Clone, Serialize)]
pub struct DreamStatusPayload {
    pub state: &'static str,
    pub cycle_progress: f64,
    pub phase_progress: f64,
    pub seconds_since_last_dream: f64,
    pub stats: DreamStats,
}

impl DreamStatusPayload {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcee_types::EMOTION_NAMES;

    #[test]
    fn raw_emotions_round_trip_through_named_map() {
        let json: HashMap<String, f64> =
        EMOTION_NAMES.iter().map(|n| (n.to_string(), 0.25)).collect();
        let bytes = serde_json::to_vec(&json).unwrap();
        let vector = decode_raw_emotions(&bytes).unwrap();
        assert_eq!(vector.mean(), 0.25);
    }

    #[test]
    fn missing_emotion_key_is_rejected() {
        let mut json: HashMap<String, f64> =
        EMOTION_NAMES.iter().map(|n| (n.to_string(), 0.1)).collect();
        json.remove("Joy");
        let bytes = serde_json::to_vec(&json).unwrap();
        assert!(decode_raw_emotions(&bytes).is_err());
    }

    #[test]
    fn control_command_tag_decodes_force_dream_start() {
        let bytes = br#"{"command":"force_dream_start","data":null}"#;
        let cmd = decode_control_command(bytes).unwrap();
        assert!(matches!(cmd, ControlCommand::ForceDreamStart { .. }));
    }

    #[test]
    fn control_command_tag_decodes_set_config_with_data() {
        let bytes = br#"{"command":"set_config","data":{"frequence_maj_hz":20}}"#;
        let cmd = decode_control_command(bytes).unwrap();
        assert!(matches!(cmd, ControlCommand::SetConfig { .. }));
    }

    #[test]
    fn speech_text_decodes() {
        let bytes = br#"{"text":"hello","source":"mic","confidence":0.8}"#;
        let speech = decode_speech_text(bytes).unwrap();
        assert_eq!(speech.source, "mic");
    }
}
