//! Component I: external interfaces. Out of scope is the real AMQP/Pulsar
//! wire client; in scope is everything the
//! orchestrator needs to talk to one: the [`MessageBus`] trait plus an
//! in-process implementation, the inbound/outbound JSON codecs, the flat
//! `key=value` runtime config loader, and the CLI surface.

pub mod bus;
pub mod cli;
pub mod codec;
pub mod config;
mod error;

pub use bus::{Envelope, InProcessBus, MessageBus};
pub use cli::Args;
pub use codec::{
    AlertPayload, ContextualisedStatePayload, ControlCommand, DreamStatusPayload,
    MemoryToConsolidatePayload, SpeechText,
};
pub use config::RuntimeConfig;
pub use error::{Result, TransportError};

/// Topic names the orchestrator publishes/subscribes to when wired
/// through [`InProcessBus`]. Kept distinct from the `queue_*` keys in
/// [`RuntimeConfig`], which name the *external* broker's queues; these
/// are the in-process bus's own topic strings.
pub mod topics {
    pub const RAW_EMOTIONS: &str = "mcee.in.raw_emotions";
    pub const CONTEXT: &str = "mcee.in.context";
    pub const SPEECH_TEXT: &str = "mcee.in.speech_text";
    pub const CONTROL: &str = "mcee.in.control";

    pub const CONTEXTUALISED_STATE: &str = "mcee.out.contextualised_state";
    pub const ALERT: &str = "mcee.out.alert";
    pub const MEMORY_TO_CONSOLIDATE: &str = "mcee.out.memory_to_consolidate";
    pub const DREAM_COMMAND: &str = "mcee.out.dream_command";
    pub const DREAM_STATUS: &str = "mcee.out.dream_status";
}
