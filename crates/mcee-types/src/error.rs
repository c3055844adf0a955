use thiserror::Error;

/// Error taxonomy shared across every component of the pipeline.
///
/// `MissingInput`/`OutOfRange` are recoverable at a message boundary
/// (drop, nack, log); `TransportFailure`/`ConfigError` are recoverable at
/// a subsystem boundary; `InvariantViolation` is fatal for the tick but
/// never for the process; `Shutdown` is not an error so much as a signal
/// threaded through the same `Result` plumbing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing required field: {0}")]
    MissingInput(String),

    #[error("field {field} out of range [{lo}, {hi}]: {value}")]
    OutOfRange { field: String, value: f64, lo: f64, hi: f64 },

    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("invariant violation in {component}: {detail}")]
    InvariantViolation { component: String, detail: String },

    #[error("shutdown requested")]
    Shutdown,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Checks `value` is finite and within `[lo, hi]`; used by decode paths
/// that must reject rather than clamp.
pub fn require_range(field: &str, value: f64, lo: f64, hi: f64) -> Result<f64> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(Error::OutOfRange { field: field.to_string(), value, lo, hi });
    }
    Ok(value)
}
