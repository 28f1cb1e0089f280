// Error taxonomy shared across layers
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    // Unknown year/round/session/driver/segment
    #[error("{0}")]
    NotFound(String),

    // Reference lap too sparse to derive a track boundary from
    #[error("insufficient telemetry: {0}")]
    InsufficientTelemetry(String),

    // A value that cannot be represented as a JSON number
    #[error("cannot serialize `{field}`: {reason}")]
    Serialization { field: String, reason: String },

    #[error("telemetry provider timed out after {0:?}")]
    ProviderTimeout(Duration),

    #[error("cache I/O error")]
    Cache(#[from] std::io::Error),

    // Anything unexpected from the provider or a computation; the
    // original cause is preserved for diagnostics at the boundary.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

impl ReplayError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ReplayError::NotFound(message.into())
    }

    pub fn serialization(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ReplayError::Serialization {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
