/// Core error types for Lull
use crate::types::{PresetId, SoundId};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `LullError`
pub type Result<T> = std::result::Result<T, LullError>;

/// Core error type for Lull
#[derive(Error, Debug)]
pub enum LullError {
    /// Replay window with its lower bound above its upper bound
    #[error("Invalid time period: min {min:?} is greater than max {max:?}")]
    InvalidTimePeriod {
        /// Requested lower bound
        min: Duration,
        /// Requested upper bound
        max: Duration,
    },

    /// Replay window bound outside the supported range
    #[error("Time period bound {0:?} is outside the supported range")]
    TimePeriodOutOfRange(Duration),

    /// Sound id not present in the catalog
    #[error("Unknown sound: {0}")]
    UnknownSound(SoundId),

    /// Preset not found
    #[error("Preset not found: {0}")]
    PresetNotFound(PresetId),

    /// Persistence collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl LullError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the error was caused by invalid caller configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimePeriod { .. } | Self::TimePeriodOutOfRange(_) | Self::UnknownSound(_)
        )
    }
}
