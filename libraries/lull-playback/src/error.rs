//! Error types for playback orchestration

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Domain/configuration error (unknown sound, invalid replay window)
    #[error(transparent)]
    Core(#[from] lull_core::LullError),

    /// Remote channel could not take the message
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Local render engine failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Payload could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// The player was stopped; a new one must be created to play again
    #[error("Player for {0} was already stopped")]
    PlayerReleased(lull_core::SoundId),

    /// Replay timers need a tokio runtime
    #[error("No tokio runtime available to arm the replay timer")]
    NoRuntime,

    /// The mix service task is gone
    #[error("Mix service is not running")]
    ServiceClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Failure reported by a remote transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Session dropped or never established
    #[error("Remote session unavailable: {0}")]
    Unavailable(String),

    /// Outbound queue is full
    #[error("Outbound queue is full")]
    QueueFull,

    /// Outbound queue was closed by its consumer
    #[error("Outbound queue is closed")]
    Closed,
}

/// Failure reported by a local render engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

impl RenderError {
    /// Create a render error from any message
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
