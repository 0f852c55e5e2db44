//! Core types for playback orchestration

use serde::{Deserialize, Serialize};

/// Where a channel is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local audio device
    Local,

    /// Cast-style network receiver
    Remote,
}

/// Lifecycle state of a single player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    /// Not started, or stopped for good
    Stopped,

    /// Backend is loading before audio can be heard
    Buffering,

    /// Audible, or waiting for its next randomized replay
    Playing,

    /// Paused by the user
    Paused,

    /// Backend rejected a control call
    Failed,
}

impl ChannelState {
    /// Transitional or broken states that take precedence in the aggregate
    pub fn is_nominal(self) -> bool {
        !matches!(self, ChannelState::Buffering | ChannelState::Failed)
    }
}

/// Mix-level state derived from every active player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixState {
    /// No players exist
    Stopped,

    /// First non-nominal channel is buffering
    Buffering,

    /// At least one channel is playing
    Playing,

    /// Every channel is paused
    Paused,

    /// First non-nominal channel has failed
    Failed,
}

impl MixState {
    /// Derive the aggregate from channel states in insertion order
    ///
    /// The first `Buffering`/`Failed` channel wins, so a broken channel is
    /// never masked by healthy ones.
    pub fn derive<I>(states: I) -> Self
    where
        I: IntoIterator<Item = ChannelState>,
    {
        let mut any = false;
        let mut any_playing = false;
        let mut all_paused = true;

        for state in states {
            any = true;
            match state {
                ChannelState::Failed => return MixState::Failed,
                ChannelState::Buffering => return MixState::Buffering,
                ChannelState::Playing => {
                    any_playing = true;
                    all_paused = false;
                }
                ChannelState::Paused => {}
                ChannelState::Stopped => all_paused = false,
            }
        }

        if !any {
            MixState::Stopped
        } else if any_playing {
            MixState::Playing
        } else if all_paused {
            MixState::Paused
        } else {
            MixState::Stopped
        }
    }
}

/// Configuration for playback orchestration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Message namespace used on cast sessions
    #[serde(default = "default_cast_namespace")]
    pub cast_namespace: String,

    /// Queue depth of the mix service command channel (default: 32)
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Fixed seed for replay delays (random when unset)
    #[serde(default)]
    pub replay_seed: Option<u64>,
}

fn default_cast_namespace() -> String {
    "urn:x-cast:lull.player".to_string()
}

fn default_command_buffer() -> usize {
    32
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            cast_namespace: default_cast_namespace(),
            command_buffer: default_command_buffer(),
            replay_seed: None,
        }
    }
}
