//! Remote control protocol
//!
//! Every control event on a remote channel becomes one JSON message:
//!
//! ```json
//! {"soundKey":"rain","isLooping":true,"volume":0.8,"action":"play"}
//! ```
//!
//! `action` is omitted for pure volume updates. Receivers must accept an
//! explicit `null` as well.

use crate::error::Result;
use lull_core::SoundChannel;
use serde::{Deserialize, Serialize};

/// Transport control carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteAction {
    /// Start or resume
    Play,

    /// Pause
    Pause,

    /// Stop and release
    Stop,
}

/// One control message mirrored to the receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    /// Sound id
    pub sound_key: String,

    /// Receiver loops the clip instead of waiting for the next replay
    pub is_looping: bool,

    /// Current volume in `[0, 1]`
    pub volume: f32,

    /// `None` for a volume-only update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RemoteAction>,
}

impl RemoteMessage {
    /// Message describing a channel's current parameters
    pub fn for_channel(channel: &SoundChannel, action: Option<RemoteAction>) -> Self {
        Self {
            sound_key: channel.id().to_string(),
            is_looping: channel.is_loopable(),
            volume: channel.volume(),
            action,
        }
    }

    /// Serialize to the wire payload
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a wire payload
    ///
    /// # Errors
    /// `PlaybackError::Protocol` for malformed JSON, missing fields or an
    /// unknown action.
    pub fn decode(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use lull_core::SoundInfo;

    #[test]
    fn play_message_is_bit_exact() {
        let mut channel = SoundChannel::new(&SoundInfo::looping("rain"));
        channel.set_volume(0.8);

        let payload = RemoteMessage::for_channel(&channel, Some(RemoteAction::Play))
            .encode()
            .unwrap();

        assert_eq!(
            payload,
            r#"{"soundKey":"rain","isLooping":true,"volume":0.8,"action":"play"}"#
        );
    }

    #[test]
    fn volume_update_omits_action() {
        let mut channel = SoundChannel::new(&SoundInfo::one_shot("thunder"));
        channel.set_volume(0.3);

        let payload = RemoteMessage::for_channel(&channel, None).encode().unwrap();

        assert_eq!(
            payload,
            r#"{"soundKey":"thunder","isLooping":false,"volume":0.3}"#
        );
    }

    #[test]
    fn decode_accepts_null_action() {
        let message =
            RemoteMessage::decode(r#"{"soundKey":"wind","isLooping":true,"volume":0.5,"action":null}"#)
                .unwrap();

        assert_eq!(message.sound_key, "wind");
        assert!(message.action.is_none());
    }

    #[test]
    fn decode_rejects_unknown_action() {
        let result = RemoteMessage::decode(
            r#"{"soundKey":"wind","isLooping":true,"volume":0.5,"action":"rewind"}"#,
        );
        assert!(matches!(result, Err(PlaybackError::Protocol(_))));
    }

    #[test]
    fn decode_rejects_missing_required_field() {
        let result = RemoteMessage::decode(r#"{"soundKey":"wind","volume":0.5}"#);
        assert!(result.is_err());
    }
}
