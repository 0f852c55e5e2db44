//! Presets: named snapshots of a mix

use crate::types::{clamp_volume, PresetId, SoundId, TimePeriod};
use serde::{Deserialize, Deserializer, Serialize};

/// Per-channel configuration stored in a preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Sound this entry configures
    pub sound_id: SoundId,

    /// Volume in `[MIN_VOLUME, MAX_VOLUME]`, clamped on load
    #[serde(deserialize_with = "deserialize_volume")]
    pub volume: f32,

    /// Replay window, ignored for loopable sounds
    #[serde(default)]
    pub time_period: TimePeriod,
}

impl ChannelSettings {
    /// Create an entry, clamping the volume into range
    pub fn new(sound_id: SoundId, volume: f32, time_period: TimePeriod) -> Self {
        Self {
            sound_id,
            volume: clamp_volume(volume),
            time_period,
        }
    }

    /// Whether both entries configure a channel identically
    ///
    /// Volumes are compared after clamping, as a player would apply them.
    pub fn same_as(&self, other: &Self) -> bool {
        self.sound_id == other.sound_id
            && clamp_volume(self.volume) == clamp_volume(other.volume)
            && self.time_period == other.time_period
    }
}

fn deserialize_volume<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    f32::deserialize(deserializer).map(clamp_volume)
}

/// Named, persisted snapshot of a mix
///
/// `player_states` keeps the order channels were added in; an empty list is
/// a valid (silent) preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Generated once, never reused
    pub id: PresetId,

    /// User-facing label
    pub name: String,

    /// Exact per-channel configuration of the mix
    pub player_states: Vec<ChannelSettings>,
}

impl Preset {
    /// Create a preset with a freshly generated id
    pub fn new(name: impl Into<String>, player_states: Vec<ChannelSettings>) -> Self {
        Self {
            id: PresetId::generate(),
            name: name.into(),
            player_states,
        }
    }

    /// Settings for one sound, if the preset contains it
    pub fn settings_for(&self, sound_id: &SoundId) -> Option<&ChannelSettings> {
        self.player_states.iter().find(|s| &s.sound_id == sound_id)
    }

    /// Whether the preset describes exactly the given mix
    ///
    /// Order-insensitive: two mixes are the same when they contain the same
    /// sounds with identical (clamped) volume and replay window.
    pub fn has_same_mix(&self, channels: &[ChannelSettings]) -> bool {
        if self.player_states.len() != channels.len() {
            return false;
        }

        let mut ours: Vec<&ChannelSettings> = self.player_states.iter().collect();
        let mut theirs: Vec<&ChannelSettings> = channels.iter().collect();
        ours.sort_by(|a, b| a.sound_id.cmp(&b.sound_id));
        theirs.sort_by(|a, b| a.sound_id.cmp(&b.sound_id));

        ours.iter().zip(theirs.iter()).all(|(a, b)| a.same_as(b))
    }
}
