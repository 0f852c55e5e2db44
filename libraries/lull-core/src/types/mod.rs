mod ids;
mod preset;
mod sound;

pub use ids::{PresetId, SoundId};
pub use preset::{ChannelSettings, Preset};
pub use sound::{
    clamp_volume, SoundCatalog, SoundChannel, SoundInfo, TimePeriod, DEFAULT_VOLUME, MAX_VOLUME,
    MIN_VOLUME,
};
