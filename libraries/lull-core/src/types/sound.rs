//! Sound assets, live channel parameters and replay windows

use crate::error::{LullError, Result};
use crate::types::{ChannelSettings, SoundId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Silent
pub const MIN_VOLUME: f32 = 0.0;

/// Volume a newly enabled sound starts at (4 of 20 steps)
pub const DEFAULT_VOLUME: f32 = 0.2;

/// Unity gain
pub const MAX_VOLUME: f32 = 1.0;

/// Clamp a volume into `[MIN_VOLUME, MAX_VOLUME]`
///
/// NaN maps to `MIN_VOLUME` so a bad caller value can never reach a backend.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        MIN_VOLUME
    } else {
        volume.clamp(MIN_VOLUME, MAX_VOLUME)
    }
}

/// Randomized replay window of a non-loopable sound
///
/// After a clip finishes, the next start is delayed by a uniformly random
/// duration in `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimePeriodMillis", into = "TimePeriodMillis")]
pub struct TimePeriod {
    min: Duration,
    max: Duration,
}

impl TimePeriod {
    /// Shortest supported bound
    pub const MIN: Duration = Duration::from_secs(1);

    /// Longest supported bound
    pub const MAX: Duration = Duration::from_secs(300);

    /// Window used when a preset does not specify one
    pub const DEFAULT: TimePeriod = TimePeriod {
        min: Duration::from_secs(30),
        max: Duration::from_secs(60),
    };

    /// Create a validated replay window
    ///
    /// # Errors
    /// `InvalidTimePeriod` when `min > max`, `TimePeriodOutOfRange` when a
    /// bound falls outside `[TimePeriod::MIN, TimePeriod::MAX]`.
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(LullError::InvalidTimePeriod { min, max });
        }

        for bound in [min, max] {
            if !(Self::MIN..=Self::MAX).contains(&bound) {
                return Err(LullError::TimePeriodOutOfRange(bound));
            }
        }

        Ok(Self { min, max })
    }

    /// Window with identical bounds (fixed delay)
    pub fn fixed(delay: Duration) -> Result<Self> {
        Self::new(delay, delay)
    }

    /// Lower bound
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for TimePeriod {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Wire shape of `TimePeriod` (whole milliseconds)
#[derive(Serialize, Deserialize)]
struct TimePeriodMillis {
    min_ms: u64,
    max_ms: u64,
}

impl TryFrom<TimePeriodMillis> for TimePeriod {
    type Error = LullError;

    fn try_from(raw: TimePeriodMillis) -> Result<Self> {
        TimePeriod::new(
            Duration::from_millis(raw.min_ms),
            Duration::from_millis(raw.max_ms),
        )
    }
}

impl From<TimePeriod> for TimePeriodMillis {
    fn from(period: TimePeriod) -> Self {
        Self {
            min_ms: period.min.as_millis() as u64,
            max_ms: period.max.as_millis() as u64,
        }
    }
}

/// Static description of a sound asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundInfo {
    /// Asset key
    pub id: SoundId,

    /// Whether the clip is designed to loop without gaps
    #[serde(default)]
    pub is_loopable: bool,
}

impl SoundInfo {
    /// Describe a continuously looping sound
    pub fn looping(id: impl Into<String>) -> Self {
        Self {
            id: SoundId::new(id),
            is_loopable: true,
        }
    }

    /// Describe a one-shot sound replayed on a randomized interval
    pub fn one_shot(id: impl Into<String>) -> Self {
        Self {
            id: SoundId::new(id),
            is_loopable: false,
        }
    }
}

/// Catalog of every sound that can appear in a mix
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    sounds: HashMap<SoundId, SoundInfo>,
}

impl SoundCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sound, replacing any previous entry with the same id
    pub fn insert(&mut self, info: SoundInfo) {
        self.sounds.insert(info.id.clone(), info);
    }

    /// Look up a sound
    pub fn get(&self, id: &SoundId) -> Option<&SoundInfo> {
        self.sounds.get(id)
    }

    /// Look up a sound, failing for ids the catalog does not know
    pub fn require(&self, id: &SoundId) -> Result<&SoundInfo> {
        self.get(id)
            .ok_or_else(|| LullError::UnknownSound(id.clone()))
    }

    /// Number of registered sounds
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Whether no sounds are registered
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Iterate over registered sounds (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &SoundInfo> {
        self.sounds.values()
    }
}

impl FromIterator<SoundInfo> for SoundCatalog {
    fn from_iter<I: IntoIterator<Item = SoundInfo>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for info in iter {
            catalog.insert(info);
        }
        catalog
    }
}

/// One sound's identity plus its live playback parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SoundChannel {
    id: SoundId,
    is_loopable: bool,
    volume: f32,
    time_period: TimePeriod,
}

impl SoundChannel {
    /// Create a channel at the default volume and replay window
    pub fn new(info: &SoundInfo) -> Self {
        Self {
            id: info.id.clone(),
            is_loopable: info.is_loopable,
            volume: DEFAULT_VOLUME,
            time_period: TimePeriod::DEFAULT,
        }
    }

    /// Create a channel configured from preset settings
    pub fn from_settings(info: &SoundInfo, settings: &ChannelSettings) -> Self {
        Self {
            id: info.id.clone(),
            is_loopable: info.is_loopable,
            volume: clamp_volume(settings.volume),
            time_period: settings.time_period,
        }
    }

    /// Asset key
    pub fn id(&self) -> &SoundId {
        &self.id
    }

    /// Whether the clip loops without gaps
    pub fn is_loopable(&self) -> bool {
        self.is_loopable
    }

    /// Current volume in `[MIN_VOLUME, MAX_VOLUME]`
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Replay window (meaningless for loopable channels)
    pub fn time_period(&self) -> TimePeriod {
        self.time_period
    }

    /// Set the volume, clamping it into range
    ///
    /// Returns `true` when the stored value actually changed.
    pub fn set_volume(&mut self, volume: f32) -> bool {
        let volume = clamp_volume(volume);
        if self.volume == volume {
            return false;
        }
        self.volume = volume;
        true
    }

    /// Replace the replay window
    pub fn set_time_period(&mut self, time_period: TimePeriod) {
        self.time_period = time_period;
    }

    /// Preset entry describing this channel
    pub fn settings(&self) -> ChannelSettings {
        ChannelSettings::new(self.id.clone(), self.volume, self.time_period)
    }
}
