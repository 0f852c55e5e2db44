//! Lull Core
//!
//! Platform-agnostic domain types for Lull ambient mixes.
//!
//! This crate provides the building blocks shared by the playback
//! orchestration layer and its collaborators:
//! - **Sounds**: `SoundId`, `SoundInfo`, `SoundCatalog`, `SoundChannel`
//! - **Timing**: `TimePeriod`, the randomized replay window of non-loopable sounds
//! - **Presets**: `Preset`, `ChannelSettings`, `PresetId`
//! - **Persistence contract**: `PresetStore` and the `InMemoryPresetStore` implementation
//! - **Error Handling**: unified `LullError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use lull_core::{ChannelSettings, InMemoryPresetStore, PresetStore, SoundId, TimePeriod};
//! use std::time::Duration;
//!
//! let store = InMemoryPresetStore::new();
//! let thunder = TimePeriod::new(Duration::from_secs(5), Duration::from_secs(30)).unwrap();
//!
//! let preset = store
//!     .create(
//!         "Storm",
//!         vec![
//!             ChannelSettings::new(SoundId::new("rain"), 0.8, TimePeriod::default()),
//!             ChannelSettings::new(SoundId::new("thunder"), 0.3, thunder),
//!         ],
//!     )
//!     .unwrap();
//!
//! assert_eq!(store.get(&preset.id).unwrap().unwrap().name, "Storm");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod types;

pub use error::{LullError, Result};
pub use storage::{InMemoryPresetStore, PresetStore};
pub use types::{
    clamp_volume, ChannelSettings, Preset, PresetId, SoundCatalog, SoundChannel, SoundId,
    SoundInfo, TimePeriod, DEFAULT_VOLUME, MAX_VOLUME, MIN_VOLUME,
};
