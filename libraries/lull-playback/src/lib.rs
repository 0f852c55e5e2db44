//! Lull Playback - Mix Orchestration
//!
//! Backend-agnostic playback of ambient sound mixes.
//!
//! This crate provides:
//! - A `Player` abstraction with local (`LocalPlayer`) and cast-style
//!   remote (`RemotePlayer`) implementations
//! - The JSON control protocol mirrored to remote receivers (`RemoteMessage`)
//! - Randomized replay of non-loopable sounds (`IntervalScheduler`, `ReplayTimer`)
//! - `PlayerManager`, the owner of the active mix, with a derived
//!   aggregate state and observer notifications
//! - `PresetController` for preset play/save/rename/delete
//! - `MixService`, an actor running a manager on its own task
//!
//! # Architecture
//!
//! `lull-playback` never decodes audio or opens sockets:
//! - Local rendering is provided through `RenderEngine` / `RenderHandle`
//! - Remote delivery goes through `RemoteTransport`
//! - Completions (end of clip, buffering, replay timers) are queued as
//!   `ChannelEvent`s and applied by the manager's owner
//!
//! # Example
//!
//! ```rust
//! use lull_core::{ChannelSettings, Preset, SoundCatalog, SoundChannel, SoundId, SoundInfo, TimePeriod};
//! use lull_playback::{
//!     LocalBackend, MixState, PlaybackConfig, PlayerManager, RenderEngine, RenderError,
//!     RenderHandle, RenderSignals,
//! };
//! use std::sync::Arc;
//!
//! struct Silent;
//!
//! impl RenderHandle for Silent {
//!     fn set_volume(&mut self, _volume: f32) -> Result<(), RenderError> { Ok(()) }
//!     fn start(&mut self) -> Result<(), RenderError> { Ok(()) }
//!     fn pause(&mut self) -> Result<(), RenderError> { Ok(()) }
//!     fn stop(&mut self) -> Result<(), RenderError> { Ok(()) }
//! }
//!
//! struct SilentEngine;
//!
//! impl RenderEngine for SilentEngine {
//!     fn open(
//!         &self,
//!         _channel: &SoundChannel,
//!         _signals: RenderSignals,
//!     ) -> Result<Box<dyn RenderHandle>, RenderError> {
//!         Ok(Box::new(Silent))
//!     }
//! }
//!
//! let catalog: SoundCatalog = [SoundInfo::looping("rain"), SoundInfo::looping("wind")]
//!     .into_iter()
//!     .collect();
//! let local = Arc::new(LocalBackend::new(Arc::new(SilentEngine)));
//! let mut manager = PlayerManager::new(Arc::new(catalog), local, &PlaybackConfig::default());
//!
//! let evening = Preset::new(
//!     "Evening",
//!     vec![
//!         ChannelSettings::new(SoundId::new("rain"), 0.8, TimePeriod::default()),
//!         ChannelSettings::new(SoundId::new("wind"), 0.4, TimePeriod::default()),
//!     ],
//! );
//!
//! manager.apply_preset(&evening).unwrap();
//! assert_eq!(manager.state(), MixState::Playing);
//! assert!(manager.is_preset_active(&evening));
//!
//! manager.pause_all().unwrap();
//! assert_eq!(manager.state(), MixState::Paused);
//!
//! manager.stop_all().unwrap();
//! assert_eq!(manager.state(), MixState::Stopped);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
mod lifecycle;
pub mod local;
pub mod manager;
pub mod player;
pub mod presets;
pub mod protocol;
pub mod remote;
pub mod scheduler;
pub mod service;
pub mod types;

pub use error::{PlaybackError, RenderError, Result, TransportError};
pub use events::ManagerUpdate;
pub use local::{LocalBackend, LocalPlayer, RenderEngine, RenderHandle, RenderSignals};
pub use manager::PlayerManager;
pub use player::{ChannelEvent, EventSender, InstanceId, Player, PlayerContext, PlayerFactory};
pub use presets::PresetController;
pub use protocol::{RemoteAction, RemoteMessage};
pub use remote::{
    ChannelTransport, DeliveryReceipt, OutboundMessage, RemoteBackend, RemotePlayer,
    RemoteTransport,
};
pub use scheduler::{IntervalScheduler, ReplayTimer};
pub use service::{MixCommand, MixHandle, MixService};
pub use types::{BackendKind, ChannelState, MixState, PlaybackConfig};
