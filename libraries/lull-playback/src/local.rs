//! Local playback
//!
//! `LocalPlayer` forwards every control call straight to an opaque render
//! handle. Decoding and mixing stay inside the engine.

use crate::error::{RenderError, Result};
use crate::lifecycle::Lifecycle;
use crate::player::{ChannelEvent, EventSender, InstanceId, Player, PlayerContext, PlayerFactory};
use crate::scheduler::IntervalScheduler;
use crate::types::{BackendKind, ChannelState};
use lull_core::{SoundChannel, SoundId, TimePeriod};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-sound handle from the local rendering engine
///
/// `set_volume` must take effect within one rendering quantum; fades are
/// built on top of it. `start` after the clip ended plays it from the top.
pub trait RenderHandle: Send {
    /// Apply a volume in `[0, 1]`
    fn set_volume(&mut self, volume: f32) -> std::result::Result<(), RenderError>;

    /// Start or resume rendering
    fn start(&mut self) -> std::result::Result<(), RenderError>;

    /// Pause rendering
    fn pause(&mut self) -> std::result::Result<(), RenderError>;

    /// Stop and release engine resources
    fn stop(&mut self) -> std::result::Result<(), RenderError>;
}

/// Local rendering capability
pub trait RenderEngine: Send + Sync {
    /// Open a handle for the channel at its current volume
    ///
    /// Loopable channels must loop seamlessly; others report
    /// `RenderSignals::clip_finished` at the end of each clip.
    fn open(
        &self,
        channel: &SoundChannel,
        signals: RenderSignals,
    ) -> std::result::Result<Box<dyn RenderHandle>, RenderError>;
}

/// Lets an engine report completions from its own threads
#[derive(Debug, Clone)]
pub struct RenderSignals {
    sound_id: SoundId,
    instance: InstanceId,
    events: EventSender,
}

impl RenderSignals {
    /// Sound this handle renders
    pub fn sound_id(&self) -> &SoundId {
        &self.sound_id
    }

    /// Report the natural end of the clip
    pub fn clip_finished(&self) {
        self.events.send(ChannelEvent::ClipFinished {
            sound_id: self.sound_id.clone(),
            instance: self.instance,
        });
    }

    /// Report buffering start/end
    pub fn buffering(&self, buffering: bool) {
        self.events.send(ChannelEvent::Buffering {
            sound_id: self.sound_id.clone(),
            instance: self.instance,
            buffering,
        });
    }
}

/// Player rendering on the local device
pub struct LocalPlayer {
    life: Lifecycle,
    handle: Box<dyn RenderHandle>,
}

impl LocalPlayer {
    /// Wrap an opened render handle
    pub fn new(channel: SoundChannel, handle: Box<dyn RenderHandle>, context: PlayerContext) -> Self {
        Self {
            life: Lifecycle::new(channel, context),
            handle,
        }
    }

    fn render<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(&mut dyn RenderHandle) -> std::result::Result<(), RenderError>,
    {
        if let Err(e) = op(self.handle.as_mut()) {
            warn!(sound_id = %self.life.channel.id(), error = %e, "Render engine call failed");
            self.life.fail();
            return Err(e.into());
        }
        Ok(())
    }
}

impl Player for LocalPlayer {
    fn channel(&self) -> &SoundChannel {
        &self.life.channel
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Local
    }

    fn instance(&self) -> InstanceId {
        self.life.context.instance
    }

    fn state(&self) -> ChannelState {
        self.life.state()
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        if self.life.is_released() || !self.life.channel.set_volume(volume) {
            return Ok(());
        }
        let volume = self.life.channel.volume();
        self.render(|h| h.set_volume(volume))
    }

    fn set_time_period(&mut self, time_period: TimePeriod) {
        self.life.channel.set_time_period(time_period);
    }

    fn play(&mut self) -> Result<()> {
        self.life.ensure_live()?;
        if self.life.is_playing() {
            return Ok(());
        }

        self.life.take_wait();
        self.render(|h| h.start())?;
        self.life.set_state(ChannelState::Playing);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.life.is_released() || !self.life.is_playing() {
            return Ok(());
        }

        self.life.hold_wait();
        self.render(|h| h.pause())?;
        self.life.set_state(ChannelState::Paused);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.life.release() {
            return Ok(());
        }
        self.handle.stop()?;
        Ok(())
    }

    fn resync(&mut self) -> Result<()> {
        self.life.ensure_live()?;
        let volume = self.life.channel.volume();
        self.render(|h| h.set_volume(volume))?;

        if self.life.is_playing() && !self.life.is_awaiting_replay() {
            self.render(|h| h.start())?;
        }
        Ok(())
    }

    fn on_clip_finished(&mut self, scheduler: &mut IntervalScheduler) -> Result<()> {
        self.life.begin_wait(scheduler)
    }

    fn on_replay_due(&mut self, generation: u64) -> Result<()> {
        if !self.life.accept_replay(generation) {
            return Ok(());
        }
        debug!(sound_id = %self.life.channel.id(), "Replaying clip");
        self.render(|h| h.start())
    }

    fn is_awaiting_replay(&self) -> bool {
        self.life.is_awaiting_replay()
    }

    fn adopt_wait(&mut self, paused: bool, scheduler: &mut IntervalScheduler) -> Result<()> {
        self.life.adopt_wait(paused, scheduler)
    }

    fn set_buffering(&mut self, buffering: bool) {
        self.life.set_buffering(buffering);
    }

    fn mark_failed(&mut self) {
        if !self.life.is_released() {
            self.life.fail();
        }
    }
}

/// Creates `LocalPlayer`s on a render engine
pub struct LocalBackend {
    engine: Arc<dyn RenderEngine>,
}

impl LocalBackend {
    /// Backend over the given engine
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self { engine }
    }
}

impl PlayerFactory for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn create(&self, channel: SoundChannel, context: PlayerContext) -> Result<Box<dyn Player>> {
        let signals = RenderSignals {
            sound_id: channel.id().clone(),
            instance: context.instance,
            events: context.events.clone(),
        };
        let handle = self.engine.open(&channel, signals)?;
        Ok(Box::new(LocalPlayer::new(channel, handle, context)))
    }
}
