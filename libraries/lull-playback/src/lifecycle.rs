//! State shared by every player implementation

use crate::error::{PlaybackError, Result};
use crate::player::PlayerContext;
use crate::scheduler::{IntervalScheduler, ReplayTimer};
use crate::types::ChannelState;
use lull_core::SoundChannel;
use tracing::{debug, warn};

/// Lifecycle bookkeeping of one player
///
/// Tracks the channel state, the terminal stop, and the replay wait of
/// non-loopable channels. Backends only add their side effects on top.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    pub(crate) channel: SoundChannel,
    pub(crate) context: PlayerContext,
    state: ChannelState,
    released: bool,
    awaiting_replay: bool,
    timer: ReplayTimer,
}

impl Lifecycle {
    pub(crate) fn new(channel: SoundChannel, context: PlayerContext) -> Self {
        Self {
            channel,
            context,
            state: ChannelState::Stopped,
            released: false,
            awaiting_replay: false,
            timer: ReplayTimer::new(),
        }
    }

    pub(crate) fn state(&self) -> ChannelState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ChannelState) {
        if self.state != state {
            debug!(sound_id = %self.channel.id(), from = ?self.state, to = ?state, "Channel state changed");
            self.state = state;
        }
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.released {
            return Err(PlaybackError::PlayerReleased(self.channel.id().clone()));
        }
        Ok(())
    }

    /// Playing from the mix's point of view (including buffering)
    pub(crate) fn is_playing(&self) -> bool {
        matches!(self.state, ChannelState::Playing | ChannelState::Buffering)
    }

    pub(crate) fn is_awaiting_replay(&self) -> bool {
        self.awaiting_replay
    }

    pub(crate) fn fail(&mut self) {
        self.timer.cancel();
        self.awaiting_replay = false;
        self.set_state(ChannelState::Failed);
    }

    /// Enter the terminal state; `false` if already released
    pub(crate) fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.timer.cancel();
        self.awaiting_replay = false;
        self.released = true;
        self.set_state(ChannelState::Stopped);
        true
    }

    /// Natural end of clip: arm the next replay for one-shot sounds
    pub(crate) fn begin_wait(&mut self, scheduler: &mut IntervalScheduler) -> Result<()> {
        if self.released || self.channel.is_loopable() {
            return Ok(());
        }

        match self.state {
            ChannelState::Playing | ChannelState::Buffering => {}
            // Finished right as it was paused; resuming restarts the clip.
            ChannelState::Paused => {
                self.awaiting_replay = true;
                return Ok(());
            }
            ChannelState::Stopped | ChannelState::Failed => return Ok(()),
        }

        let delay = scheduler.next_delay(&self.channel.time_period());
        self.awaiting_replay = true;
        if let Err(e) = self
            .timer
            .arm(delay, self.channel.id().clone(), &self.context)
        {
            warn!(sound_id = %self.channel.id(), error = %e, "Could not schedule replay");
            self.fail();
            return Err(e);
        }

        debug!(sound_id = %self.channel.id(), ?delay, "Replay scheduled");
        Ok(())
    }

    /// Take over a wait from a replaced player; a paused wait stays unarmed
    pub(crate) fn adopt_wait(&mut self, paused: bool, scheduler: &mut IntervalScheduler) -> Result<()> {
        self.ensure_live()?;
        if self.channel.is_loopable() {
            return Ok(());
        }

        if paused {
            self.set_state(ChannelState::Paused);
            self.awaiting_replay = true;
            return Ok(());
        }
        self.set_state(ChannelState::Playing);
        self.begin_wait(scheduler)
    }

    /// Pausing while waiting keeps the wait but drops the timer
    pub(crate) fn hold_wait(&mut self) {
        if self.timer.is_armed() {
            self.timer.cancel();
        }
    }

    /// Resuming ends any wait; returns whether one was pending
    pub(crate) fn take_wait(&mut self) -> bool {
        self.timer.cancel();
        std::mem::take(&mut self.awaiting_replay)
    }

    /// Validate a fired replay against the current arm
    pub(crate) fn accept_replay(&mut self, generation: u64) -> bool {
        if self.released || !self.timer.accept(generation) {
            return false;
        }
        if !self.is_playing() {
            return false;
        }
        self.awaiting_replay = false;
        true
    }

    pub(crate) fn set_buffering(&mut self, buffering: bool) {
        if self.released {
            return;
        }
        match (buffering, self.state) {
            (true, ChannelState::Playing) => self.set_state(ChannelState::Buffering),
            (false, ChannelState::Buffering) => self.set_state(ChannelState::Playing),
            _ => {}
        }
    }
}
