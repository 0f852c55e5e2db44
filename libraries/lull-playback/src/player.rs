//! Player abstraction
//!
//! A `Player` drives one sound channel on one backend. The manager only
//! ever sees `Box<dyn Player>` values produced by a `PlayerFactory`, so new
//! backends plug in without touching the mix state machine.

use crate::error::Result;
use crate::scheduler::IntervalScheduler;
use crate::types::{BackendKind, ChannelState};
use lull_core::{ChannelSettings, SoundChannel, SoundId, TimePeriod};
use tokio::sync::mpsc;

/// Identifies one player instance for the lifetime of a manager
///
/// Events carry it so completions from a replaced player are ignored.
pub type InstanceId = u64;

/// Asynchronous completion reported by a backend or a replay timer
///
/// Events are queued and applied on the manager's owner context; backends
/// never touch manager state directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Clip reached its natural end
    ClipFinished {
        /// Channel
        sound_id: SoundId,
        /// Player that rendered the clip
        instance: InstanceId,
    },

    /// A replay timer expired
    ReplayDue {
        /// Channel
        sound_id: SoundId,
        /// Player that armed the timer
        instance: InstanceId,
        /// Arm generation; stale generations are ignored
        generation: u64,
    },

    /// Backend started or finished buffering
    Buffering {
        /// Channel
        sound_id: SoundId,
        /// Player being buffered
        instance: InstanceId,
        /// `true` while audio is not yet available
        buffering: bool,
    },

    /// A message could not be delivered after `send` returned
    DeliveryFailed {
        /// Channel
        sound_id: SoundId,
        /// Player that sent the message
        instance: InstanceId,
        /// Transport-supplied reason
        reason: String,
    },
}

impl ChannelEvent {
    /// Channel the event refers to
    pub fn sound_id(&self) -> &SoundId {
        match self {
            ChannelEvent::ClipFinished { sound_id, .. }
            | ChannelEvent::ReplayDue { sound_id, .. }
            | ChannelEvent::Buffering { sound_id, .. }
            | ChannelEvent::DeliveryFailed { sound_id, .. } => sound_id,
        }
    }
}

/// Cloneable handle for posting events to a manager from any thread
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl EventSender {
    /// Wrap the sending half of an event queue
    pub fn new(tx: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        Self { tx }
    }

    /// Queue an event
    ///
    /// Returns `false` if the manager is gone.
    pub fn send(&self, event: ChannelEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Everything a new player needs from its manager
#[derive(Debug, Clone)]
pub struct PlayerContext {
    /// Unique id of the player being created
    pub instance: InstanceId,

    /// Where asynchronous completions go
    pub events: EventSender,
}

/// Playback driver for one channel
///
/// Implementations must honor the shared contract:
/// - `set_volume` clamps and has no side effect when the value is unchanged
/// - `play` is idempotent while playing; stopped players reject it
/// - `pause` is a no-op unless playing
/// - `stop` is terminal and cancels any pending replay
/// - a backend failure moves the player to `Failed` and returns the error
pub trait Player: Send {
    /// Channel parameters owned by this player
    fn channel(&self) -> &SoundChannel;

    /// Backend this player renders on
    fn backend(&self) -> BackendKind;

    /// Instance id assigned at creation
    fn instance(&self) -> InstanceId;

    /// Current lifecycle state
    fn state(&self) -> ChannelState;

    /// Set volume (clamped to `[0, 1]`)
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Replace the replay window; applies from the next arm
    fn set_time_period(&mut self, time_period: TimePeriod);

    /// Start or resume
    fn play(&mut self) -> Result<()>;

    /// Pause
    fn pause(&mut self) -> Result<()>;

    /// Stop for good
    ///
    /// The player is `Stopped` afterwards even if the backend reports an error.
    fn stop(&mut self) -> Result<()>;

    /// Re-emit the full current state to the backend
    fn resync(&mut self) -> Result<()>;

    /// Natural end of clip; non-loopable players arm their replay timer
    fn on_clip_finished(&mut self, scheduler: &mut IntervalScheduler) -> Result<()>;

    /// Replay timer expired
    fn on_replay_due(&mut self, generation: u64) -> Result<()>;

    /// Between clips of a non-loopable sound
    fn is_awaiting_replay(&self) -> bool;

    /// Continue the replay wait of a replaced player
    ///
    /// Nothing is rendered until the replay fires or the channel is resumed.
    fn adopt_wait(&mut self, paused: bool, scheduler: &mut IntervalScheduler) -> Result<()>;

    /// Backend buffering started/finished
    fn set_buffering(&mut self, buffering: bool);

    /// Backend reported an asynchronous failure
    fn mark_failed(&mut self);

    /// Sound id
    fn sound_id(&self) -> &SoundId {
        self.channel().id()
    }

    /// Current volume
    fn volume(&self) -> f32 {
        self.channel().volume()
    }

    /// Preset entry describing this player
    fn settings(&self) -> ChannelSettings {
        self.channel().settings()
    }
}

/// Creates players for one backend
pub trait PlayerFactory: Send + Sync {
    /// Backend produced by this factory
    fn kind(&self) -> BackendKind;

    /// Create a stopped player for the channel
    fn create(&self, channel: SoundChannel, context: PlayerContext) -> Result<Box<dyn Player>>;
}
