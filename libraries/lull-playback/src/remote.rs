//! Remote (cast-style) playback
//!
//! `RemotePlayer` renders nothing itself: every control call is mirrored as
//! exactly one `RemoteMessage` on a namespace-scoped channel. Delivery is
//! fire-and-forget; a rejected send fails the player synchronously.

use crate::error::{Result, TransportError};
use crate::lifecycle::Lifecycle;
use crate::player::{ChannelEvent, EventSender, InstanceId, Player, PlayerContext, PlayerFactory};
use crate::protocol::{RemoteAction, RemoteMessage};
use crate::scheduler::IntervalScheduler;
use crate::types::{BackendKind, ChannelState};
use lull_core::{SoundChannel, SoundId, TimePeriod};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Established bidirectional session with a receiver
///
/// `send` must not block: queue the payload or fail immediately. A failure
/// discovered later is reported through the `receipt`.
pub trait RemoteTransport: Send + Sync {
    /// Send one payload on a namespace
    fn send(
        &self,
        namespace: &str,
        payload: String,
        receipt: DeliveryReceipt,
    ) -> std::result::Result<(), TransportError>;
}

/// Reports a late delivery failure for the player that sent a message
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    sound_id: SoundId,
    instance: InstanceId,
    events: EventSender,
}

impl DeliveryReceipt {
    /// Receipt for messages sent by player `instance`
    pub fn new(sound_id: SoundId, instance: InstanceId, events: EventSender) -> Self {
        Self {
            sound_id,
            instance,
            events,
        }
    }

    /// Channel the message belongs to
    pub fn sound_id(&self) -> &SoundId {
        &self.sound_id
    }

    /// Player that sent the message
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Mark the sending player failed
    ///
    /// Ignored by the manager once that player has been replaced.
    pub fn failed(&self, reason: impl Into<String>) {
        self.events.send(ChannelEvent::DeliveryFailed {
            sound_id: self.sound_id.clone(),
            instance: self.instance,
            reason: reason.into(),
        });
    }
}

/// Payload waiting to be written to the session
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Message namespace
    pub namespace: String,

    /// Encoded `RemoteMessage`
    pub payload: String,

    /// Where a write failure is reported
    pub receipt: DeliveryReceipt,
}

/// Transport that hands payloads to a writer task through a bounded queue
///
/// The session owner drains the receiver and writes to the network; a full
/// or closed queue is reported as a transport failure.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<OutboundMessage>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its writer task drains
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl RemoteTransport for ChannelTransport {
    fn send(
        &self,
        namespace: &str,
        payload: String,
        receipt: DeliveryReceipt,
    ) -> std::result::Result<(), TransportError> {
        self.tx
            .try_send(OutboundMessage {
                namespace: namespace.to_string(),
                payload,
                receipt,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            })
    }
}

/// Player mirroring control events to a remote receiver
pub struct RemotePlayer {
    life: Lifecycle,
    transport: Arc<dyn RemoteTransport>,
    namespace: String,
    last_action: Option<RemoteAction>,
}

impl RemotePlayer {
    /// Player sending on `namespace` through `transport`
    pub fn new(
        channel: SoundChannel,
        transport: Arc<dyn RemoteTransport>,
        namespace: impl Into<String>,
        context: PlayerContext,
    ) -> Self {
        Self {
            life: Lifecycle::new(channel, context),
            transport,
            namespace: namespace.into(),
            last_action: None,
        }
    }

    fn send(&self, action: Option<RemoteAction>) -> Result<()> {
        let payload = RemoteMessage::for_channel(&self.life.channel, action).encode()?;
        let receipt = DeliveryReceipt::new(
            self.life.channel.id().clone(),
            self.life.context.instance,
            self.life.context.events.clone(),
        );
        self.transport.send(&self.namespace, payload, receipt)?;
        Ok(())
    }

    fn emit(&mut self, action: Option<RemoteAction>) -> Result<()> {
        if let Err(e) = self.send(action) {
            warn!(sound_id = %self.life.channel.id(), ?action, error = %e, "Remote send failed");
            self.life.fail();
            return Err(e);
        }
        if action.is_some() {
            self.last_action = action;
        }
        Ok(())
    }
}

impl Player for RemotePlayer {
    fn channel(&self) -> &SoundChannel {
        &self.life.channel
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Remote
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
        self.emit(None)
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
        self.emit(Some(RemoteAction::Play))?;
        self.life.set_state(ChannelState::Playing);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.life.is_released() || !self.life.is_playing() {
            return Ok(());
        }

        self.life.hold_wait();
        self.emit(Some(RemoteAction::Pause))?;
        self.life.set_state(ChannelState::Paused);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.life.release() {
            return Ok(());
        }
        self.last_action = Some(RemoteAction::Stop);
        self.send(Some(RemoteAction::Stop))
    }

    fn resync(&mut self) -> Result<()> {
        self.life.ensure_live()?;
        let action = self.last_action;
        debug!(sound_id = %self.life.channel.id(), ?action, "Resyncing remote channel");
        self.emit(action)?;

        match action {
            Some(RemoteAction::Play) => self.life.set_state(ChannelState::Playing),
            Some(RemoteAction::Pause) => self.life.set_state(ChannelState::Paused),
            Some(RemoteAction::Stop) | None => {}
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
        self.emit(Some(RemoteAction::Play))
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

/// Creates `RemotePlayer`s on an established session
pub struct RemoteBackend {
    transport: Arc<dyn RemoteTransport>,
    namespace: String,
}

impl RemoteBackend {
    /// Backend sending on `namespace`
    pub fn new(transport: Arc<dyn RemoteTransport>, namespace: impl Into<String>) -> Self {
        Self {
            transport,
            namespace: namespace.into(),
        }
    }

    /// Namespace messages are sent on
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl PlayerFactory for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn create(&self, channel: SoundChannel, context: PlayerContext) -> Result<Box<dyn Player>> {
        Ok(Box::new(RemotePlayer::new(
            channel,
            Arc::clone(&self.transport),
            self.namespace.clone(),
            context,
        )))
    }
}
