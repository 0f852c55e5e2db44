//! Mix-level orchestration
//!
//! `PlayerManager` owns every active player, derives the aggregate
//! `MixState` on demand and notifies observers once per logical change.
//! All mutation happens through `&mut self`; asynchronous completions are
//! queued as `ChannelEvent`s and applied when the owner drains them.

use crate::error::Result;
use crate::events::{ManagerUpdate, ObserverRegistry};
use crate::player::{ChannelEvent, EventSender, InstanceId, Player, PlayerContext, PlayerFactory};
use crate::scheduler::IntervalScheduler;
use crate::types::{BackendKind, ChannelState, MixState, PlaybackConfig};
use lull_core::{ChannelSettings, Preset, SoundCatalog, SoundChannel, SoundId, SoundInfo};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owner of the active mix
pub struct PlayerManager {
    catalog: Arc<SoundCatalog>,
    local: Arc<dyn PlayerFactory>,
    remote: Option<Arc<dyn PlayerFactory>>,
    players: Vec<Box<dyn Player>>,
    scheduler: IntervalScheduler,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    events_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    observers: ObserverRegistry,
    next_instance: InstanceId,
    last_published: ManagerUpdate,
}

impl PlayerManager {
    /// Create an empty manager rendering on `local`
    pub fn new(catalog: Arc<SoundCatalog>, local: Arc<dyn PlayerFactory>, config: &PlaybackConfig) -> Self {
        let scheduler = config
            .replay_seed
            .map_or_else(IntervalScheduler::new, IntervalScheduler::seeded);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            catalog,
            local,
            remote: None,
            players: Vec::new(),
            scheduler,
            events_tx,
            events_rx,
            observers: ObserverRegistry::new(),
            next_instance: 1,
            last_published: ManagerUpdate::stopped(),
        }
    }

    /// Replace the replay delay source
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: IntervalScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    // ===== Mix control =====

    /// Make the mix match `preset` exactly
    ///
    /// Every entry is validated against the catalog before anything
    /// changes. Channels absent from the preset are stopped; the rest are
    /// created or updated and played. Observers see one update for the
    /// whole swap.
    ///
    /// # Errors
    /// `Core(UnknownSound)` without side effects for an unknown sound. A
    /// backend failure is returned after the remaining channels were
    /// applied; the failing channel is left `Failed`.
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<()> {
        let entries = preset
            .player_states
            .iter()
            .map(|settings| {
                self.catalog
                    .require(&settings.sound_id)
                    .map(|info| (info.clone(), settings.clone()))
            })
            .collect::<lull_core::Result<Vec<(SoundInfo, ChannelSettings)>>>()?;

        info!(preset = %preset.name, channels = entries.len(), "Applying preset");

        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.players)
            .into_iter()
            .partition(|player| preset.settings_for(player.sound_id()).is_some());
        self.players = kept;
        for player in removed {
            Self::release(player);
        }

        let mut first_error = None;
        for (info, settings) in entries {
            if let Err(e) = self.apply_channel(&info, &settings) {
                warn!(sound_id = %settings.sound_id, error = %e, "Could not apply channel");
                first_error.get_or_insert(e);
            }
        }

        self.publish();
        first_error.map_or(Ok(()), Err)
    }

    /// Pause every channel
    pub fn pause_all(&mut self) -> Result<()> {
        info!(channels = self.players.len(), "Pausing mix");
        let result = self.broadcast(|player| player.pause());
        self.publish();
        result
    }

    /// Resume every channel
    pub fn resume_all(&mut self) -> Result<()> {
        info!(channels = self.players.len(), "Resuming mix");
        let result = self.broadcast(|player| player.play());
        self.publish();
        result
    }

    /// Stop and drop every channel
    ///
    /// Channels are always removed; the first backend error is still
    /// reported.
    pub fn stop_all(&mut self) -> Result<()> {
        info!(channels = self.players.len(), "Stopping mix");

        let mut first_error = None;
        for mut player in std::mem::take(&mut self.players) {
            if let Err(e) = player.stop() {
                warn!(sound_id = %player.sound_id(), error = %e, "Backend error while stopping");
                first_error.get_or_insert(e);
            }
        }

        self.publish();
        first_error.map_or(Ok(()), Err)
    }

    /// Set one channel's volume; no-op if the sound is not active
    pub fn set_channel_volume(&mut self, sound_id: &SoundId, volume: f32) -> Result<()> {
        let Some(player) = self.players.iter_mut().find(|p| p.sound_id() == sound_id) else {
            debug!(%sound_id, "Volume change for inactive channel ignored");
            return Ok(());
        };

        let result = player.set_volume(volume);
        self.publish();
        result
    }

    // ===== Backends =====

    /// Backend new channels are created on
    pub fn backend(&self) -> BackendKind {
        self.factory().kind()
    }

    /// Move the mix to a remote receiver
    ///
    /// # Errors
    /// First failure replaying a channel on the receiver; that channel is
    /// removed.
    pub fn attach_remote(&mut self, factory: Arc<dyn PlayerFactory>) -> Result<()> {
        info!("Remote backend attached");
        self.remote = Some(factory);
        self.switch_backend()
    }

    /// Move the mix back to local rendering
    pub fn detach_remote(&mut self) -> Result<()> {
        if self.remote.take().is_none() {
            return Ok(());
        }
        info!("Remote backend detached");
        self.switch_backend()
    }

    /// Re-send the full state of every remote channel
    ///
    /// Used after the session reconnects.
    pub fn resync_remote(&mut self) -> Result<()> {
        let mut first_error = None;
        for player in self.players.iter_mut().filter(|p| p.backend() == BackendKind::Remote) {
            if let Err(e) = player.resync() {
                warn!(sound_id = %player.sound_id(), error = %e, "Resync failed");
                first_error.get_or_insert(e);
            }
        }

        self.publish();
        first_error.map_or(Ok(()), Err)
    }

    // ===== Queries =====

    /// Aggregate state, derived from the players in insertion order
    pub fn state(&self) -> MixState {
        MixState::derive(self.players.iter().map(|p| p.state()))
    }

    /// Current settings of every active channel in insertion order
    pub fn snapshot(&self) -> Vec<ChannelSettings> {
        self.players.iter().map(|p| p.settings()).collect()
    }

    /// Whether the active mix is exactly `preset`
    pub fn is_preset_active(&self, preset: &Preset) -> bool {
        self.current_update().is_preset_active(preset)
    }

    /// State of one channel, `None` if it is not active
    pub fn channel_state(&self, sound_id: &SoundId) -> Option<ChannelState> {
        self.find(sound_id).map(|p| p.state())
    }

    /// Active sound ids in insertion order
    pub fn active_channels(&self) -> Vec<SoundId> {
        self.players.iter().map(|p| p.sound_id().clone()).collect()
    }

    /// Catalog the manager validates against
    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    /// Receive an update after every observable change
    ///
    /// The first message is the current state.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ManagerUpdate> {
        let current = self.current_update();
        self.observers.subscribe(current)
    }

    // ===== Events =====

    /// Handle for backends reporting completions from other threads
    pub fn event_sender(&self) -> EventSender {
        EventSender::new(self.events_tx.clone())
    }

    /// Apply every queued event; returns how many were handled
    pub fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next queued event
    ///
    /// Cancel-safe; pass the result to `handle_event`.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events_rx.recv().await
    }

    /// Apply one backend or timer event
    ///
    /// Events for channels that are no longer active, or that come from a
    /// replaced player, are dropped.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        let Some(index) = self.players.iter().position(|p| p.sound_id() == event.sound_id()) else {
            debug!(sound_id = %event.sound_id(), "Event for inactive channel dropped");
            return;
        };
        let player = &mut self.players[index];

        let result = match event {
            ChannelEvent::ClipFinished { instance, .. } if instance == player.instance() => {
                player.on_clip_finished(&mut self.scheduler)
            }
            ChannelEvent::ReplayDue {
                instance, generation, ..
            } if instance == player.instance() => player.on_replay_due(generation),
            ChannelEvent::Buffering {
                instance, buffering, ..
            } if instance == player.instance() => {
                player.set_buffering(buffering);
                Ok(())
            }
            ChannelEvent::DeliveryFailed {
                sound_id,
                instance,
                reason,
            } if instance == player.instance() => {
                warn!(%sound_id, %reason, "Remote delivery failed");
                player.mark_failed();
                Ok(())
            }
            stale => {
                debug!(sound_id = %stale.sound_id(), "Event from replaced player dropped");
                return;
            }
        };

        if let Err(e) = result {
            warn!(sound_id = %player.sound_id(), error = %e, "Channel event failed");
        }
        self.publish();
    }

    // ===== Internals =====

    fn factory(&self) -> Arc<dyn PlayerFactory> {
        Arc::clone(self.remote.as_ref().unwrap_or(&self.local))
    }

    fn context(&mut self) -> PlayerContext {
        let instance = self.next_instance;
        self.next_instance += 1;
        PlayerContext {
            instance,
            events: self.event_sender(),
        }
    }

    fn find(&self, sound_id: &SoundId) -> Option<&dyn Player> {
        self.players
            .iter()
            .find(|p| p.sound_id() == sound_id)
            .map(AsRef::as_ref)
    }

    fn apply_channel(&mut self, info: &SoundInfo, settings: &ChannelSettings) -> Result<()> {
        if let Some(player) = self.players.iter_mut().find(|p| p.sound_id() == &settings.sound_id) {
            player.set_time_period(settings.time_period);
            player.set_volume(settings.volume)?;
            return player.play();
        }

        let channel = SoundChannel::from_settings(info, settings);
        let context = self.context();
        let player = self.factory().create(channel, context)?;
        debug!(sound_id = %settings.sound_id, backend = ?player.backend(), "Channel created");

        self.players.push(player);
        match self.players.last_mut() {
            Some(player) => player.play(),
            None => Ok(()),
        }
    }

    fn broadcast<F>(&mut self, mut op: F) -> Result<()>
    where
        F: FnMut(&mut dyn Player) -> Result<()>,
    {
        let mut first_error = None;
        for player in &mut self.players {
            if let Err(e) = op(player.as_mut()) {
                warn!(sound_id = %player.sound_id(), error = %e, "Channel control failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn switch_backend(&mut self) -> Result<()> {
        if self.players.is_empty() {
            return Ok(());
        }

        let target = self.factory();
        info!(backend = ?target.kind(), channels = self.players.len(), "Switching backend");

        let buffering = ManagerUpdate {
            state: MixState::Buffering,
            channels: self.snapshot(),
        };
        self.observers.publish(&buffering);
        self.last_published = buffering;

        let mut first_error = None;
        for mut old in std::mem::take(&mut self.players) {
            let was = old.state();
            let waiting = old.is_awaiting_replay();
            let channel = old.channel().clone();
            if let Err(e) = old.stop() {
                debug!(sound_id = %channel.id(), error = %e, "Old backend failed to stop channel");
            }
            drop(old);

            match self.replay_on(target.as_ref(), channel, was, waiting) {
                Ok(player) => self.players.push(player),
                Err(e) => {
                    warn!(error = %e, "Channel dropped during backend switch");
                    first_error.get_or_insert(e);
                }
            }
        }

        self.publish();
        first_error.map_or(Ok(()), Err)
    }

    fn replay_on(
        &mut self,
        factory: &dyn PlayerFactory,
        channel: SoundChannel,
        was: ChannelState,
        waiting: bool,
    ) -> Result<Box<dyn Player>> {
        let context = self.context();
        let mut player = factory.create(channel, context)?;

        // A one-shot between clips keeps waiting; the delay is drawn afresh.
        let started = match was {
            ChannelState::Paused if waiting => player.adopt_wait(true, &mut self.scheduler),
            ChannelState::Playing | ChannelState::Buffering if waiting => {
                player.adopt_wait(false, &mut self.scheduler)
            }
            ChannelState::Paused => player.play().and_then(|()| player.pause()),
            ChannelState::Stopped => Ok(()),
            ChannelState::Playing | ChannelState::Buffering | ChannelState::Failed => player.play(),
        };

        if let Err(e) = started {
            if let Err(stop_err) = player.stop() {
                debug!(sound_id = %player.sound_id(), error = %stop_err, "Replacement failed to stop");
            }
            return Err(e);
        }
        Ok(player)
    }

    fn release(mut player: Box<dyn Player>) {
        debug!(sound_id = %player.sound_id(), "Channel removed");
        if let Err(e) = player.stop() {
            warn!(sound_id = %player.sound_id(), error = %e, "Backend error while stopping");
        }
    }

    /// State and channels as observers see them
    pub fn current_update(&self) -> ManagerUpdate {
        ManagerUpdate {
            state: self.state(),
            channels: self.snapshot(),
        }
    }

    fn publish(&mut self) {
        let update = self.current_update();
        if update == self.last_published {
            return;
        }

        if update.state != self.last_published.state {
            info!(state = ?update.state, channels = update.channels.len(), "Mix state changed");
        }
        self.observers.publish(&update);
        self.last_published = update;
    }
}

impl Drop for PlayerManager {
    fn drop(&mut self) {
        for player in std::mem::take(&mut self.players) {
            Self::release(player);
        }
    }
}

impl std::fmt::Debug for PlayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerManager")
            .field("backend", &self.backend())
            .field("state", &self.state())
            .field("channels", &self.active_channels())
            .finish_non_exhaustive()
    }
}

