//! Mix service actor
//!
//! Runs a `PlayerManager` on its own task so any number of callers can
//! drive one mix. Commands and backend events are applied on the same
//! task, one at a time, in arrival order.

use crate::error::{PlaybackError, Result};
use crate::events::ManagerUpdate;
use crate::manager::PlayerManager;
use crate::player::{ChannelEvent, PlayerFactory};
use lull_core::{Preset, SoundId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Reply<T> = oneshot::Sender<T>;

/// Closure run against the manager on the service task
pub type ManagerFn = Box<dyn FnOnce(&mut PlayerManager) + Send>;

/// Request handled by the mix service
pub enum MixCommand {
    /// Replace the mix with a preset
    ApplyPreset {
        /// Preset to apply
        preset: Preset,
        /// Outcome
        reply: Reply<Result<()>>,
    },
    /// Pause every channel
    PauseAll {
        /// Outcome
        reply: Reply<Result<()>>,
    },
    /// Resume every channel
    ResumeAll {
        /// Outcome
        reply: Reply<Result<()>>,
    },
    /// Stop and drop every channel
    StopAll {
        /// Outcome
        reply: Reply<Result<()>>,
    },
    /// Change one channel's volume
    SetChannelVolume {
        /// Channel
        sound_id: SoundId,
        /// New volume, clamped
        volume: f32,
        /// Outcome
        reply: Reply<Result<()>>,
    },
    /// Move the mix to a remote receiver
    AttachRemote {
        /// Factory for remote players
        factory: Arc<dyn PlayerFactory>,
        /// Outcome
        reply: Reply<Result<()>>,
    },
    /// Move the mix back to local rendering
    DetachRemote {
        /// Outcome
        reply: Reply<Result<()>>,
    },
    /// Re-send remote channel state after a reconnect
    Resync {
        /// Outcome
        reply: Reply<Result<()>>,
    },
    /// Register an observer
    Subscribe {
        /// Update stream, primed with the current state
        reply: Reply<mpsc::UnboundedReceiver<ManagerUpdate>>,
    },
    /// Read the current state
    Snapshot {
        /// Current update
        reply: Reply<ManagerUpdate>,
    },
    /// Run arbitrary code against the manager
    Run(ManagerFn),
    /// Stop every channel and end the task
    Shutdown,
}

enum Step {
    Command(MixCommand),
    Event(ChannelEvent),
    Closed,
}

/// Task owning a `PlayerManager`
pub struct MixService {
    manager: PlayerManager,
    commands: mpsc::Receiver<MixCommand>,
}

impl MixService {
    /// Spawn the service on the current runtime
    ///
    /// The task ends after `MixHandle::shutdown` or once every handle is
    /// dropped; it stops the mix on the way out.
    pub fn spawn(manager: PlayerManager, buffer: usize) -> (MixHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(buffer.max(1));
        let service = Self { manager, commands };
        (MixHandle { tx }, tokio::spawn(service.run()))
    }

    async fn run(mut self) {
        info!("Mix service started");

        loop {
            let step = tokio::select! {
                command = self.commands.recv() => command.map_or(Step::Closed, Step::Command),
                Some(event) = self.manager.next_event() => Step::Event(event),
            };

            match step {
                Step::Command(MixCommand::Shutdown) | Step::Closed => break,
                Step::Command(command) => self.execute(command),
                Step::Event(event) => self.manager.handle_event(event),
            }
        }

        if let Err(e) = self.manager.stop_all() {
            warn!(error = %e, "Backend error while shutting down");
        }
        info!("Mix service stopped");
    }

    fn execute(&mut self, command: MixCommand) {
        let manager = &mut self.manager;
        match command {
            MixCommand::ApplyPreset { preset, reply } => {
                let _ = reply.send(manager.apply_preset(&preset));
            }
            MixCommand::PauseAll { reply } => {
                let _ = reply.send(manager.pause_all());
            }
            MixCommand::ResumeAll { reply } => {
                let _ = reply.send(manager.resume_all());
            }
            MixCommand::StopAll { reply } => {
                let _ = reply.send(manager.stop_all());
            }
            MixCommand::SetChannelVolume {
                sound_id,
                volume,
                reply,
            } => {
                let _ = reply.send(manager.set_channel_volume(&sound_id, volume));
            }
            MixCommand::AttachRemote { factory, reply } => {
                let _ = reply.send(manager.attach_remote(factory));
            }
            MixCommand::DetachRemote { reply } => {
                let _ = reply.send(manager.detach_remote());
            }
            MixCommand::Resync { reply } => {
                let _ = reply.send(manager.resync_remote());
            }
            MixCommand::Subscribe { reply } => {
                let _ = reply.send(manager.subscribe());
            }
            MixCommand::Snapshot { reply } => {
                let _ = reply.send(manager.current_update());
            }
            MixCommand::Run(f) => f(manager),
            MixCommand::Shutdown => debug!("Shutdown handled by the run loop"),
        }
    }
}

/// Cloneable handle to a running `MixService`
#[derive(Clone)]
pub struct MixHandle {
    tx: mpsc::Sender<MixCommand>,
}

impl MixHandle {
    /// Replace the mix with `preset`
    pub async fn apply_preset(&self, preset: Preset) -> Result<()> {
        self.request(|reply| MixCommand::ApplyPreset { preset, reply })
            .await?
    }

    /// Pause every channel
    pub async fn pause_all(&self) -> Result<()> {
        self.request(|reply| MixCommand::PauseAll { reply }).await?
    }

    /// Resume every channel
    pub async fn resume_all(&self) -> Result<()> {
        self.request(|reply| MixCommand::ResumeAll { reply }).await?
    }

    /// Stop and drop every channel
    pub async fn stop_all(&self) -> Result<()> {
        self.request(|reply| MixCommand::StopAll { reply }).await?
    }

    /// Change one channel's volume
    pub async fn set_channel_volume(&self, sound_id: SoundId, volume: f32) -> Result<()> {
        self.request(|reply| MixCommand::SetChannelVolume {
            sound_id,
            volume,
            reply,
        })
        .await?
    }

    /// Move the mix to a remote receiver
    pub async fn attach_remote(&self, factory: Arc<dyn PlayerFactory>) -> Result<()> {
        self.request(|reply| MixCommand::AttachRemote { factory, reply })
            .await?
    }

    /// Move the mix back to local rendering
    pub async fn detach_remote(&self) -> Result<()> {
        self.request(|reply| MixCommand::DetachRemote { reply }).await?
    }

    /// Re-send remote channel state
    pub async fn resync(&self) -> Result<()> {
        self.request(|reply| MixCommand::Resync { reply }).await?
    }

    /// Register an observer
    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<ManagerUpdate>> {
        self.request(|reply| MixCommand::Subscribe { reply }).await
    }

    /// Current state and channels
    pub async fn snapshot(&self) -> Result<ManagerUpdate> {
        self.request(|reply| MixCommand::Snapshot { reply }).await
    }

    /// Run `f` against the manager on the service task
    ///
    /// Lets collaborators such as `PresetController` act on the mix without
    /// a dedicated command.
    pub async fn with_manager<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PlayerManager) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.request(|reply| {
            MixCommand::Run(Box::new(move |manager| {
                let _ = reply.send(f(manager));
            }))
        })
        .await
    }

    /// Stop the mix and end the service task
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(MixCommand::Shutdown)
            .await
            .map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Whether the service task is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> MixCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| PlaybackError::ServiceClosed)?;
        rx.await.map_err(|_| PlaybackError::ServiceClosed)
    }
}

impl std::fmt::Debug for MixHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
