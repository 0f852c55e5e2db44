//! Mix state notifications

use crate::types::MixState;
use lull_core::{ChannelSettings, Preset};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Snapshot published to observers whenever the mix changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerUpdate {
    /// Aggregate state
    pub state: MixState,

    /// Active channels in insertion order
    pub channels: Vec<ChannelSettings>,
}

impl ManagerUpdate {
    /// Update for an empty mix
    pub fn stopped() -> Self {
        Self {
            state: MixState::Stopped,
            channels: Vec::new(),
        }
    }

    /// Mix is audible (or about to be)
    pub fn is_playing(&self) -> bool {
        matches!(self.state, MixState::Playing | MixState::Buffering)
    }

    /// The active channels are exactly the preset's mix
    pub fn is_preset_active(&self, preset: &Preset) -> bool {
        !self.channels.is_empty() && preset.has_same_mix(&self.channels)
    }
}

/// Per-subscriber fan-out of `ManagerUpdate`s
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    subscribers: Vec<mpsc::UnboundedSender<ManagerUpdate>>,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber, primed with `current`
    pub(crate) fn subscribe(&mut self, current: ManagerUpdate) -> mpsc::UnboundedReceiver<ManagerUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Cannot fail: the receiver is still in hand.
        let _ = tx.send(current);
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping closed ones
    pub(crate) fn publish(&mut self, update: &ManagerUpdate) {
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());

        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            debug!(pruned, "Dropped closed subscribers");
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
