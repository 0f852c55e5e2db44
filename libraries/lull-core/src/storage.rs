//! Preset persistence contract

use crate::error::{LullError, Result};
use crate::types::{ChannelSettings, Preset, PresetId};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Persistence collaborator for presets
///
/// Implementations are synchronous and authoritative: the playback layer
/// never caches presets beyond the mix that is currently playing.
pub trait PresetStore: Send + Sync {
    /// All presets in creation order
    fn list(&self) -> Result<Vec<Preset>>;

    /// Get a preset by ID
    fn get(&self, id: &PresetId) -> Result<Option<Preset>>;

    /// Create a preset with a newly generated ID
    fn create(&self, name: &str, player_states: Vec<ChannelSettings>) -> Result<Preset>;

    /// Replace a stored preset (matched by ID)
    ///
    /// # Errors
    /// `PresetNotFound` if no preset has this ID
    fn update(&self, preset: &Preset) -> Result<()>;

    /// Delete a preset
    ///
    /// Returns `false` if the preset did not exist.
    fn delete(&self, id: &PresetId) -> Result<bool>;
}

/// Process-local preset store
///
/// Backs the demo binary and tests; durable storage lives elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryPresetStore {
    presets: RwLock<Vec<Preset>>,
}

impl InMemoryPresetStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with presets
    pub fn with_presets(presets: Vec<Preset>) -> Self {
        Self {
            presets: RwLock::new(presets),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Preset>>> {
        self.presets
            .read()
            .map_err(|_| LullError::storage("preset store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Preset>>> {
        self.presets
            .write()
            .map_err(|_| LullError::storage("preset store lock poisoned"))
    }
}

impl PresetStore for InMemoryPresetStore {
    fn list(&self) -> Result<Vec<Preset>> {
        Ok(self.read()?.clone())
    }

    fn get(&self, id: &PresetId) -> Result<Option<Preset>> {
        Ok(self.read()?.iter().find(|p| &p.id == id).cloned())
    }

    fn create(&self, name: &str, player_states: Vec<ChannelSettings>) -> Result<Preset> {
        let preset = Preset::new(name, player_states);
        debug!(preset_id = %preset.id, name, "Creating preset");
        self.write()?.push(preset.clone());
        Ok(preset)
    }

    fn update(&self, preset: &Preset) -> Result<()> {
        let mut presets = self.write()?;
        let slot = presets
            .iter_mut()
            .find(|p| p.id == preset.id)
            .ok_or_else(|| LullError::PresetNotFound(preset.id.clone()))?;
        *slot = preset.clone();
        Ok(())
    }

    fn delete(&self, id: &PresetId) -> Result<bool> {
        let mut presets = self.write()?;
        let before = presets.len();
        presets.retain(|p| &p.id != id);
        let deleted = presets.len() != before;
        debug!(preset_id = %id, deleted, "Deleting preset");
        Ok(deleted)
    }
}
