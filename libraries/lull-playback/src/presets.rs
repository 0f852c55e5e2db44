//! Preset-driven mix control

use crate::error::Result;
use crate::manager::PlayerManager;
use lull_core::{LullError, Preset, PresetId, PresetStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Couples a preset store with the mix
///
/// The store stays authoritative; nothing here caches presets.
#[derive(Clone)]
pub struct PresetController {
    store: Arc<dyn PresetStore>,
}

impl PresetController {
    /// Create a controller over `store`
    pub fn new(store: Arc<dyn PresetStore>) -> Self {
        Self { store }
    }

    /// All presets in creation order
    pub fn list(&self) -> Result<Vec<Preset>> {
        Ok(self.store.list()?)
    }

    /// Make `id` the playing mix
    pub fn play(&self, manager: &mut PlayerManager, id: &PresetId) -> Result<Preset> {
        let preset = self.require(id)?;
        manager.apply_preset(&preset)?;
        Ok(preset)
    }

    /// Play/stop button: stops the mix if `id` is active, plays it otherwise
    ///
    /// Returns whether the preset is playing afterwards.
    pub fn toggle(&self, manager: &mut PlayerManager, id: &PresetId) -> Result<bool> {
        let preset = self.require(id)?;
        if manager.is_preset_active(&preset) {
            manager.stop_all()?;
            return Ok(false);
        }

        manager.apply_preset(&preset)?;
        Ok(true)
    }

    /// Save the current mix as a new preset
    pub fn save_current(&self, manager: &PlayerManager, name: &str) -> Result<Preset> {
        let preset = self.store.create(name, manager.snapshot())?;
        info!(id = %preset.id, name, channels = preset.player_states.len(), "Preset saved");
        Ok(preset)
    }

    /// Rename a preset
    pub fn rename(&self, id: &PresetId, name: &str) -> Result<Preset> {
        let mut preset = self.require(id)?;
        preset.name = name.to_string();
        self.store.update(&preset)?;
        Ok(preset)
    }

    /// Delete a preset, stopping the mix first if it is the active one
    ///
    /// Returns `false` if the preset did not exist.
    pub fn delete(&self, manager: &mut PlayerManager, id: &PresetId) -> Result<bool> {
        let Some(preset) = self.store.get(id)? else {
            return Ok(false);
        };

        if manager.is_preset_active(&preset) {
            info!(id = %preset.id, "Stopping active preset before delete");
            // Channels are gone even if a backend complained.
            if let Err(e) = manager.stop_all() {
                warn!(id = %preset.id, error = %e, "Backend error while stopping deleted preset");
            }
        }
        Ok(self.store.delete(id)?)
    }

    /// Whether `id` is the mix currently loaded
    pub fn is_active(&self, manager: &PlayerManager, id: &PresetId) -> Result<bool> {
        Ok(self
            .store
            .get(id)?
            .is_some_and(|preset| manager.is_preset_active(&preset)))
    }

    fn require(&self, id: &PresetId) -> Result<Preset> {
        self.store
            .get(id)?
            .ok_or_else(|| LullError::PresetNotFound(id.clone()).into())
    }
}

impl std::fmt::Debug for PresetController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetController").finish_non_exhaustive()
    }
}
