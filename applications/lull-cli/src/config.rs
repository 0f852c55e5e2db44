/// Application configuration
use crate::error::{CliError, Result};
use lull_core::{ChannelSettings, Preset, SoundCatalog, SoundId, SoundInfo, TimePeriod};
use lull_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "lull.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub demo: DemoSettings,

    #[serde(default = "default_sounds")]
    pub sounds: Vec<SoundInfo>,

    #[serde(default = "default_preset")]
    pub preset: PresetSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoSettings {
    #[serde(default)]
    pub backend: DemoBackend,

    /// How long `lull play` runs before stopping the mix
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Length of one simulated clip of a non-loopable sound
    #[serde(default = "default_clip_secs")]
    pub clip_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DemoBackend {
    /// Simulated local rendering
    #[default]
    Local,

    /// JSON control messages on stdout
    Cast,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresetSettings {
    #[serde(default = "default_preset_name")]
    pub name: String,

    #[serde(default)]
    pub channels: Vec<ChannelSettings>,
}

impl AppConfig {
    /// Load from `path` (or `lull.toml` if present), then `LULL_*` variables
    ///
    /// Nested keys use `__`, e.g. `LULL_DEMO__DURATION_SECS=30`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("LULL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Parse an inline TOML document
    pub fn from_toml(document: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sounds.is_empty() {
            return Err(CliError::Config("At least one sound is required".to_string()));
        }

        let mut seen = HashSet::new();
        for sound in &self.sounds {
            if !seen.insert(&sound.id) {
                return Err(CliError::Config(format!("Duplicate sound id: {}", sound.id)));
            }
        }

        let catalog = self.catalog();
        for channel in &self.preset.channels {
            catalog.require(&channel.sound_id)?;
        }

        if self.demo.clip_secs == 0 {
            return Err(CliError::Config("demo.clip_secs must be positive".to_string()));
        }

        Ok(())
    }

    /// Sounds available to the mix
    pub fn catalog(&self) -> SoundCatalog {
        self.sounds.iter().cloned().collect()
    }

    /// The configured mix as a preset
    pub fn preset(&self) -> Preset {
        Preset::new(self.preset.name.clone(), self.preset.channels.clone())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.demo.duration_secs)
    }

    pub fn clip_length(&self) -> Duration {
        Duration::from_secs(self.demo.clip_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            demo: DemoSettings::default(),
            sounds: default_sounds(),
            preset: default_preset(),
        }
    }
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            backend: DemoBackend::default(),
            duration_secs: default_duration_secs(),
            clip_secs: default_clip_secs(),
        }
    }
}

// Default values
fn default_sounds() -> Vec<SoundInfo> {
    vec![
        SoundInfo::looping("rain"),
        SoundInfo::looping("wind"),
        SoundInfo::one_shot("thunder"),
        SoundInfo::one_shot("birds"),
    ]
}

fn default_preset() -> PresetSettings {
    PresetSettings {
        name: default_preset_name(),
        channels: vec![
            ChannelSettings::new(SoundId::new("rain"), 0.8, TimePeriod::DEFAULT),
            ChannelSettings::new(SoundId::new("thunder"), 0.3, TimePeriod::DEFAULT),
        ],
    }
}

fn default_preset_name() -> String {
    "Storm".to_string()
}

fn default_duration_secs() -> u64 {
    120
}

fn default_clip_secs() -> u64 {
    4
}
