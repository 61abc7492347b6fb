use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{AudioError, ConfigError};

fn default_volume() -> f32 {
    1.0
}

fn default_pitch() -> f32 {
    1.0
}

fn default_max_duplicates() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// What happens when a caller names a sound that was never configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSoundPolicy {
    /// Log a warning and treat the call as a no-op
    #[default]
    Ignore,
    /// Log a warning and return [`AudioError::NotFound`]
    Error,
}

/// Static definition of one named sound slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundDefinition {
    /// Unique, non-empty lookup key
    pub name: String,

    /// Clip names, one voice is created per entry
    pub clips: Vec<String>,

    /// Volume the play fade ramps toward (0.0-1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Pitch restored by `reset_pitch`
    #[serde(default = "default_pitch")]
    pub pitch: f32,

    /// Fade used when a call does not pass one
    #[serde(default)]
    pub fade_seconds: f32,

    #[serde(default)]
    pub looping: bool,

    /// 0.0 = 2D, 1.0 = fully 3D. Forwarded to the backend untouched.
    #[serde(default)]
    pub spatial_blend: f32,

    /// Mixer group name. Forwarded to the backend untouched.
    #[serde(default)]
    pub routing_group: Option<String>,
}

impl SoundDefinition {
    /// Create a definition with default volume, pitch and no fade
    pub fn new(name: impl Into<String>, clips: Vec<String>) -> Self {
        Self {
            name: name.into(),
            clips,
            volume: default_volume(),
            pitch: default_pitch(),
            fade_seconds: 0.0,
            looping: false,
            spatial_blend: 0.0,
            routing_group: None,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_fade(mut self, seconds: f32) -> Self {
        self.fade_seconds = seconds.max(0.0);
        self
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }
}

/// Sound manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Slot definitions, in declaration order
    #[serde(default)]
    pub sounds: Vec<SoundDefinition>,

    /// Maximum number of the same clip playing as a one-shot at once
    #[serde(default = "default_max_duplicates")]
    pub max_duplicate_instances: usize,

    /// Set to false for additive level loading
    #[serde(default = "default_true")]
    pub stop_sounds_on_level_load: bool,

    /// Pause loops when the application loses focus
    #[serde(default = "default_true")]
    pub pause_on_focus_loss: bool,

    #[serde(default = "default_volume")]
    pub sound_volume: f32,

    #[serde(default = "default_volume")]
    pub music_volume: f32,

    #[serde(default)]
    pub missing_sound: MissingSoundPolicy,

    /// Refuse to build the manager when any definition is bad. Otherwise
    /// the bad slot is logged and left out.
    #[serde(default)]
    pub strict_slots: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sounds: Vec::new(),
            max_duplicate_instances: default_max_duplicates(),
            stop_sounds_on_level_load: true,
            pause_on_focus_loss: true,
            sound_volume: 1.0,
            music_volume: 1.0,
            missing_sound: MissingSoundPolicy::Ignore,
            strict_slots: false,
        }
    }
}

impl AudioConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        let config = Self::from_json(&content)?;
        tracing::info!(
            "Loaded audio config from {} ({} sounds)",
            path.display(),
            config.sounds.len()
        );
        Ok(config)
    }

    /// Parse a configuration from a JSON string. With `strict_slots` the
    /// definitions are validated as well.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AudioConfig = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        if config.strict_slots {
            config.validate().map_err(ConfigError::Invalid)?;
        }
        Ok(config)
    }

    /// Save configuration as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let save_err = |e: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| save_err(Box::new(e)))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| save_err(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_err(Box::new(e)))?;

        tracing::info!("Saved audio config to {}", path.display());
        Ok(())
    }

    /// Check every slot definition. The first problem found is returned.
    pub fn validate(&self) -> Result<(), AudioError> {
        let mut seen = HashSet::new();

        for (index, sound) in self.sounds.iter().enumerate() {
            sound.check(index)?;
            if !seen.insert(sound.name.as_str()) {
                return Err(AudioError::DuplicateName {
                    name: sound.name.clone(),
                });
            }
        }

        Ok(())
    }
}

impl SoundDefinition {
    /// Check this definition on its own. `index` is its position in the config.
    pub fn check(&self, index: usize) -> Result<(), AudioError> {
        if self.name.trim().is_empty() {
            return Err(AudioError::EmptyName { index });
        }
        if self.clips.is_empty() {
            return Err(AudioError::NoVariants {
                name: self.name.clone(),
            });
        }
        if !(self.pitch > 0.0) {
            return Err(AudioError::InvalidPitch {
                name: self.name.clone(),
                pitch: self.pitch,
            });
        }
        Ok(())
    }
}
