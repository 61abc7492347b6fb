use thiserror::Error;

use crate::audio_system::VoiceId;

/// Errors raised by the sound manager.
///
/// A bad sound definition leaves that slot out, or fails the whole build
/// when `strict_slots` is set. Lookup and stale-handle problems are
/// recoverable: the manager logs them and, depending on
/// [`MissingSoundPolicy`](crate::config::MissingSoundPolicy), either
/// swallows them or hands them back to the caller.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Sound definition #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("Sound '{name}' has no clip variants")]
    NoVariants { name: String },

    #[error("Sound '{name}' is defined more than once")]
    DuplicateName { name: String },

    #[error("Sound '{name}' has an invalid default pitch: {pitch}")]
    InvalidPitch { name: String, pitch: f32 },

    #[error("Sound not found: {0}")]
    NotFound(String),

    #[error("Voice is no longer registered: {0}")]
    StaleVoice(VoiceId),

    #[error("Failed to load clip: {name}")]
    ClipLoad {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Audio backend failure")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AudioError {
    /// Whether this error comes from a bad sound definition.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AudioError::EmptyName { .. }
                | AudioError::NoVariants { .. }
                | AudioError::DuplicateName { .. }
                | AudioError::InvalidPitch { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to parse configuration")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid configuration")]
    Invalid(#[source] AudioError),
}

pub type AudioResult<T> = Result<T, AudioError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = AudioError::NotFound("Footsteps".to_string());
        assert_eq!(err.to_string(), "Sound not found: Footsteps");

        let err = AudioError::NoVariants {
            name: "Wind".to_string(),
        };
        assert_eq!(err.to_string(), "Sound 'Wind' has no clip variants");
        assert!(err.is_configuration());
        assert!(!AudioError::NotFound("x".into()).is_configuration());
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::LoadFailed {
            path: "/test/sounds.json".to_string(),
            source: Box::new(io_err),
        };

        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "Failed to load configuration from /test/sounds.json"
        );

        let err = ConfigError::Invalid(AudioError::EmptyName { index: 2 });
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Sound definition #2 has an empty name".to_string())
        );
    }
}
