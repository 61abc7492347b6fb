//! Runtime sound manager
//!
//! Named sound slots with variant crossfades, looping sound and music
//! channels with level-load lifecycle, and duplicate-aware one-shots.
//! Playback goes through the [`audio_system::Voice`] trait; the optional
//! `playback` feature provides a rodio implementation.

pub mod audio_system;
pub mod config;
pub mod error;
pub mod messaging;
pub mod testing;

pub use audio_system::{AudioManager, Channel, Clip, SlotState, Voice, VoiceId};
pub use config::{AudioConfig, MissingSoundPolicy, SoundDefinition};
pub use error::{AudioError, AudioResult, ConfigError};
