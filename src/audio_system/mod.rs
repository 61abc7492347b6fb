//! Audio system module
//!
//! Runtime playback manager for interactive applications:
//! - Named sound slots that crossfade between clip variants
//! - Looping sound and music channels that survive (or not) level loads
//! - One-shots with a duplicate cap and volume damping
//!
//! ## Architecture
//!
//! ```text
//! AudioManager
//!   ├── SoundSlot ("Footsteps")   variants crossfade on play
//!   ├── SoundSlot ("Door")
//!   ├── ChannelRegistry
//!   │     ├── sound loops   ─┐ LoopingPlayback, tagged with
//!   │     ├── music loops   ─┘ the level-load generation
//!   │     └── music one-shots
//!   ├── DuplicateThrottle     in-flight one-shot volumes per clip
//!   └── VoicePool             caller voices, scene-owned or persistent
//!
//! Everything is advanced by AudioManager::update(delta):
//!   commands → slot fades → registry fades/reaper → throttle expiry
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sound_manager::audio_system::{AudioManager, Clip};
//!
//! let mut manager = AudioManager::new(&config, &mut backend)?;
//!
//! // Slots defined in the config
//! manager.play("Footsteps")?;
//! manager.play_variant_with_fade("Theme", 1, 2.0)?;
//!
//! // Caller-owned voices
//! let music = manager.register_voice(voice);
//! manager.play_looping_music(music, 0.8, 1.0, true)?;
//!
//! // Once per frame
//! manager.update(dt);
//!
//! // On scene change
//! manager.on_level_loaded();
//! ```

pub mod effects;
pub mod groups;
pub mod looping;
pub mod manager;
#[cfg(feature = "playback")]
pub mod player;
pub mod pool;
pub mod registry;
pub mod slot;
pub mod source;
pub mod throttle;
pub mod voice;

// Re-export commonly used types
pub use effects::{ChannelVolume, FadeStep, FadeTimer};
pub use groups::{LoopingGroup, OneShotGroup};
pub use looping::LoopingPlayback;
pub use manager::AudioManager;
#[cfg(feature = "playback")]
pub use player::{RodioBackend, RodioVoice};
pub use pool::{VoiceId, VoiceOwner, VoicePool};
pub use registry::{ChannelRegistry, RegistryReport};
pub use slot::{SlotState, SoundSlot};
pub use source::Channel;
pub use throttle::{DuplicateThrottle, ThrottleDecision};
pub use voice::{AudioBackend, Clip, ClipId, Voice, VoiceSettings};
