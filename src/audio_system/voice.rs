//! Voice abstraction
//!
//! A voice is the engine-side playback handle. The manager only ever starts,
//! stops, pauses and re-levels voices; decoding and mixing stay on the other
//! side of this trait.

use std::fmt;
use std::sync::Arc;

use crate::error::AudioResult;

/// Comparable identity of a decoded clip
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(Arc<str>);

impl ClipId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a decoded clip plus its playback length
#[derive(Debug, Clone)]
pub struct Clip {
    id: ClipId,
    duration: f32,
}

impl Clip {
    /// Create a clip handle. Negative durations are treated as zero.
    pub fn new(name: impl AsRef<str>, duration_secs: f32) -> Self {
        Self {
            id: ClipId::new(name),
            duration: duration_secs.max(0.0),
        }
    }

    pub fn id(&self) -> &ClipId {
        &self.id
    }

    /// Playback length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl PartialEq for Clip {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Clip {}

/// Playback handle driven by the manager.
///
/// Implementations are expected to be cheap to call every tick. None of the
/// methods can fail: a backend that hits an error should log it and leave the
/// voice silent.
pub trait Voice: Send {
    /// Start (or restart) the voice's own clip
    fn start(&mut self);

    fn stop(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    fn set_pitch(&mut self, pitch: f32);

    fn pitch(&self) -> f32;

    /// True while anything is audible on this voice. Paused voices are not playing.
    fn is_playing(&self) -> bool;

    /// Length of the voice's own clip in seconds
    fn clip_duration(&self) -> f32;

    /// Layer `clip` on top of whatever the voice is doing, scaled by
    /// `volume_scale` relative to the voice volume.
    fn play_one_shot(&mut self, clip: &Clip, volume_scale: f32);
}

/// Per-voice settings handed to the backend when slot voices are created
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    pub spatial_blend: f32,
    pub routing_group: Option<String>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            volume: 0.0,
            pitch: 1.0,
            looping: false,
            spatial_blend: 0.0,
            routing_group: None,
        }
    }
}

/// Source of clips and voices, consulted while the manager is being built
pub trait AudioBackend {
    /// Resolve a clip by name
    fn load_clip(&mut self, name: &str) -> AudioResult<Clip>;

    /// Create a stopped voice bound to `clip`
    fn create_voice(&mut self, clip: &Clip, settings: &VoiceSettings) -> AudioResult<Box<dyn Voice>>;
}
