/// Audio commands
///
/// Commands are requests for the manager to do something (imperative).
/// They are queued from any thread and executed on the next tick.
use crate::audio_system::pool::VoiceId;
use crate::audio_system::source::Channel;
use crate::audio_system::voice::Clip;

/// Manager operations that can be queued
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Play a slot. `None` picks a random variant or the slot's default fade.
    Play {
        name: String,
        variant: Option<usize>,
        fade: Option<f32>,
    },

    /// Fade a slot out
    Stop { name: String, fade: Option<f32> },

    /// Ramp a slot's pitch
    SetPitch {
        name: String,
        pitch: f32,
        fade: Option<f32>,
    },

    /// Return a slot to its configured pitch
    ResetPitch { name: String },

    /// Start a looping voice
    PlayLooping {
        channel: Channel,
        voice: VoiceId,
        volume_scale: f32,
        fade: f32,
        persist: bool,
    },

    /// Fade a looping voice out
    StopLooping { channel: Channel, voice: VoiceId },

    /// Fire a one-shot
    PlayOneShot {
        channel: Channel,
        voice: VoiceId,
        clip: Clip,
        volume_scale: f32,
    },

    /// Change a global channel volume
    SetVolume { channel: Channel, volume: f32 },

    StopAll,
    StopAllLooping,
    StopNonLooping,
    StopAllSlots,
    PauseAll,
    ResumeAll,

    /// The application gained or lost focus
    ApplicationFocus { focused: bool },

    /// A new level/scene was loaded
    LevelLoaded,
}

impl AudioCommand {
    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            AudioCommand::Play { name, variant, .. } => match variant {
                Some(v) => format!("Play {} (variant {})", name, v),
                None => format!("Play {}", name),
            },
            AudioCommand::Stop { name, .. } => format!("Stop {}", name),
            AudioCommand::SetPitch { name, pitch, .. } => {
                format!("Set pitch of {} to {:.2}", name, pitch)
            }
            AudioCommand::ResetPitch { name } => format!("Reset pitch of {}", name),
            AudioCommand::PlayLooping { channel, voice, .. } => {
                format!("Play {} loop on {}", channel, voice)
            }
            AudioCommand::StopLooping { channel, voice } => {
                format!("Stop {} loop on {}", channel, voice)
            }
            AudioCommand::PlayOneShot { channel, clip, .. } => {
                format!("Play {} one-shot {}", channel, clip.id())
            }
            AudioCommand::SetVolume { channel, volume } => {
                format!("Set {} volume to {:.2}", channel, volume)
            }
            AudioCommand::StopAll => "Stop all".to_string(),
            AudioCommand::StopAllLooping => "Stop all looping".to_string(),
            AudioCommand::StopNonLooping => "Stop non-looping".to_string(),
            AudioCommand::StopAllSlots => "Stop all slots".to_string(),
            AudioCommand::PauseAll => "Pause all".to_string(),
            AudioCommand::ResumeAll => "Resume all".to_string(),
            AudioCommand::ApplicationFocus { focused } => {
                if *focused {
                    "Application focused".to_string()
                } else {
                    "Application lost focus".to_string()
                }
            }
            AudioCommand::LevelLoaded => "Level loaded".to_string(),
        }
    }
}
