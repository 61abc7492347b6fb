/// Audio events
///
/// Events report things the manager did (past tense).
/// They are broadcast to every subscriber of the event bus.
use crate::audio_system::pool::VoiceId;
use crate::audio_system::source::Channel;

/// Playback events
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// A slot variant started (or restarted) its fade-in
    SlotStarted { name: String, variant: usize },

    /// A slot began fading out
    SlotStopped { name: String },

    /// A looping entry was created
    LoopStarted { channel: Channel, voice: VoiceId },

    /// A looping entry finished and was removed
    LoopFinished { channel: Channel, voice: VoiceId },

    /// A one-shot was played at the given volume
    OneShotPlayed { clip: String, volume: f32 },

    /// A one-shot was dropped by the duplicate cap
    OneShotDropped { clip: String },

    /// A level load was handled
    LevelLoaded { generation: u64 },

    /// An entry pointing at a released voice was removed
    StaleVoiceReaped { voice: VoiceId },

    /// A call named a slot that does not exist
    LookupFailed { name: String },
}

impl AudioEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            AudioEvent::SlotStarted { name, variant } => {
                format!("Slot {} playing variant {}", name, variant)
            }
            AudioEvent::SlotStopped { name } => format!("Slot {} stopped", name),
            AudioEvent::LoopStarted { channel, voice } => {
                format!("{} loop started on {}", channel, voice)
            }
            AudioEvent::LoopFinished { channel, voice } => {
                format!("{} loop finished on {}", channel, voice)
            }
            AudioEvent::OneShotPlayed { clip, volume } => {
                format!("One-shot {} at {:.2}", clip, volume)
            }
            AudioEvent::OneShotDropped { clip } => format!("One-shot {} dropped", clip),
            AudioEvent::LevelLoaded { generation } => {
                format!("Level loaded (generation {})", generation)
            }
            AudioEvent::StaleVoiceReaped { voice } => format!("Reaped stale {}", voice),
            AudioEvent::LookupFailed { name } => format!("Unknown sound: {}", name),
        }
    }
}
