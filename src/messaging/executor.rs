/// Command queue
///
/// Commands sent from any thread are buffered here and drained by the
/// manager at the start of each tick.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::commands::AudioCommand;
use crate::audio_system::pool::VoiceId;
use crate::audio_system::source::Channel;

/// Cloneable handle for queueing commands
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<AudioCommand>,
}

impl CommandSender {
    /// Queue a command. Returns false when the manager is gone.
    pub fn send(&self, command: AudioCommand) -> bool {
        match self.tx.send(command) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Dropping command, manager is gone: {}", err.0.description());
                false
            }
        }
    }

    pub fn play(&self, name: &str) -> bool {
        self.send(AudioCommand::Play {
            name: name.to_string(),
            variant: None,
            fade: None,
        })
    }

    pub fn stop(&self, name: &str) -> bool {
        self.send(AudioCommand::Stop {
            name: name.to_string(),
            fade: None,
        })
    }

    pub fn play_looping_music(&self, voice: VoiceId, volume_scale: f32, fade: f32, persist: bool) -> bool {
        self.send(AudioCommand::PlayLooping {
            channel: Channel::Music,
            voice,
            volume_scale,
            fade,
            persist,
        })
    }

    pub fn set_volume(&self, channel: Channel, volume: f32) -> bool {
        self.send(AudioCommand::SetVolume { channel, volume })
    }

    pub fn level_loaded(&self) -> bool {
        self.send(AudioCommand::LevelLoaded)
    }
}

/// Receiving end owned by the manager
pub struct CommandQueue {
    tx: Sender<AudioCommand>,
    rx: Receiver<AudioCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Get a sender for submitting commands
    pub fn sender(&self) -> CommandSender {
        CommandSender { tx: self.tx.clone() }
    }

    /// Take every command queued so far, oldest first
    pub fn drain(&self) -> Vec<AudioCommand> {
        self.rx.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
