/// Audio manager
///
/// Single owner of every piece of playback state. All mutation happens either
/// through direct calls or through queued commands drained by [`AudioManager::update`],
/// both on the thread that drives the tick.
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::effects::ChannelVolume;
use super::pool::{VoiceId, VoicePool};
use super::registry::{ChannelRegistry, RegistryReport};
use super::slot::{SlotState, SoundSlot};
use super::source::Channel;
use super::throttle::{DuplicateThrottle, ThrottleDecision};
use super::voice::{AudioBackend, Clip, Voice};
use crate::config::{AudioConfig, MissingSoundPolicy};
use crate::error::{AudioError, AudioResult};
use crate::messaging::{AudioCommand, AudioEvent, CommandQueue, CommandSender, EventBus};

/// Sound manager facade
pub struct AudioManager {
    slots: Vec<SoundSlot>,
    index: HashMap<String, usize>,
    rng: StdRng,
    pool: VoicePool,
    registry: ChannelRegistry,
    throttle: DuplicateThrottle,
    sound_volume: ChannelVolume,
    music_volume: ChannelVolume,
    stop_sounds_on_level_load: bool,
    pause_on_focus_loss: bool,
    missing_sound: MissingSoundPolicy,
    /// Definitions left out at construction
    skipped: Vec<AudioError>,
    /// Set by every tick, cleared by a handled level load
    updated: bool,
    events: EventBus,
    commands: CommandQueue,
}

impl AudioManager {
    /// Build the manager and every configured slot.
    ///
    /// A definition that is invalid or whose clips fail to load is logged
    /// and left out. With `strict_slots` the first such error is returned.
    pub fn new(config: &AudioConfig, backend: &mut dyn AudioBackend) -> AudioResult<Self> {
        Self::with_rng(config, backend, StdRng::from_entropy())
    }

    /// Same as [`AudioManager::new`] with a deterministic variant picker
    pub fn with_seed(config: &AudioConfig, backend: &mut dyn AudioBackend, seed: u64) -> AudioResult<Self> {
        Self::with_rng(config, backend, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &AudioConfig, backend: &mut dyn AudioBackend, rng: StdRng) -> AudioResult<Self> {
        if config.strict_slots {
            config.validate()?;
        }

        let mut slots = Vec::with_capacity(config.sounds.len());
        let mut index = HashMap::with_capacity(config.sounds.len());
        let mut skipped = Vec::new();
        for (position, definition) in config.sounds.iter().enumerate() {
            let built = definition.check(position).and_then(|_| {
                if index.contains_key(&definition.name) {
                    return Err(AudioError::DuplicateName {
                        name: definition.name.clone(),
                    });
                }
                SoundSlot::build(definition, &mut *backend)
            });

            match built {
                Ok(slot) => {
                    index.insert(slot.name().to_string(), slots.len());
                    slots.push(slot);
                }
                Err(e) if config.strict_slots => return Err(e),
                Err(e) => {
                    tracing::error!("Skipping sound definition #{}: {}", position, e);
                    skipped.push(e);
                }
            }
        }

        tracing::info!(
            "Audio manager ready: {} sounds, max {} duplicate one-shots",
            slots.len(),
            config.max_duplicate_instances
        );

        Ok(Self {
            slots,
            index,
            rng,
            pool: VoicePool::new(),
            registry: ChannelRegistry::new(),
            throttle: DuplicateThrottle::new(config.max_duplicate_instances),
            sound_volume: ChannelVolume::new(config.sound_volume),
            music_volume: ChannelVolume::new(config.music_volume),
            stop_sounds_on_level_load: config.stop_sounds_on_level_load,
            pause_on_focus_loss: config.pause_on_focus_loss,
            missing_sound: config.missing_sound,
            skipped,
            updated: false,
            events: EventBus::new(),
            commands: CommandQueue::new(),
        })
    }

    // ----- Sound slots -----

    /// Play a random variant with the slot's default fade.
    ///
    /// Returns the variant played, or `None` when the name is unknown and
    /// the missing-sound policy ignores it.
    pub fn play(&mut self, name: &str) -> AudioResult<Option<usize>> {
        self.play_slot(name, None, None)
    }

    pub fn play_variant(&mut self, name: &str, variant: usize) -> AudioResult<Option<usize>> {
        self.play_slot(name, Some(variant), None)
    }

    pub fn play_with_fade(&mut self, name: &str, fade_secs: f32) -> AudioResult<Option<usize>> {
        self.play_slot(name, None, Some(fade_secs))
    }

    pub fn play_variant_with_fade(
        &mut self,
        name: &str,
        variant: usize,
        fade_secs: f32,
    ) -> AudioResult<Option<usize>> {
        self.play_slot(name, Some(variant), Some(fade_secs))
    }

    fn play_slot(
        &mut self,
        name: &str,
        variant: Option<usize>,
        fade_secs: Option<f32>,
    ) -> AudioResult<Option<usize>> {
        let Some(index) = self.lookup(name)? else {
            return Ok(None);
        };

        let slot = &mut self.slots[index];
        let fade = fade_secs.unwrap_or(slot.default_fade());
        let played = match variant {
            Some(v) => slot.play(v, fade),
            None => slot.play_random(&mut self.rng, fade),
        };

        self.events.publish(AudioEvent::SlotStarted {
            name: slot.name().to_string(),
            variant: played,
        });
        Ok(Some(played))
    }

    /// Fade a slot out with its default fade
    pub fn stop(&mut self, name: &str) -> AudioResult<()> {
        self.stop_slot(name, None)
    }

    pub fn stop_with_fade(&mut self, name: &str, fade_secs: f32) -> AudioResult<()> {
        self.stop_slot(name, Some(fade_secs))
    }

    fn stop_slot(&mut self, name: &str, fade_secs: Option<f32>) -> AudioResult<()> {
        let Some(index) = self.lookup(name)? else {
            return Ok(());
        };

        let slot = &mut self.slots[index];
        if slot.state().is_idle() {
            return Ok(());
        }

        let fade = fade_secs.unwrap_or(slot.default_fade());
        slot.stop(fade);
        self.events.publish(AudioEvent::SlotStopped {
            name: slot.name().to_string(),
        });
        Ok(())
    }

    /// Ramp a slot's pitch over its default fade
    pub fn set_pitch(&mut self, name: &str, pitch: f32) -> AudioResult<()> {
        self.pitch_slot(name, pitch, None)
    }

    pub fn set_pitch_with_fade(&mut self, name: &str, pitch: f32, fade_secs: f32) -> AudioResult<()> {
        self.pitch_slot(name, pitch, Some(fade_secs))
    }

    fn pitch_slot(&mut self, name: &str, pitch: f32, fade_secs: Option<f32>) -> AudioResult<()> {
        if let Some(index) = self.lookup(name)? {
            let slot = &mut self.slots[index];
            let fade = fade_secs.unwrap_or(slot.default_fade());
            slot.set_pitch(pitch, fade);
        }
        Ok(())
    }

    pub fn reset_pitch(&mut self, name: &str) -> AudioResult<()> {
        if let Some(index) = self.lookup(name)? {
            self.slots[index].reset_pitch();
        }
        Ok(())
    }

    /// Stop every slot with its own default fade
    pub fn stop_all_slots(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.state().is_idle() {
                continue;
            }
            let fade = slot.default_fade();
            slot.stop(fade);
            self.events.publish(AudioEvent::SlotStopped {
                name: slot.name().to_string(),
            });
        }
    }

    pub fn slot(&self, name: &str) -> Option<&SoundSlot> {
        self.index.get(name).map(|i| &self.slots[*i])
    }

    pub fn slot_state(&self, name: &str) -> Option<SlotState> {
        self.slot(name).map(|s| s.state())
    }

    /// Slot names in declaration order
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name())
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Errors for the definitions that were left out at construction
    pub fn skipped_slots(&self) -> &[AudioError] {
        &self.skipped
    }

    /// Uniform pick in `0..len` from the manager's generator. `len` must be non-zero.
    pub(crate) fn random_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn lookup(&self, name: &str) -> AudioResult<Option<usize>> {
        if let Some(index) = self.index.get(name) {
            return Ok(Some(*index));
        }

        tracing::warn!("Sound not found: {}", name);
        self.events.publish(AudioEvent::LookupFailed {
            name: name.to_string(),
        });
        match self.missing_sound {
            MissingSoundPolicy::Ignore => Ok(None),
            MissingSoundPolicy::Error => Err(AudioError::NotFound(name.to_string())),
        }
    }

    // ----- Voices -----

    /// Hand a voice to the manager. It belongs to the current scene until persisted.
    pub fn register_voice(&mut self, voice: Box<dyn Voice>) -> VoiceId {
        let id = self.pool.insert(voice);
        tracing::debug!("Registered {}", id);
        id
    }

    /// Take a voice back. Entries still pointing at it are reaped on the next tick.
    pub fn unregister_voice(&mut self, id: VoiceId) -> AudioResult<Box<dyn Voice>> {
        self.pool.remove(id).ok_or(AudioError::StaleVoice(id))
    }

    pub fn voice(&self, id: VoiceId) -> Option<&dyn Voice> {
        self.pool.get(id)
    }

    pub fn is_registered(&self, id: VoiceId) -> bool {
        self.pool.contains(id)
    }

    pub fn voice_count(&self) -> usize {
        self.pool.len()
    }

    fn check_voice(&self, id: VoiceId) -> AudioResult<bool> {
        if self.pool.contains(id) {
            return Ok(true);
        }

        tracing::warn!("Ignoring call on stale {}", id);
        self.events.publish(AudioEvent::LookupFailed { name: id.to_string() });
        match self.missing_sound {
            MissingSoundPolicy::Ignore => Ok(false),
            MissingSoundPolicy::Error => Err(AudioError::StaleVoice(id)),
        }
    }

    // ----- Looping playback -----

    /// Loop `voice` on the sound channel. Sound loops may overlap.
    pub fn play_looping_sound(&mut self, voice: VoiceId, volume_scale: f32, fade_secs: f32) -> AudioResult<()> {
        self.play_looping(Channel::Sound, voice, volume_scale, fade_secs, false)
    }

    /// Loop `voice` as the only music track. With `persist` the voice
    /// survives level loads while it keeps playing.
    pub fn play_looping_music(
        &mut self,
        voice: VoiceId,
        volume_scale: f32,
        fade_secs: f32,
        persist: bool,
    ) -> AudioResult<()> {
        self.play_looping(Channel::Music, voice, volume_scale, fade_secs, persist)
    }

    fn play_looping(
        &mut self,
        channel: Channel,
        voice: VoiceId,
        volume_scale: f32,
        fade_secs: f32,
        persist: bool,
    ) -> AudioResult<()> {
        if !self.check_voice(voice)? {
            return Ok(());
        }

        let multiplier = self.multiplier(channel);
        let persist = persist && channel.can_persist();
        self.registry.play_looping(
            &mut self.pool,
            channel,
            voice,
            volume_scale,
            multiplier,
            fade_secs,
            persist,
        );
        self.events.publish(AudioEvent::LoopStarted { channel, voice });
        Ok(())
    }

    pub fn stop_looping_sound(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.stop_looping(Channel::Sound, voice)
    }

    pub fn stop_looping_music(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.stop_looping(Channel::Music, voice)
    }

    fn stop_looping(&mut self, channel: Channel, voice: VoiceId) -> AudioResult<()> {
        if self.check_voice(voice)? {
            self.registry.stop_looping(&mut self.pool, channel, voice);
        }
        Ok(())
    }

    pub fn looping_count(&self, channel: Channel) -> usize {
        self.registry.len(channel)
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    // ----- One-shots -----

    /// Fire `clip` on `voice`, subject to the duplicate cap and volume damping
    pub fn play_one_shot_sound(&mut self, voice: VoiceId, clip: &Clip, volume_scale: f32) -> AudioResult<()> {
        if !self.check_voice(voice)? {
            return Ok(());
        }

        let base = self.sound_volume.apply(volume_scale);
        match self.throttle.request(clip, base) {
            ThrottleDecision::Play(volume) => {
                if let Some(v) = self.pool.get_mut(voice) {
                    v.play_one_shot(clip, volume);
                }
                self.events.publish(AudioEvent::OneShotPlayed {
                    clip: clip.id().to_string(),
                    volume,
                });
            }
            ThrottleDecision::Dropped => {
                tracing::warn!(
                    "Dropping one-shot {}: {} instances already playing",
                    clip.id(),
                    self.throttle.max_instances()
                );
                self.events.publish(AudioEvent::OneShotDropped {
                    clip: clip.id().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Fire `clip` on `voice` as music. The voice volume follows the music volume.
    pub fn play_one_shot_music(&mut self, voice: VoiceId, clip: &Clip, volume_scale: f32) -> AudioResult<()> {
        if !self.check_voice(voice)? {
            return Ok(());
        }

        let music_volume = self.music_volume.level();
        if self
            .registry
            .play_one_shot_music(&mut self.pool, voice, clip, volume_scale, music_volume)
        {
            self.events.publish(AudioEvent::OneShotPlayed {
                clip: clip.id().to_string(),
                volume: volume_scale * music_volume,
            });
        }
        Ok(())
    }

    pub fn throttle(&self) -> &DuplicateThrottle {
        &self.throttle
    }

    // ----- Bulk operations -----

    /// Stop every loop and every music one-shot. Slots are left alone.
    pub fn stop_all(&mut self) {
        self.stop_all_looping();
        self.stop_non_looping();
    }

    pub fn stop_all_looping(&mut self) {
        self.registry.stop_all_looping(&mut self.pool);
        tracing::debug!("Stopped all looping audio");
    }

    /// Stop every music one-shot
    pub fn stop_non_looping(&mut self) {
        self.registry.stop_music_one_shots(&mut self.pool);
    }

    pub fn pause_all(&mut self) {
        self.registry.pause_all(&mut self.pool);
        tracing::debug!("Paused all looping audio");
    }

    pub fn resume_all(&mut self) {
        self.registry.resume_all(&mut self.pool);
        tracing::debug!("Resumed all looping audio");
    }

    /// Pause loops when focus is lost and resume them when it returns
    pub fn on_application_focus(&mut self, focused: bool) {
        if !self.pause_on_focus_loss {
            return;
        }
        if focused {
            self.resume_all();
        } else {
            self.pause_all();
        }
    }

    // ----- Global volume -----

    pub fn sound_volume(&self) -> f32 {
        self.sound_volume.level()
    }

    /// Set the sound multiplier (clamped to [0, 1]) and re-level live sound loops
    pub fn set_sound_volume(&mut self, volume: f32) {
        let level = self.sound_volume.set_level(volume);
        self.registry.apply_volume(&mut self.pool, Channel::Sound, level);
    }

    pub fn music_volume(&self) -> f32 {
        self.music_volume.level()
    }

    /// Set the music multiplier (clamped to [0, 1]) and re-level live music
    pub fn set_music_volume(&mut self, volume: f32) {
        let level = self.music_volume.set_level(volume);
        self.registry.apply_volume(&mut self.pool, Channel::Music, level);
    }

    fn multiplier(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Sound => self.sound_volume.level(),
            Channel::Music => self.music_volume.level(),
        }
    }

    // ----- Tick & lifecycle -----

    /// Advance the manager by `delta` seconds.
    ///
    /// Drains queued commands, then drives every fade and reaps finished or
    /// stale entries. Never fails: per-command errors are logged.
    pub fn update(&mut self, delta: f32) {
        for command in self.commands.drain() {
            let description = command.description();
            if let Err(e) = self.execute(command) {
                tracing::warn!("Queued command failed ({}): {}", description, e);
            }
        }

        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.updated = true;

        for slot in self.slots.iter_mut() {
            slot.update(delta);
        }

        let report = self.registry.update(&mut self.pool, delta);
        self.publish_report(report);

        self.throttle.advance(delta);
    }

    fn publish_report(&self, report: RegistryReport) {
        for (channel, voice) in report.finished {
            tracing::debug!("{} loop on {} finished", channel, voice);
            self.events.publish(AudioEvent::LoopFinished { channel, voice });
        }
        for voice in report.stale.into_iter().chain(report.destroyed) {
            self.events.publish(AudioEvent::StaleVoiceReaped { voice });
        }
    }

    /// React to a level load.
    ///
    /// Ignored when level-load handling is off or when no tick has run since
    /// the last handled load. Returns whether the load was handled.
    pub fn on_level_loaded(&mut self) -> bool {
        if !self.updated || !self.stop_sounds_on_level_load {
            tracing::debug!("Ignoring level load notification");
            return false;
        }
        self.updated = false;

        let generation = self.registry.on_level_load(&mut self.pool);
        self.throttle.clear();
        let released = self.pool.release_scene_voices();

        tracing::info!(
            "Reloaded level, new generation: {} ({} scene voices released)",
            generation,
            released.len()
        );
        self.events.publish(AudioEvent::LevelLoaded { generation });
        true
    }

    pub fn generation(&self) -> u64 {
        self.registry.generation()
    }

    /// Run a queued command immediately
    pub fn execute(&mut self, command: AudioCommand) -> AudioResult<()> {
        tracing::trace!("Executing command: {}", command.description());

        match command {
            AudioCommand::Play { name, variant, fade } => {
                self.play_slot(&name, variant, fade)?;
            }
            AudioCommand::Stop { name, fade } => self.stop_slot(&name, fade)?,
            AudioCommand::SetPitch { name, pitch, fade } => self.pitch_slot(&name, pitch, fade)?,
            AudioCommand::ResetPitch { name } => self.reset_pitch(&name)?,
            AudioCommand::PlayLooping {
                channel,
                voice,
                volume_scale,
                fade,
                persist,
            } => self.play_looping(channel, voice, volume_scale, fade, persist)?,
            AudioCommand::StopLooping { channel, voice } => self.stop_looping(channel, voice)?,
            AudioCommand::PlayOneShot {
                channel,
                voice,
                clip,
                volume_scale,
            } => match channel {
                Channel::Sound => self.play_one_shot_sound(voice, &clip, volume_scale)?,
                Channel::Music => self.play_one_shot_music(voice, &clip, volume_scale)?,
            },
            AudioCommand::SetVolume { channel, volume } => match channel {
                Channel::Sound => self.set_sound_volume(volume),
                Channel::Music => self.set_music_volume(volume),
            },
            AudioCommand::StopAll => self.stop_all(),
            AudioCommand::StopAllLooping => self.stop_all_looping(),
            AudioCommand::StopNonLooping => self.stop_non_looping(),
            AudioCommand::StopAllSlots => self.stop_all_slots(),
            AudioCommand::PauseAll => self.pause_all(),
            AudioCommand::ResumeAll => self.resume_all(),
            AudioCommand::ApplicationFocus { focused } => self.on_application_focus(focused),
            AudioCommand::LevelLoaded => {
                self.on_level_loaded();
            }
        }
        Ok(())
    }

    /// Event bus the manager publishes to
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Handle for queueing commands from other threads
    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("slots", &self.slots.len())
            .field("voices", &self.pool.len())
            .field("sound_loops", &self.registry.len(Channel::Sound))
            .field("music_loops", &self.registry.len(Channel::Music))
            .field("generation", &self.registry.generation())
            .finish()
    }
}
