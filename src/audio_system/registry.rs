//! Channel registry
//!
//! Active looping playback for the sound and music channels, the music
//! one-shots currently audible, and the generation counter used to decide
//! what survives a level load.

use std::collections::HashSet;

use super::looping::LoopingPlayback;
use super::pool::{VoiceId, VoicePool};
use super::source::Channel;
use super::voice::Clip;

/// What a registry tick removed
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RegistryReport {
    /// Loops whose fade-out completed (or whose voice ran out)
    pub finished: Vec<(Channel, VoiceId)>,
    /// Entries whose voice handle no longer exists
    pub stale: Vec<VoiceId>,
    /// Leftover voices from an earlier generation that were destroyed
    pub destroyed: Vec<VoiceId>,
}

impl RegistryReport {
    pub fn is_empty(&self) -> bool {
        self.finished.is_empty() && self.stale.is_empty() && self.destroyed.is_empty()
    }
}

/// Looping entries per channel plus music one-shots
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    sounds: Vec<LoopingPlayback>,
    music: Vec<LoopingPlayback>,
    music_one_shots: Vec<VoiceId>,
    persisted: HashSet<VoiceId>,
    generation: u64,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn list(&self, channel: Channel) -> &Vec<LoopingPlayback> {
        match channel {
            Channel::Sound => &self.sounds,
            Channel::Music => &self.music,
        }
    }

    fn list_mut(&mut self, channel: Channel) -> &mut Vec<LoopingPlayback> {
        match channel {
            Channel::Sound => &mut self.sounds,
            Channel::Music => &mut self.music,
        }
    }

    /// Number of looping entries on a channel
    pub fn len(&self, channel: Channel) -> usize {
        self.list(channel).len()
    }

    pub fn entries(&self, channel: Channel) -> &[LoopingPlayback] {
        self.list(channel)
    }

    pub fn entry(&self, channel: Channel, voice: VoiceId) -> Option<&LoopingPlayback> {
        self.list(channel).iter().find(|e| e.voice() == voice)
    }

    pub fn music_one_shots(&self) -> &[VoiceId] {
        &self.music_one_shots
    }

    pub fn is_persisted(&self, voice: VoiceId) -> bool {
        self.persisted.contains(&voice)
    }

    /// Start `voice` looping on `channel`.
    ///
    /// Any entry already bound to the same voice is replaced. On an exclusive
    /// channel every other entry is faded out first. Returns false when the
    /// voice is not registered.
    pub fn play_looping(
        &mut self,
        pool: &mut VoicePool,
        channel: Channel,
        voice: VoiceId,
        volume_scale: f32,
        multiplier: f32,
        fade_secs: f32,
        persist: bool,
    ) -> bool {
        if !pool.contains(voice) {
            return false;
        }

        let stop_others = channel.is_exclusive();
        let list = match channel {
            Channel::Sound => &mut self.sounds,
            Channel::Music => &mut self.music,
        };

        list.retain(|e| e.voice() != voice);
        if stop_others {
            for entry in list.iter_mut() {
                if let Some(other) = pool.get_mut(entry.voice()) {
                    entry.stop(other);
                }
            }
        }

        let mut entry = LoopingPlayback::new(voice, fade_secs, fade_secs, persist, self.generation);
        if let Some(v) = pool.get_mut(voice) {
            entry.play(v, volume_scale, multiplier);
        }
        list.push(entry);

        if persist {
            pool.persist(voice);
            self.persisted.insert(voice);
        }

        tracing::debug!(
            "{} loop started on {} (scale {:.2}, fade {:.2}s, persist {})",
            channel,
            voice,
            volume_scale,
            fade_secs,
            persist
        );
        true
    }

    /// Fade out the entry bound to `voice`. Without an entry the voice is stopped directly.
    pub fn stop_looping(&mut self, pool: &mut VoicePool, channel: Channel, voice: VoiceId) {
        let list = match channel {
            Channel::Sound => &mut self.sounds,
            Channel::Music => &mut self.music,
        };

        match list.iter_mut().find(|e| e.voice() == voice) {
            Some(entry) => {
                if let Some(v) = pool.get_mut(voice) {
                    entry.stop(v);
                }
            }
            None => {
                if let Some(v) = pool.get_mut(voice) {
                    v.stop();
                }
            }
        }
    }

    /// Fade out every loop on both channels
    pub fn stop_all_looping(&mut self, pool: &mut VoicePool) {
        for entry in self.sounds.iter_mut().chain(self.music.iter_mut()) {
            if let Some(v) = pool.get_mut(entry.voice()) {
                entry.stop(v);
            }
        }
    }

    /// Stop every music one-shot
    pub fn stop_music_one_shots(&mut self, pool: &mut VoicePool) {
        for id in &self.music_one_shots {
            if let Some(v) = pool.get_mut(*id) {
                v.stop();
            }
        }
    }

    pub fn pause_all(&mut self, pool: &mut VoicePool) {
        for entry in self.sounds.iter_mut().chain(self.music.iter_mut()) {
            if let Some(v) = pool.get_mut(entry.voice()) {
                entry.pause(v);
            }
        }
    }

    pub fn resume_all(&mut self, pool: &mut VoicePool) {
        for entry in self.sounds.iter_mut().chain(self.music.iter_mut()) {
            if let Some(v) = pool.get_mut(entry.voice()) {
                entry.resume(v);
            }
        }
    }

    /// Play a music one-shot. The voice's own volume follows the music channel.
    pub fn play_one_shot_music(
        &mut self,
        pool: &mut VoicePool,
        voice: VoiceId,
        clip: &Clip,
        volume_scale: f32,
        music_volume: f32,
    ) -> bool {
        let Some(v) = pool.get_mut(voice) else {
            return false;
        };

        self.music_one_shots.retain(|id| *id != voice);
        v.set_volume(music_volume);
        v.play_one_shot(clip, volume_scale);
        self.music_one_shots.push(voice);
        true
    }

    /// Re-level every live entry of `channel` after a global volume change
    pub fn apply_volume(&mut self, pool: &mut VoicePool, channel: Channel, multiplier: f32) {
        for entry in self.list_mut(channel).iter_mut() {
            if let Some(v) = pool.get_mut(entry.voice()) {
                entry.apply_multiplier(v, multiplier);
            }
        }

        if channel == Channel::Music {
            for id in &self.music_one_shots {
                if let Some(v) = pool.get_mut(*id) {
                    v.set_volume(multiplier);
                }
            }
        }
    }

    /// Advance every entry by one tick and reap the ones that are done
    pub fn update(&mut self, pool: &mut VoicePool, delta: f32) -> RegistryReport {
        let mut report = RegistryReport::default();
        let generation = self.generation;

        update_list(&mut self.sounds, Channel::Sound, pool, delta, generation, &mut report);
        update_list(&mut self.music, Channel::Music, pool, delta, generation, &mut report);

        self.music_one_shots.retain(|id| pool.is_playing(*id));
        self.persisted.retain(|id| pool.contains(*id));

        report
    }

    /// Level-load handling: bump the generation and drop everything that
    /// should not outlive the scene. Returns the new generation.
    pub fn on_level_load(&mut self, pool: &mut VoicePool) -> u64 {
        self.generation += 1;

        self.stop_music_one_shots(pool);
        self.music_one_shots.clear();

        stop_list_on_level_load(&mut self.sounds, pool);
        stop_list_on_level_load(&mut self.music, pool);

        // Survivors stay tracked so a later load can clean them up once silent
        let music = &self.music;
        self.persisted.retain(|id| {
            let paused = music.iter().any(|e| e.voice() == *id && e.is_paused());
            if paused || pool.is_playing(*id) {
                return true;
            }
            pool.destroy(*id);
            false
        });

        self.generation
    }
}

fn stop_list_on_level_load(list: &mut Vec<LoopingPlayback>, pool: &mut VoicePool) {
    list.retain(|entry| {
        let keep = entry.persist() && (entry.is_paused() || pool.is_playing(entry.voice()));
        if !keep {
            if let Some(v) = pool.get_mut(entry.voice()) {
                v.stop();
            }
        }
        keep
    });
}

fn destroy_leftover(pool: &mut VoicePool, id: VoiceId, report: &mut RegistryReport) {
    tracing::warn!("Destroying audio left over from previous scene: {}", id);
    pool.destroy(id);
    report.destroyed.push(id);
}

fn update_list(
    list: &mut Vec<LoopingPlayback>,
    channel: Channel,
    pool: &mut VoicePool,
    delta: f32,
    generation: u64,
    report: &mut RegistryReport,
) {
    list.retain_mut(|entry| {
        let id = entry.voice();
        let Some(voice) = pool.get_mut(id) else {
            report.stale.push(id);
            return false;
        };

        let mut leftover = entry.generation() != generation;
        if leftover && entry.persist() && (voice.is_playing() || entry.is_paused()) {
            entry.retag(generation);
            leftover = false;
        }

        if leftover && !entry.persist() {
            destroy_leftover(pool, id, report);
            return false;
        }

        if entry.update(voice, delta) {
            if leftover {
                destroy_leftover(pool, id, report);
            } else {
                report.finished.push((channel, id));
            }
            return false;
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockVoice, VoiceProbe};
    use approx::assert_relative_eq;

    fn voice(pool: &mut VoicePool, name: &str) -> (VoiceId, VoiceProbe) {
        let v = MockVoice::new(name, 30.0);
        let probe = v.probe();
        (pool.insert(Box::new(v)), probe)
    }

    #[test]
    fn test_music_is_exclusive_sounds_overlap() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (a, _) = voice(&mut pool, "a.ogg");
        let (b, _) = voice(&mut pool, "b.ogg");
        let (c, _) = voice(&mut pool, "c.ogg");
        let (d, _) = voice(&mut pool, "d.ogg");

        registry.play_looping(&mut pool, Channel::Sound, a, 1.0, 1.0, 0.0, false);
        registry.play_looping(&mut pool, Channel::Sound, b, 1.0, 1.0, 0.0, false);
        assert!(registry.entries(Channel::Sound).iter().all(|e| !e.is_stopping()));

        registry.play_looping(&mut pool, Channel::Music, c, 1.0, 1.0, 1.0, false);
        registry.play_looping(&mut pool, Channel::Music, d, 1.0, 1.0, 1.0, false);
        assert!(registry.entry(Channel::Music, c).unwrap().is_stopping());
        assert!(!registry.entry(Channel::Music, d).unwrap().is_stopping());
    }

    #[test]
    fn test_replaying_same_voice_replaces_entry() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (a, probe) = voice(&mut pool, "a.ogg");

        registry.play_looping(&mut pool, Channel::Sound, a, 1.0, 1.0, 0.0, false);
        registry.play_looping(&mut pool, Channel::Sound, a, 0.5, 1.0, 0.0, false);

        assert_eq!(registry.len(Channel::Sound), 1);
        assert_eq!(probe.volume(), 0.5);
        assert_eq!(probe.starts(), 1);
    }

    #[test]
    fn test_finished_loops_are_reaped() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (a, probe) = voice(&mut pool, "a.ogg");

        registry.play_looping(&mut pool, Channel::Sound, a, 1.0, 1.0, 0.5, false);
        registry.update(&mut pool, 0.5);
        registry.stop_looping(&mut pool, Channel::Sound, a);

        let report = registry.update(&mut pool, 0.25);
        assert!(report.is_empty());
        let report = registry.update(&mut pool, 0.25);

        assert_eq!(report.finished, vec![(Channel::Sound, a)]);
        assert_eq!(registry.len(Channel::Sound), 0);
        assert!(!probe.is_playing());
    }

    #[test]
    fn test_stop_looping_without_entry_stops_voice() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (a, probe) = voice(&mut pool, "a.ogg");
        pool.get_mut(a).unwrap().start();

        registry.stop_looping(&mut pool, Channel::Music, a);
        assert!(!probe.is_playing());
    }

    #[test]
    fn test_stale_entries_are_reaped() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (a, _) = voice(&mut pool, "a.ogg");

        registry.play_looping(&mut pool, Channel::Sound, a, 1.0, 1.0, 0.0, false);
        pool.remove(a);

        let report = registry.update(&mut pool, 0.1);
        assert_eq!(report.stale, vec![a]);
        assert_eq!(registry.len(Channel::Sound), 0);
    }

    #[test]
    fn test_level_load_keeps_persisted_playing_music() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (theme, theme_probe) = voice(&mut pool, "theme.ogg");
        let (rain, rain_probe) = voice(&mut pool, "rain.ogg");

        registry.play_looping(&mut pool, Channel::Music, theme, 1.0, 1.0, 0.0, true);
        registry.play_looping(&mut pool, Channel::Sound, rain, 1.0, 1.0, 0.0, false);

        assert_eq!(registry.on_level_load(&mut pool), 1);

        assert_eq!(registry.len(Channel::Music), 1);
        assert_eq!(registry.len(Channel::Sound), 0);
        assert!(theme_probe.is_playing());
        assert!(!rain_probe.is_playing());

        // The survivor is adopted into the new generation on its next tick
        let report = registry.update(&mut pool, 0.1);
        assert!(report.is_empty());
        assert_eq!(registry.entry(Channel::Music, theme).unwrap().generation(), 1);
    }

    #[test]
    fn test_level_load_destroys_silent_persisted_voices() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (theme, theme_probe) = voice(&mut pool, "theme.ogg");

        registry.play_looping(&mut pool, Channel::Music, theme, 1.0, 1.0, 0.0, true);
        theme_probe.finish();
        registry.on_level_load(&mut pool);

        assert_eq!(registry.len(Channel::Music), 0);
        assert!(!pool.contains(theme));
        assert!(!registry.is_persisted(theme));
    }

    #[test]
    fn test_leftover_entry_from_previous_generation_is_destroyed() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (a, _) = voice(&mut pool, "a.ogg");

        registry.play_looping(&mut pool, Channel::Music, a, 1.0, 1.0, 0.0, false);
        // Bump the generation without the level-load sweep
        registry.generation += 1;

        let report = registry.update(&mut pool, 0.1);
        assert_eq!(report.destroyed, vec![a]);
        assert!(!pool.contains(a));
    }

    #[test]
    fn test_paused_persisted_music_is_kept_across_loads() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (theme, theme_probe) = voice(&mut pool, "theme.ogg");

        registry.play_looping(&mut pool, Channel::Music, theme, 1.0, 1.0, 0.0, true);
        registry.on_level_load(&mut pool);
        registry.pause_all(&mut pool);

        let report = registry.update(&mut pool, 0.1);
        assert!(report.is_empty());
        assert_eq!(registry.entry(Channel::Music, theme).unwrap().generation(), 1);

        registry.on_level_load(&mut pool);
        assert!(pool.contains(theme));
        assert!(registry.is_persisted(theme));
        assert_eq!(registry.len(Channel::Music), 1);

        registry.resume_all(&mut pool);
        assert!(theme_probe.is_playing());
    }

    #[test]
    fn test_silent_persisted_leftover_is_destroyed_once_finished() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (theme, theme_probe) = voice(&mut pool, "theme.ogg");

        registry.play_looping(&mut pool, Channel::Music, theme, 1.0, 1.0, 0.0, true);
        registry.generation += 1;
        theme_probe.finish();

        let report = registry.update(&mut pool, 0.1);
        assert_eq!(report.destroyed, vec![theme]);
        assert!(report.finished.is_empty());
        assert!(!pool.contains(theme));
    }

    #[test]
    fn test_music_volume_relevels_one_shots_and_loops() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (loop_voice, loop_probe) = voice(&mut pool, "theme.ogg");
        let (shot_voice, shot_probe) = voice(&mut pool, "jingle.ogg");

        registry.play_looping(&mut pool, Channel::Music, loop_voice, 0.8, 1.0, 0.0, false);
        let jingle = Clip::new("jingle.ogg", 3.0);
        registry.play_one_shot_music(&mut pool, shot_voice, &jingle, 0.5, 1.0);

        registry.apply_volume(&mut pool, Channel::Music, 0.5);

        assert_relative_eq!(loop_probe.volume(), 0.4);
        assert_eq!(shot_probe.volume(), 0.5);
        assert_eq!(shot_probe.one_shots(), vec![("jingle.ogg".to_string(), 0.5)]);
    }

    #[test]
    fn test_music_one_shots_reaped_when_silent() {
        let mut pool = VoicePool::new();
        let mut registry = ChannelRegistry::new();
        let (shot_voice, shot_probe) = voice(&mut pool, "jingle.ogg");
        let jingle = Clip::new("jingle.ogg", 3.0);

        registry.play_one_shot_music(&mut pool, shot_voice, &jingle, 1.0, 1.0);
        registry.play_one_shot_music(&mut pool, shot_voice, &jingle, 1.0, 1.0);
        assert_eq!(registry.music_one_shots().len(), 1);

        shot_probe.finish();
        registry.update(&mut pool, 0.1);
        assert!(registry.music_one_shots().is_empty());
    }
}
