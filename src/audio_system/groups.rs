//! Randomized playback groups
//!
//! Small helpers for the common "pick one of these" cases: a set of looping
//! voices (ambience beds, alternative music tracks) and a set of clips fired
//! as one-shots from a single voice (impacts, barks).

use super::manager::AudioManager;
use super::pool::VoiceId;
use super::source::Channel;
use super::voice::Clip;
use crate::error::AudioResult;

/// Fade used by groups when starting or stopping a loop
pub const DEFAULT_LOOP_FADE_SECS: f32 = 1.0;

/// A set of interchangeable looping voices
#[derive(Debug, Clone)]
pub struct LoopingGroup {
    voices: Vec<VoiceId>,
    volume_scale: f32,
    channel: Channel,
    fade_secs: f32,
    playing: usize,
}

impl LoopingGroup {
    pub fn new(voices: Vec<VoiceId>, volume_scale: f32, channel: Channel) -> Self {
        Self {
            voices,
            volume_scale: volume_scale.clamp(0.0, 1.0),
            channel,
            fade_secs: DEFAULT_LOOP_FADE_SECS,
            playing: 0,
        }
    }

    pub fn with_fade(mut self, fade_secs: f32) -> Self {
        self.fade_secs = fade_secs.max(0.0);
        self
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Voice started by the last play call
    pub fn current(&self) -> Option<VoiceId> {
        self.voices.get(self.playing).copied()
    }

    /// Loop a random member
    pub fn play(&mut self, manager: &mut AudioManager) -> AudioResult<Option<VoiceId>> {
        if self.voices.is_empty() {
            return Ok(None);
        }
        let index = manager.random_index(self.voices.len());
        self.play_index(manager, index)
    }

    /// Loop member `index` (wrapped to the group size)
    pub fn play_index(&mut self, manager: &mut AudioManager, index: usize) -> AudioResult<Option<VoiceId>> {
        if self.voices.is_empty() {
            return Ok(None);
        }

        self.playing = index % self.voices.len();
        let voice = self.voices[self.playing];
        match self.channel {
            Channel::Sound => manager.play_looping_sound(voice, self.volume_scale, self.fade_secs)?,
            Channel::Music => {
                manager.play_looping_music(voice, self.volume_scale, self.fade_secs, false)?
            }
        }
        Ok(Some(voice))
    }

    /// Stop the member started last
    pub fn stop(&self, manager: &mut AudioManager) -> AudioResult<()> {
        let Some(voice) = self.current() else {
            return Ok(());
        };
        match self.channel {
            Channel::Sound => manager.stop_looping_sound(voice),
            Channel::Music => manager.stop_looping_music(voice),
        }
    }
}

/// A set of clips fired as one-shots on one voice
#[derive(Debug, Clone)]
pub struct OneShotGroup {
    voice: VoiceId,
    clips: Vec<Clip>,
    volume_scale: f32,
    channel: Channel,
}

impl OneShotGroup {
    pub fn new(voice: VoiceId, clips: Vec<Clip>, volume_scale: f32, channel: Channel) -> Self {
        Self {
            voice,
            clips,
            volume_scale: volume_scale.clamp(0.0, 1.0),
            channel,
        }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Fire a random clip
    pub fn play(&self, manager: &mut AudioManager) -> AudioResult<Option<&Clip>> {
        if self.clips.is_empty() {
            return Ok(None);
        }
        let index = manager.random_index(self.clips.len());
        self.play_index(manager, index)
    }

    /// Fire clip `index` (wrapped to the group size)
    pub fn play_index(&self, manager: &mut AudioManager, index: usize) -> AudioResult<Option<&Clip>> {
        if self.clips.is_empty() {
            return Ok(None);
        }

        let clip = &self.clips[index % self.clips.len()];
        match self.channel {
            Channel::Sound => manager.play_one_shot_sound(self.voice, clip, self.volume_scale)?,
            Channel::Music => manager.play_one_shot_music(self.voice, clip, self.volume_scale)?,
        }
        Ok(Some(clip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;
    use crate::testing::{MockBackend, MockVoice, VoiceProbe};

    fn manager() -> AudioManager {
        AudioManager::with_seed(&AudioConfig::default(), &mut MockBackend::new(), 11).unwrap()
    }

    fn register(manager: &mut AudioManager, clip: &str) -> (VoiceId, VoiceProbe) {
        let voice = MockVoice::new(clip, 60.0);
        let probe = voice.probe();
        (manager.register_voice(Box::new(voice)), probe)
    }

    #[test]
    fn test_looping_group_index_wraps() {
        let mut manager = manager();
        let (a, _) = register(&mut manager, "a.ogg");
        let (b, b_probe) = register(&mut manager, "b.ogg");
        let mut group = LoopingGroup::new(vec![a, b], 0.5, Channel::Sound).with_fade(0.0);

        assert_eq!(group.play_index(&mut manager, 3).unwrap(), Some(b));
        assert_eq!(group.current(), Some(b));
        assert!(b_probe.is_playing());
        assert_eq!(b_probe.volume(), 0.5);

        group.stop(&mut manager).unwrap();
        manager.update(0.016);
        assert!(!b_probe.is_playing());
    }

    #[test]
    fn test_music_group_keeps_one_track() {
        let mut manager = manager();
        let (a, _) = register(&mut manager, "a.ogg");
        let (b, _) = register(&mut manager, "b.ogg");
        let mut group = LoopingGroup::new(vec![a, b], 1.0, Channel::Music);

        group.play_index(&mut manager, 0).unwrap();
        group.play_index(&mut manager, 1).unwrap();

        let entry = manager.registry().entry(Channel::Music, a).unwrap();
        assert!(entry.is_stopping());
    }

    #[test]
    fn test_random_member_comes_from_group() {
        let mut manager = manager();
        let (a, _) = register(&mut manager, "a.ogg");
        let (b, _) = register(&mut manager, "b.ogg");
        let mut group = LoopingGroup::new(vec![a, b], 1.0, Channel::Sound);

        for _ in 0..10 {
            let voice = group.play(&mut manager).unwrap().unwrap();
            assert!(voice == a || voice == b);
        }
    }

    #[test]
    fn test_empty_groups_do_nothing() {
        let mut manager = manager();
        let mut looping = LoopingGroup::new(Vec::new(), 1.0, Channel::Sound);
        assert_eq!(looping.play(&mut manager).unwrap(), None);
        assert!(looping.stop(&mut manager).is_ok());

        let (voice, _) = register(&mut manager, "sfx");
        let shots = OneShotGroup::new(voice, Vec::new(), 1.0, Channel::Sound);
        assert!(shots.play(&mut manager).unwrap().is_none());
    }

    #[test]
    fn test_one_shot_group_plays_through_throttle() {
        let mut manager = manager();
        let (voice, probe) = register(&mut manager, "sfx");
        let group = OneShotGroup::new(
            voice,
            vec![Clip::new("hit1.wav", 0.5), Clip::new("hit2.wav", 0.5)],
            0.4,
            Channel::Sound,
        );

        let played = group.play_index(&mut manager, 5).unwrap().unwrap();
        assert_eq!(played.id().as_str(), "hit2.wav");
        assert_eq!(manager.throttle().active(played), 1);
        assert_eq!(probe.one_shots(), vec![("hit2.wav".to_string(), 0.4)]);
    }

    #[test]
    fn test_one_shot_group_on_music() {
        let mut manager = manager();
        let (voice, probe) = register(&mut manager, "stingers");
        let group = OneShotGroup::new(voice, vec![Clip::new("sting.ogg", 2.0)], 1.0, Channel::Music);

        group.play(&mut manager).unwrap();
        assert_eq!(manager.registry().music_one_shots(), &[voice]);
        assert_eq!(probe.one_shots().len(), 1);
    }
}
