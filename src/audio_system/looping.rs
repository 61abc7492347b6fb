//! Looping playback entry
//!
//! One looping voice tracked by the channel registry: its fade, its volume
//! targets and the generation it was started in.

use super::effects::{FadeStep, FadeTimer};
use super::pool::VoiceId;
use super::voice::Voice;

/// A looping voice managed by the registry
#[derive(Debug, Clone)]
pub struct LoopingPlayback {
    voice: VoiceId,
    target_volume: f32,
    original_target_volume: f32,
    fade_in: f32,
    fade_out: f32,
    persist: bool,
    generation: u64,
    stopping: bool,
    paused: bool,
    fade: Option<FadeTimer>,
}

impl LoopingPlayback {
    pub fn new(voice: VoiceId, fade_in: f32, fade_out: f32, persist: bool, generation: u64) -> Self {
        Self {
            voice,
            target_volume: 0.0,
            original_target_volume: 0.0,
            fade_in: fade_in.max(0.0),
            fade_out: fade_out.max(0.0),
            persist,
            generation,
            stopping: false,
            paused: false,
            fade: None,
        }
    }

    /// Start (or keep) the voice looping and fade toward `volume_scale * multiplier`
    pub fn play(&mut self, voice: &mut dyn Voice, volume_scale: f32, multiplier: f32) {
        let start_volume = if voice.is_playing() { voice.volume() } else { 0.0 };
        voice.set_volume(start_volume);

        self.original_target_volume = volume_scale;
        self.target_volume = volume_scale * multiplier;
        self.stopping = false;
        self.paused = false;

        if !voice.is_playing() {
            voice.start();
        }
        self.begin_fade(voice, start_volume, self.fade_in);
    }

    /// Begin fading out. The entry reports finished once silent.
    ///
    /// A paused entry keeps the request: its fade-out runs after resume.
    pub fn stop(&mut self, voice: &mut dyn Voice) {
        if self.stopping || !(voice.is_playing() || self.paused) {
            return;
        }

        self.target_volume = 0.0;
        self.stopping = true;
        let start_volume = voice.volume();
        self.begin_fade(voice, start_volume, self.fade_out);
    }

    pub fn pause(&mut self, voice: &mut dyn Voice) {
        if !self.paused && voice.is_playing() {
            self.paused = true;
            voice.pause();
        }
    }

    pub fn resume(&mut self, voice: &mut dyn Voice) {
        if self.paused {
            self.paused = false;
            voice.resume();
        }
    }

    /// Recompute the target from the channel multiplier. Fades keep their
    /// progress; an entry that is fading out is left alone.
    pub fn apply_multiplier(&mut self, voice: &mut dyn Voice, multiplier: f32) {
        if self.stopping {
            return;
        }

        self.target_volume = self.original_target_volume * multiplier;
        match self.fade.as_mut() {
            Some(fade) => fade.retarget(self.target_volume),
            None => voice.set_volume(self.target_volume),
        }
    }

    /// Advance one tick. Returns true when the entry is done and should be removed.
    pub fn update(&mut self, voice: &mut dyn Voice, delta: f32) -> bool {
        if !voice.is_playing() {
            return !self.paused;
        }

        let Some(fade) = self.fade.as_mut() else {
            return false;
        };

        match fade.advance(delta) {
            FadeStep::Running(v) => {
                voice.set_volume(v);
                false
            }
            FadeStep::Finished(v) => {
                voice.set_volume(v);
                self.fade = None;
                if self.stopping {
                    voice.stop();
                    self.stopping = false;
                    return true;
                }
                false
            }
        }
    }

    pub fn voice(&self) -> VoiceId {
        self.voice
    }

    pub fn target_volume(&self) -> f32 {
        self.target_volume
    }

    pub fn original_target_volume(&self) -> f32 {
        self.original_target_volume
    }

    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn retag(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Elapsed time of the fade in flight
    pub fn fade_elapsed(&self) -> Option<f32> {
        self.fade.as_ref().map(|f| f.elapsed())
    }

    fn begin_fade(&mut self, voice: &mut dyn Voice, start_volume: f32, duration: f32) {
        if duration <= 0.0 {
            voice.set_volume(self.target_volume);
            self.fade = None;
            if self.stopping {
                // Stopped on the spot; the next update reports it finished
                voice.stop();
                self.paused = false;
            }
            return;
        }
        self.fade = Some(FadeTimer::new(start_volume, self.target_volume, duration));
    }
}
