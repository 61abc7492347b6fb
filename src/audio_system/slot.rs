//! Sound slot state machine
//!
//! A slot is one named logical sound made of several clip variants. Only one
//! variant is the "current" one; switching variants crossfades the outgoing
//! voice down while the incoming one fades up. Pitch is shared by every
//! variant of the slot.

use rand::Rng;

use super::effects::{FadeStep, FadeTimer};
use super::voice::{AudioBackend, Voice, VoiceSettings};
use crate::config::SoundDefinition;
use crate::error::{AudioError, AudioResult};

/// Observable state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing selected. An earlier variant may still be fading out.
    Idle,

    /// `variant` is the current variant
    Playing { variant: usize },

    /// `to` is current while `from` is still fading out
    Switching { from: usize, to: usize },
}

impl SlotState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SlotState::Idle)
    }

    /// The variant a play call last selected, if any
    pub fn current_variant(&self) -> Option<usize> {
        match self {
            SlotState::Idle => None,
            SlotState::Playing { variant } => Some(*variant),
            SlotState::Switching { to, .. } => Some(*to),
        }
    }
}

/// Fade-in bound to one variant
#[derive(Debug, Clone)]
struct PlayFade {
    variant: usize,
    timer: FadeTimer,
}

/// One named sound and its variants
pub struct SoundSlot {
    name: String,
    voices: Vec<Box<dyn Voice>>,
    volume: f32,
    default_pitch: f32,
    default_fade: f32,
    current: Option<usize>,
    outgoing: Option<usize>,
    play_fade: Option<PlayFade>,
    stop_fades: Vec<Option<FadeTimer>>,
    pitch_fade: Option<FadeTimer>,
}

impl SoundSlot {
    /// Build a slot from its definition, creating one voice per clip
    pub fn build(definition: &SoundDefinition, backend: &mut dyn AudioBackend) -> AudioResult<Self> {
        let settings = VoiceSettings {
            volume: 0.0,
            pitch: definition.pitch,
            looping: definition.looping,
            spatial_blend: definition.spatial_blend,
            routing_group: definition.routing_group.clone(),
        };

        let mut voices = Vec::with_capacity(definition.clips.len());
        for clip_name in &definition.clips {
            let clip = backend.load_clip(clip_name)?;
            voices.push(backend.create_voice(&clip, &settings)?);
        }

        Self::new(definition, voices)
    }

    /// Wrap already-created voices. Fails on an empty name or no voices.
    pub fn new(definition: &SoundDefinition, mut voices: Vec<Box<dyn Voice>>) -> AudioResult<Self> {
        if definition.name.trim().is_empty() {
            return Err(AudioError::EmptyName { index: 0 });
        }
        if voices.is_empty() {
            return Err(AudioError::NoVariants {
                name: definition.name.clone(),
            });
        }

        for voice in voices.iter_mut() {
            voice.set_volume(0.0);
            voice.set_pitch(definition.pitch);
        }

        let count = voices.len();
        Ok(Self {
            name: definition.name.clone(),
            voices,
            volume: definition.volume.clamp(0.0, 1.0),
            default_pitch: definition.pitch,
            default_fade: definition.fade_seconds.max(0.0),
            current: None,
            outgoing: None,
            play_fade: None,
            stop_fades: vec![None; count],
            pitch_fade: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of variants
    pub fn count(&self) -> usize {
        self.voices.len()
    }

    /// Target volume of the play fade
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn default_fade(&self) -> f32 {
        self.default_fade
    }

    pub fn default_pitch(&self) -> f32 {
        self.default_pitch
    }

    pub fn voice(&self, variant: usize) -> Option<&dyn Voice> {
        self.voices.get(variant).map(|v| v.as_ref())
    }

    pub fn state(&self) -> SlotState {
        match (self.current, self.outgoing) {
            (None, _) => SlotState::Idle,
            (Some(to), Some(from)) if self.is_stopping(from) => SlotState::Switching { from, to },
            (Some(variant), _) => SlotState::Playing { variant },
        }
    }

    /// Variant the play fade is currently ramping, if one is in flight
    pub fn active_play_fade(&self) -> Option<usize> {
        self.play_fade.as_ref().map(|f| f.variant)
    }

    /// Variants with a stop fade in flight
    pub fn stopping_variants(&self) -> Vec<usize> {
        self.stop_fades
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().map(|_| i))
            .collect()
    }

    pub fn is_stopping(&self, variant: usize) -> bool {
        self.stop_fades
            .get(variant)
            .map(|f| f.is_some())
            .unwrap_or(false)
    }

    pub fn is_pitch_fading(&self) -> bool {
        self.pitch_fade.is_some()
    }

    /// Play a uniformly random variant
    pub fn play_random<R: Rng>(&mut self, rng: &mut R, fade_secs: f32) -> usize {
        let variant = rng.gen_range(0..self.count());
        self.play(variant, fade_secs)
    }

    /// Play `variant` (taken modulo the variant count). Returns the variant used.
    pub fn play(&mut self, variant: usize, fade_secs: f32) -> usize {
        let variant = variant % self.count();

        // A variant coming back while it fades out must not be stopped later
        if self.stop_fades[variant].take().is_some() {
            tracing::debug!("{}: cancelled stop fade on variant {}", self.name, variant);
        }

        let restart = match self.current {
            Some(current) if current == variant => {
                self.play_fade = None;
                false
            }
            Some(current) => {
                self.play_fade = None;
                self.begin_fade_out(current, fade_secs);
                self.outgoing = Some(current);
                true
            }
            None => true,
        };

        self.begin_fade_in(variant, fade_secs, restart);
        self.current = Some(variant);

        tracing::debug!(
            "{}: playing variant {} (fade {:.2}s)",
            self.name,
            variant,
            fade_secs
        );
        variant
    }

    /// Fade the current variant out. No-op when idle.
    pub fn stop(&mut self, fade_secs: f32) {
        let Some(current) = self.current.take() else {
            return;
        };

        self.play_fade = None;
        self.begin_fade_out(current, fade_secs);
        self.outgoing = Some(current);

        tracing::debug!("{}: stopping variant {} (fade {:.2}s)", self.name, current, fade_secs);
    }

    /// Ramp the pitch of every variant toward `target`
    pub fn set_pitch(&mut self, target: f32, fade_secs: f32) {
        self.pitch_fade = None;

        if fade_secs <= 0.0 {
            for voice in self.voices.iter_mut() {
                voice.set_pitch(target);
            }
            return;
        }

        let from_variant = self.current.or(self.outgoing).unwrap_or(0);
        let from = self.voices[from_variant].pitch();
        self.pitch_fade = Some(FadeTimer::new(from, target, fade_secs));
    }

    pub fn reset_pitch(&mut self) {
        self.set_pitch(self.default_pitch, self.default_fade);
    }

    /// Advance every fade in flight by `delta` seconds
    pub fn update(&mut self, delta: f32) {
        if let Some(fade) = self.play_fade.as_mut() {
            let step = fade.timer.advance(delta);
            self.voices[fade.variant].set_volume(step.value());
            if step.is_finished() {
                self.play_fade = None;
            }
        }

        for (variant, slot) in self.stop_fades.iter_mut().enumerate() {
            let Some(fade) = slot.as_mut() else {
                continue;
            };
            match fade.advance(delta) {
                FadeStep::Running(v) => self.voices[variant].set_volume(v),
                FadeStep::Finished(v) => {
                    let voice = &mut self.voices[variant];
                    voice.set_volume(v);
                    voice.stop();
                    *slot = None;
                }
            }
        }

        if let Some(fade) = self.pitch_fade.as_mut() {
            let step = fade.advance(delta);
            for voice in self.voices.iter_mut() {
                voice.set_pitch(step.value());
            }
            if step.is_finished() {
                self.pitch_fade = None;
            }
        }
    }

    /// With `restart` the voice starts over from silence. Otherwise the
    /// ramp continues from the volume it is at.
    fn begin_fade_in(&mut self, variant: usize, fade_secs: f32, restart: bool) {
        let voice = &mut self.voices[variant];
        if restart || !voice.is_playing() {
            voice.set_volume(0.0);
            voice.start();
        }

        if fade_secs <= 0.0 {
            voice.set_volume(self.volume);
            return;
        }

        self.play_fade = Some(PlayFade {
            variant,
            timer: FadeTimer::new(voice.volume(), self.volume, fade_secs),
        });
    }

    fn begin_fade_out(&mut self, variant: usize, fade_secs: f32) {
        let voice = &mut self.voices[variant];

        if fade_secs <= 0.0 {
            voice.set_volume(0.0);
            voice.stop();
            self.stop_fades[variant] = None;
            return;
        }

        self.stop_fades[variant] = Some(FadeTimer::new(voice.volume(), 0.0, fade_secs));
    }
}

impl std::fmt::Debug for SoundSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundSlot")
            .field("name", &self.name)
            .field("variants", &self.voices.len())
            .field("state", &self.state())
            .finish()
    }
}
