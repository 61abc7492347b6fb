//! Test doubles for the voice and backend traits
//!
//! `MockVoice` keeps its state behind a shared mutex, so a test can hand the
//! voice to the manager and keep a [`VoiceProbe`] to observe what the manager
//! did with it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio_system::voice::{AudioBackend, Clip, Voice, VoiceSettings};
use crate::error::{AudioError, AudioResult};

/// Observable state of a mock voice
#[derive(Debug, Clone, Default)]
pub struct MockVoiceState {
    pub playing: bool,
    pub paused: bool,
    pub volume: f32,
    pub pitch: f32,
    pub starts: usize,
    pub stops: usize,
    /// Every volume ever written, in order
    pub volume_log: Vec<f32>,
    /// `(clip name, volume scale)` for every one-shot
    pub one_shots: Vec<(String, f32)>,
}

/// In-memory voice that records every call
pub struct MockVoice {
    clip: Clip,
    settings: VoiceSettings,
    state: Arc<Mutex<MockVoiceState>>,
}

impl MockVoice {
    pub fn new(clip_name: &str, duration_secs: f32) -> Self {
        Self::with_clip(Clip::new(clip_name, duration_secs), VoiceSettings::default())
    }

    pub fn with_clip(clip: Clip, settings: VoiceSettings) -> Self {
        let state = MockVoiceState {
            volume: settings.volume,
            pitch: settings.pitch,
            ..MockVoiceState::default()
        };
        Self {
            clip,
            settings,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Shared view onto this voice's state
    pub fn probe(&self) -> VoiceProbe {
        VoiceProbe {
            clip: self.clip.clone(),
            settings: self.settings.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl Voice for MockVoice {
    fn start(&mut self) {
        let mut state = self.state.lock();
        state.playing = true;
        state.paused = false;
        state.starts += 1;
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.paused = false;
        state.stops += 1;
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        if state.playing {
            state.playing = false;
            state.paused = true;
        }
    }

    fn resume(&mut self) {
        let mut state = self.state.lock();
        if state.paused {
            state.playing = true;
            state.paused = false;
        }
    }

    fn set_volume(&mut self, volume: f32) {
        let mut state = self.state.lock();
        state.volume = volume;
        state.volume_log.push(volume);
    }

    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.state.lock().pitch = pitch;
    }

    fn pitch(&self) -> f32 {
        self.state.lock().pitch
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn clip_duration(&self) -> f32 {
        self.clip.duration()
    }

    fn play_one_shot(&mut self, clip: &Clip, volume_scale: f32) {
        let mut state = self.state.lock();
        state.one_shots.push((clip.id().to_string(), volume_scale));
        state.playing = true;
    }
}

/// Read (and poke) access to a mock voice after it has been moved
#[derive(Clone)]
pub struct VoiceProbe {
    clip: Clip,
    settings: VoiceSettings,
    state: Arc<Mutex<MockVoiceState>>,
}

impl VoiceProbe {
    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> MockVoiceState {
        self.state.lock().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn pitch(&self) -> f32 {
        self.state.lock().pitch
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub fn one_shots(&self) -> Vec<(String, f32)> {
        self.state.lock().one_shots.clone()
    }

    /// Simulate the clip running out on its own
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.paused = false;
    }
}

/// Backend that resolves clips from a name → duration table
#[derive(Default)]
pub struct MockBackend {
    durations: HashMap<String, f32>,
    created: Vec<VoiceProbe>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip the backend can load
    pub fn with_clip(mut self, name: &str, duration_secs: f32) -> Self {
        self.durations.insert(name.to_string(), duration_secs);
        self
    }

    /// Probes for every voice created so far, in creation order
    pub fn created(&self) -> &[VoiceProbe] {
        &self.created
    }

    /// Probes for the voices created for `clip_name`
    pub fn voices_for(&self, clip_name: &str) -> Vec<VoiceProbe> {
        self.created
            .iter()
            .filter(|p| p.clip().id().as_str() == clip_name)
            .cloned()
            .collect()
    }
}

impl AudioBackend for MockBackend {
    fn load_clip(&mut self, name: &str) -> AudioResult<Clip> {
        match self.durations.get(name) {
            Some(duration) => Ok(Clip::new(name, *duration)),
            None => Err(AudioError::ClipLoad {
                name: name.to_string(),
                source: format!("unknown mock clip: {}", name).into(),
            }),
        }
    }

    fn create_voice(&mut self, clip: &Clip, settings: &VoiceSettings) -> AudioResult<Box<dyn Voice>> {
        let voice = MockVoice::with_clip(clip.clone(), settings.clone());
        self.created.push(voice.probe());
        Ok(Box::new(voice))
    }
}
