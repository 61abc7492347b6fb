/// Rodio playback backend
///
/// Clips are read from a directory once and kept in memory; every voice owns
/// its own sink. Rodio has no seekable restart, so stopping a voice throws its
/// sink away and the next start builds a fresh one.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::voice::{AudioBackend, Clip, ClipId, Voice, VoiceSettings};
use crate::error::{AudioError, AudioResult};

type ClipStore = Arc<RwLock<HashMap<ClipId, Arc<Vec<u8>>>>>;

/// Playback length of encoded audio in seconds
pub fn decode_duration(data: &[u8]) -> AudioResult<f32> {
    let decoder = Decoder::new(Cursor::new(data.to_vec())).map_err(|e| AudioError::Backend(Box::new(e)))?;

    if let Some(duration) = decoder.total_duration() {
        return Ok(duration.as_secs_f32());
    }

    // Some formats only know their length once fully decoded
    let channels = decoder.channels().max(1) as f32;
    let sample_rate = decoder.sample_rate().max(1) as f32;
    let samples = decoder.count() as f32;
    Ok(samples / channels / sample_rate)
}

/// Backend playing through the default output device
pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    clip_dir: PathBuf,
    clips: ClipStore,
}

impl RodioBackend {
    /// Open the default output device. Clip names resolve relative to `clip_dir`.
    pub fn new(clip_dir: impl Into<PathBuf>) -> AudioResult<Self> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| AudioError::Backend(Box::new(e)))?;
        let clip_dir = clip_dir.into();
        tracing::info!("Audio output opened, clips from {}", clip_dir.display());

        Ok(Self {
            _stream: stream,
            handle,
            clip_dir,
            clips: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn clip_dir(&self) -> &Path {
        &self.clip_dir
    }

    /// Number of clips held in memory
    pub fn loaded_count(&self) -> usize {
        self.clips.read().len()
    }
}

impl AudioBackend for RodioBackend {
    fn load_clip(&mut self, name: &str) -> AudioResult<Clip> {
        let id = ClipId::new(name);
        if let Some(data) = self.clips.read().get(&id) {
            return Ok(Clip::new(name, decode_duration(data)?));
        }

        let path = self.clip_dir.join(name);
        let data = std::fs::read(&path).map_err(|e| AudioError::ClipLoad {
            name: name.to_string(),
            source: Box::new(e),
        })?;
        let duration = decode_duration(&data).map_err(|e| AudioError::ClipLoad {
            name: name.to_string(),
            source: Box::new(e),
        })?;

        tracing::info!(
            "Loaded clip {} ({} bytes, {:.2}s)",
            path.display(),
            data.len(),
            duration
        );
        self.clips.write().insert(id, Arc::new(data));
        Ok(Clip::new(name, duration))
    }

    fn create_voice(&mut self, clip: &Clip, settings: &VoiceSettings) -> AudioResult<Box<dyn Voice>> {
        let data = self
            .clips
            .read()
            .get(clip.id())
            .cloned()
            .ok_or_else(|| AudioError::ClipLoad {
                name: clip.id().to_string(),
                source: "clip was never loaded".into(),
            })?;

        if settings.spatial_blend > 0.0 || settings.routing_group.is_some() {
            tracing::debug!(
                "{}: spatial blend and routing group are not supported by rodio, ignoring",
                clip.id()
            );
        }

        let voice = RodioVoice::new(self.handle.clone(), Arc::clone(&self.clips), clip.clone(), data, settings)?;
        Ok(Box::new(voice))
    }
}

/// One rodio sink bound to a clip, plus any one-shots layered on top
pub struct RodioVoice {
    handle: OutputStreamHandle,
    clips: ClipStore,
    clip: Clip,
    data: Arc<Vec<u8>>,
    looping: bool,
    sink: Sink,
    /// Detached one-shot sinks and their volume scale
    one_shots: Vec<(Sink, f32)>,
    volume: f32,
    pitch: f32,
}

impl RodioVoice {
    fn new(
        handle: OutputStreamHandle,
        clips: ClipStore,
        clip: Clip,
        data: Arc<Vec<u8>>,
        settings: &VoiceSettings,
    ) -> AudioResult<Self> {
        let sink = Sink::try_new(&handle).map_err(|e| AudioError::Backend(Box::new(e)))?;
        sink.pause();

        Ok(Self {
            handle,
            clips,
            clip,
            data,
            looping: settings.looping,
            sink,
            one_shots: Vec::new(),
            volume: settings.volume,
            pitch: settings.pitch,
        })
    }

    fn decode(data: &Arc<Vec<u8>>) -> Option<Decoder<Cursor<Vec<u8>>>> {
        // Decoder needs owned 'static data
        match Decoder::new(Cursor::new((**data).clone())) {
            Ok(decoder) => Some(decoder),
            Err(e) => {
                tracing::error!("Failed to decode clip: {}", e);
                None
            }
        }
    }

    fn fresh_sink(&self) -> Option<Sink> {
        match Sink::try_new(&self.handle) {
            Ok(sink) => Some(sink),
            Err(e) => {
                tracing::error!("Failed to create audio sink: {}", e);
                None
            }
        }
    }

    fn prune_one_shots(&mut self) {
        self.one_shots.retain(|(sink, _)| !sink.empty());
    }
}

impl Voice for RodioVoice {
    fn start(&mut self) {
        self.sink.stop();
        if let Some(sink) = self.fresh_sink() {
            self.sink = sink;
        }

        let Some(decoder) = Self::decode(&self.data) else {
            return;
        };
        let source: Box<dyn Source<Item = i16> + Send> = if self.looping {
            Box::new(decoder.repeat_infinite())
        } else {
            Box::new(decoder)
        };

        self.sink.set_volume(self.volume);
        self.sink.set_speed(self.pitch);
        self.sink.append(source);
        self.sink.play();
        tracing::debug!("Started {}", self.clip.id());
    }

    fn stop(&mut self) {
        self.sink.stop();
        for (sink, _) in self.one_shots.drain(..) {
            sink.stop();
        }
        if let Some(sink) = self.fresh_sink() {
            sink.pause();
            self.sink = sink;
        }
    }

    fn pause(&mut self) {
        self.sink.pause();
        for (sink, _) in &self.one_shots {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if !self.sink.empty() {
            self.sink.play();
        }
        for (sink, _) in &self.one_shots {
            sink.play();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
        for (sink, scale) in &self.one_shots {
            sink.set_volume(self.volume * scale);
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.max(0.01);
        self.sink.set_speed(self.pitch);
        for (sink, _) in &self.one_shots {
            sink.set_speed(self.pitch);
        }
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn is_playing(&self) -> bool {
        let main = !self.sink.empty() && !self.sink.is_paused();
        main || self
            .one_shots
            .iter()
            .any(|(sink, _)| !sink.empty() && !sink.is_paused())
    }

    fn clip_duration(&self) -> f32 {
        self.clip.duration()
    }

    fn play_one_shot(&mut self, clip: &Clip, volume_scale: f32) {
        self.prune_one_shots();

        let Some(data) = self.clips.read().get(clip.id()).cloned() else {
            tracing::error!("One-shot clip {} was never loaded", clip.id());
            return;
        };
        let Some(decoder) = Self::decode(&data) else {
            return;
        };
        let Some(sink) = self.fresh_sink() else {
            return;
        };

        sink.set_volume(self.volume * volume_scale);
        sink.set_speed(self.pitch);
        sink.append(decoder);
        sink.play();
        self.one_shots.push((sink, volume_scale));
    }
}
