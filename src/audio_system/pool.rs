//! Voice pool
//!
//! Owns the caller-supplied voices used for looping and one-shot playback and
//! hands out [`VoiceId`] handles for them.

use std::collections::HashMap;
use std::fmt;

use super::voice::Voice;

/// Handle to a registered voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

impl VoiceId {
    pub fn raw(&self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Who keeps a pooled voice alive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceOwner {
    /// Torn down with the current scene on level load
    Scene,
    /// Detached from the scene, survives level loads
    Persistent,
}

struct PooledVoice {
    voice: Box<dyn Voice>,
    owner: VoiceOwner,
}

/// Registered voices keyed by handle
pub struct VoicePool {
    next_id: u64,
    voices: HashMap<VoiceId, PooledVoice>,
}

impl VoicePool {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            voices: HashMap::new(),
        }
    }

    /// Take ownership of a voice. It starts out scene-owned.
    pub fn insert(&mut self, voice: Box<dyn Voice>) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.voices.insert(
            id,
            PooledVoice {
                voice,
                owner: VoiceOwner::Scene,
            },
        );
        id
    }

    pub fn get(&self, id: VoiceId) -> Option<&dyn Voice> {
        self.voices.get(&id).map(|p| p.voice.as_ref())
    }

    pub fn get_mut(&mut self, id: VoiceId) -> Option<&mut (dyn Voice + 'static)> {
        self.voices.get_mut(&id).map(|p| p.voice.as_mut())
    }

    pub fn contains(&self, id: VoiceId) -> bool {
        self.voices.contains_key(&id)
    }

    pub fn owner(&self, id: VoiceId) -> Option<VoiceOwner> {
        self.voices.get(&id).map(|p| p.owner)
    }

    /// Whether the voice exists and is currently audible
    pub fn is_playing(&self, id: VoiceId) -> bool {
        self.get(id).map(|v| v.is_playing()).unwrap_or(false)
    }

    /// Detach a voice from the scene so it survives level loads
    pub fn persist(&mut self, id: VoiceId) {
        if let Some(pooled) = self.voices.get_mut(&id) {
            pooled.owner = VoiceOwner::Persistent;
        }
    }

    /// Remove a voice and hand it back to the caller
    pub fn remove(&mut self, id: VoiceId) -> Option<Box<dyn Voice>> {
        self.voices.remove(&id).map(|p| p.voice)
    }

    /// Stop and drop a voice
    pub fn destroy(&mut self, id: VoiceId) -> bool {
        match self.voices.remove(&id) {
            Some(mut pooled) => {
                pooled.voice.stop();
                true
            }
            None => false,
        }
    }

    /// Stop and drop every scene-owned voice. Returns the released handles.
    pub fn release_scene_voices(&mut self) -> Vec<VoiceId> {
        let released: Vec<VoiceId> = self
            .voices
            .iter()
            .filter(|(_, p)| p.owner == VoiceOwner::Scene)
            .map(|(id, _)| *id)
            .collect();

        for id in &released {
            self.destroy(*id);
        }
        released
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockVoice;

    #[test]
    fn test_insert_hands_out_unique_ids() {
        let mut pool = VoicePool::new();
        let a = pool.insert(Box::new(MockVoice::new("a.wav", 1.0)));
        let b = pool.insert(Box::new(MockVoice::new("b.wav", 1.0)));

        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.owner(a), Some(VoiceOwner::Scene));
    }

    #[test]
    fn test_release_scene_voices_keeps_persistent() {
        let mut pool = VoicePool::new();
        let scene = MockVoice::new("ambience.wav", 4.0);
        let scene_probe = scene.probe();
        let kept = MockVoice::new("theme.ogg", 60.0);
        let kept_probe = kept.probe();

        let scene_id = pool.insert(Box::new(scene));
        let kept_id = pool.insert(Box::new(kept));
        pool.get_mut(scene_id).unwrap().start();
        pool.get_mut(kept_id).unwrap().start();
        pool.persist(kept_id);

        let released = pool.release_scene_voices();

        assert_eq!(released, vec![scene_id]);
        assert!(!pool.contains(scene_id));
        assert!(!scene_probe.is_playing());
        assert!(pool.contains(kept_id));
        assert!(kept_probe.is_playing());
    }

    #[test]
    fn test_destroy_unknown_is_false() {
        let mut pool = VoicePool::new();
        let id = pool.insert(Box::new(MockVoice::new("a.wav", 1.0)));
        assert!(pool.destroy(id));
        assert!(!pool.destroy(id));
        assert!(!pool.is_playing(id));
        assert!(pool.is_empty());
    }
}
