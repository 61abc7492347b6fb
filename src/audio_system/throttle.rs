//! Duplicate one-shot throttle
//!
//! Tracks the volumes of one-shots currently in flight per clip. When the same
//! clip is triggered many times in the same instant the summed output clips;
//! the throttle caps the number of concurrent instances and damps the volume of
//! late arrivals. This is best-effort clipping mitigation, not loudness
//! normalization.

use std::collections::HashMap;

use super::voice::{Clip, ClipId};

/// Above this in-flight volume, new instances of the clip are damped
const DAMPING_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
struct InFlight {
    volume: f32,
    remaining: f32,
}

/// Outcome of a one-shot request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThrottleDecision {
    /// Play at this volume
    Play(f32),
    /// Cap reached, do not play
    Dropped,
}

/// Per-clip bookkeeping of in-flight one-shot volumes
#[derive(Debug)]
pub struct DuplicateThrottle {
    max_instances: usize,
    in_flight: HashMap<ClipId, Vec<InFlight>>,
}

impl DuplicateThrottle {
    pub fn new(max_instances: usize) -> Self {
        Self {
            max_instances,
            in_flight: HashMap::new(),
        }
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    pub fn set_max_instances(&mut self, max_instances: usize) {
        self.max_instances = max_instances;
    }

    /// Decide the volume for a new instance of `clip`.
    ///
    /// `base_volume` is the caller's scale already multiplied by the global
    /// sound volume. An accepted request is recorded until the clip's length
    /// has elapsed.
    pub fn request(&mut self, clip: &Clip, base_volume: f32) -> ThrottleDecision {
        let volumes = self.in_flight.entry(clip.id().clone()).or_default();
        if volumes.len() >= self.max_instances {
            return ThrottleDecision::Dropped;
        }

        let mut min_volume = f32::MAX;
        let mut max_volume = f32::MIN;
        for entry in volumes.iter() {
            min_volume = min_volume.min(entry.volume);
            max_volume = max_volume.max(entry.volume);
        }

        let requested = if max_volume > DAMPING_THRESHOLD {
            (min_volume + max_volume) / (volumes.len() + 2) as f32
        } else {
            base_volume
        };

        volumes.push(InFlight {
            volume: requested,
            remaining: clip.duration(),
        });
        ThrottleDecision::Play(requested)
    }

    /// Age every in-flight entry and drop the ones whose clip has finished
    pub fn advance(&mut self, delta: f32) {
        let delta = delta.max(0.0);
        self.in_flight.retain(|_, volumes| {
            volumes.retain_mut(|entry| {
                entry.remaining -= delta;
                entry.remaining > 0.0
            });
            !volumes.is_empty()
        });
    }

    /// Number of in-flight instances of `clip`
    pub fn active(&self, clip: &Clip) -> usize {
        self.in_flight.get(clip.id()).map(Vec::len).unwrap_or(0)
    }

    /// Volumes currently in flight for `clip`, oldest first
    pub fn volumes(&self, clip: &Clip) -> Vec<f32> {
        self.in_flight
            .get(clip.id())
            .map(|v| v.iter().map(|e| e.volume).collect())
            .unwrap_or_default()
    }

    /// Number of distinct clips with something in flight
    pub fn tracked_clips(&self) -> usize {
        self.in_flight.len()
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
    }
}

impl Default for DuplicateThrottle {
    fn default() -> Self {
        Self::new(4)
    }
}
