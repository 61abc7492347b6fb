//! Fade timer
//!
//! Linear volume/pitch ramp advanced once per scheduling tick.

use std::time::Duration;

/// Result of advancing a fade by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeStep {
    /// Still ramping, holds the value to write this tick
    Running(f32),
    /// Reached the end, holds the exact target
    Finished(f32),
}

impl FadeStep {
    pub fn value(self) -> f32 {
        match self {
            FadeStep::Running(v) | FadeStep::Finished(v) => v,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, FadeStep::Finished(_))
    }
}

/// Linear interpolation from `start` to `target` over `duration` seconds.
///
/// The timer does not touch any voice itself; the owner writes the returned
/// value. Dropping the timer is cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeTimer {
    start: f32,
    target: f32,
    duration: f32,
    elapsed: f32,
}

impl FadeTimer {
    /// Create a fade. Non-positive durations finish on the first step.
    pub fn new(start: f32, target: f32, duration_secs: f32) -> Self {
        Self {
            start,
            target,
            duration: duration_secs.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn from_duration(start: f32, target: f32, duration: Duration) -> Self {
        Self::new(start, target, duration.as_secs_f32())
    }

    /// Advance by `delta` seconds and return the value for this tick
    pub fn advance(&mut self, delta: f32) -> FadeStep {
        self.elapsed += delta.max(0.0);

        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            return FadeStep::Finished(self.target);
        }

        FadeStep::Running(self.value())
    }

    /// Current interpolated value without advancing
    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.target;
        }
        let t = (self.elapsed / self.duration).min(1.0);
        lerp(self.start, self.target, t)
    }

    /// Move the end point while keeping elapsed progress
    pub fn retarget(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Fraction of the fade completed (0.0-1.0)
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
