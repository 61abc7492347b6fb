//! Global channel volume
//!
//! Multiplier applied on top of every per-play volume scale in a channel.

/// Channel volume multiplier (0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelVolume {
    level: f32,
}

impl ChannelVolume {
    /// Create a channel volume, clamped to 0.0-1.0
    pub fn new(level: f32) -> Self {
        Self {
            level: clamp_level(level),
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Set the level. Returns the clamped value actually stored.
    pub fn set_level(&mut self, level: f32) -> f32 {
        self.level = clamp_level(level);
        self.level
    }

    /// Scale a per-play volume by this channel
    pub fn apply(&self, volume_scale: f32) -> f32 {
        volume_scale * self.level
    }

    pub fn is_muted(&self) -> bool {
        self.level == 0.0
    }
}

impl Default for ChannelVolume {
    fn default() -> Self {
        Self { level: 1.0 }
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_clamping() {
        assert_eq!(ChannelVolume::new(1.5).level(), 1.0);
        assert_eq!(ChannelVolume::new(-0.5).level(), 0.0);
        assert_eq!(ChannelVolume::new(f32::NAN).level(), 0.0);
    }

    #[test]
    fn test_set_level_returns_stored_value() {
        let mut volume = ChannelVolume::default();
        assert_eq!(volume.set_level(0.25), 0.25);
        assert_eq!(volume.set_level(2.0), 1.0);
    }

    #[test]
    fn test_apply_and_mute() {
        let mut volume = ChannelVolume::new(0.5);
        assert_eq!(volume.apply(0.8), 0.4);
        assert!(!volume.is_muted());

        volume.set_level(0.0);
        assert!(volume.is_muted());
        assert_eq!(volume.apply(1.0), 0.0);
    }
}
