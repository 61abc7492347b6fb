//! Playback channels
//!
//! Sound effects and music are tracked separately: they have their own global
//! volume and different rules for overlap and level reloads.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Playback channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Sound effects, scaled by the global sound volume
    Sound,

    /// Music, scaled by the global music volume
    Music,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Sound => write!(f, "Sound"),
            Channel::Music => write!(f, "Music"),
        }
    }
}

impl Channel {
    /// Whether starting a loop on this channel stops the others first
    pub fn is_exclusive(&self) -> bool {
        match self {
            Channel::Sound => false, // loops may overlap
            Channel::Music => true,  // one track at a time
        }
    }

    /// Whether loops on this channel may survive a level load
    pub fn can_persist(&self) -> bool {
        matches!(self, Channel::Music)
    }
}
