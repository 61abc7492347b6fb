//! Per-tick effects: fade ramps and channel volume multipliers.

pub mod fade;
pub mod volume;

pub use fade::{FadeStep, FadeTimer};
pub use volume::ChannelVolume;
