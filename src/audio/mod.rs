//! Audio conferencing: per-source jitter buffering and mix-minus summing.

mod builder;
mod mix;
mod mixer;

pub use builder::AudioMixerBuilder;
pub use mix::mix_minus;
pub use mixer::{AudioMixer, AudioSource};
