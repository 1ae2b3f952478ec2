//! Video conferencing: grid and focus composition of the latest source frames.

mod adapter;
mod builder;
mod frame;
mod layout;
mod mixer;

pub use adapter::{FrameFormatAdapter, ScalingAdapter};
pub use builder::VideoMixerBuilder;
pub use frame::{FrameSize, PixelFormat, Rect, VideoFrame};
pub use layout::{grid_rows, Layout};
pub use mixer::{VideoComposite, VideoMixer, VideoSource};
