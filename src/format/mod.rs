//! Sample and pixel conversion utilities.
//!
//! This module provides the small amount of format handling the mixers need:
//! - PCM byte order conversion (little-endian bytes ↔ i16) and saturation
//! - RGB → YUV (BT.601, studio swing) for solid fills and RGB32 input

mod color;
mod convert;

pub use color::{rgb_to_yuv, Yuv};
pub use convert::{le_bytes_to_samples, samples_to_le_bytes, saturate_i16};
