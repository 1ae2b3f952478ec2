//! Scaling of source frames into composite tiles.

use crate::format::rgb_to_yuv;
use crate::FrameError;

use super::frame::{PixelFormat, Rect, VideoFrame};

/// Scales and converts a source frame into a rectangle of the composite.
///
/// The video mixer calls this once per source per interval from its worker
/// thread. Implement it to plug in a better scaler (bicubic, SIMD, GPU).
///
/// # Example
///
/// ```
/// use stream_mix::{FrameError, FrameFormatAdapter, Rect, VideoFrame};
///
/// /// Paints every tile grey, ignoring the input.
/// struct Placeholder;
///
/// impl FrameFormatAdapter for Placeholder {
///     fn convert_into(&self, _src: &VideoFrame, dst: &mut VideoFrame, rect: Rect) -> Result<(), FrameError> {
///         let stride = dst.stride(0);
///         for y in rect.y..rect.y + rect.height {
///             let row = y as usize * stride;
///             dst.plane_mut(0)[row + rect.x as usize..row + (rect.x + rect.width) as usize].fill(128);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait FrameFormatAdapter: Send + Sync {
    /// Draws `src` into `rect` of `dst`, scaling to fit.
    ///
    /// `rect` lies inside `dst`. Luma outside `rect` should not be touched;
    /// subsampled chroma may straddle an odd edge by one sample.
    fn convert_into(&self, src: &VideoFrame, dst: &mut VideoFrame, rect: Rect)
        -> Result<(), FrameError>;
}

/// Nearest-neighbour scaler from [`PixelFormat::Yuv420p`] or
/// [`PixelFormat::Rgb32`] into a [`PixelFormat::Yuv420p`] picture.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalingAdapter;

impl FrameFormatAdapter for ScalingAdapter {
    fn convert_into(
        &self,
        src: &VideoFrame,
        dst: &mut VideoFrame,
        rect: Rect,
    ) -> Result<(), FrameError> {
        if dst.format() != PixelFormat::Yuv420p {
            return Err(FrameError::UnsupportedConversion {
                from: src.format(),
                to: dst.format(),
            });
        }

        let rect = rect.clip(dst.size());
        if rect.is_empty() {
            return Ok(());
        }

        let (sw, sh) = (src.width() as usize, src.height() as usize);
        let (rw, rh) = (rect.width as usize, rect.height as usize);
        let (rx, ry) = (rect.x as usize, rect.y as usize);

        // maps a destination offset inside the rect to a source coordinate
        let src_x = |dx: usize| (dx * sw / rw).min(sw - 1);
        let src_y = |dy: usize| (dy * sh / rh).min(sh - 1);

        let luma_stride = dst.stride(0);
        let luma = dst.plane_mut(0);
        for dy in 0..rh {
            let sy = src_y(dy);
            let row = (ry + dy) * luma_stride;
            for dx in 0..rw {
                luma[row + rx + dx] = sample(src, src_x(dx), sy, Channel::Y);
            }
        }

        let cx0 = rx / 2;
        let cy0 = ry / 2;
        let cx1 = (rx + rw).div_ceil(2);
        let cy1 = (ry + rh).div_ceil(2);
        for (plane, channel) in [(1, Channel::U), (2, Channel::V)] {
            let stride = dst.stride(plane);
            let data = dst.plane_mut(plane);
            for cy in cy0..cy1 {
                let sy = src_y((cy * 2).saturating_sub(ry).min(rh - 1));
                for cx in cx0..cx1 {
                    let sx = src_x((cx * 2).saturating_sub(rx).min(rw - 1));
                    data[cy * stride + cx] = sample(src, sx, sy, channel);
                }
            }
        }

        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Channel {
    Y,
    U,
    V,
}

fn sample(src: &VideoFrame, x: usize, y: usize, channel: Channel) -> u8 {
    match src.format() {
        PixelFormat::Yuv420p => match channel {
            Channel::Y => src.plane(0)[y * src.stride(0) + x],
            Channel::U => src.plane(1)[(y / 2) * src.stride(1) + x / 2],
            Channel::V => src.plane(2)[(y / 2) * src.stride(2) + x / 2],
        },
        PixelFormat::Rgb32 => {
            let off = y * src.stride(0) + x * 4;
            let px = &src.plane(0)[off..off + 4];
            let yuv = rgb_to_yuv(px[2], px[1], px[0]);
            match channel {
                Channel::Y => yuv.y,
                Channel::U => yuv.u,
                Channel::V => yuv.v,
            }
        }
    }
}
