//! Raw video frames and geometry.

use std::fmt;

use crate::format::{rgb_to_yuv, Yuv};
use crate::MixerError;

/// Pixel layouts understood by the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// YUV 4:2:0 planar.
    /// Layout: Y plane (width*height), U and V planes (ceil(width/2) * ceil(height/2))
    Yuv420p,

    /// Packed 32-bit little-endian RGB.
    /// Layout: one plane of B, G, R, X bytes per pixel
    Rgb32,
}

impl PixelFormat {
    /// Number of planes in this format.
    pub fn plane_count(self) -> usize {
        match self {
            Self::Yuv420p => 3,
            Self::Rgb32 => 1,
        }
    }

    /// Tightly packed `(stride, rows)` of plane `index` for the given size.
    fn plane_dims(self, size: FrameSize, index: usize) -> (usize, usize) {
        let (w, h) = (size.width as usize, size.height as usize);
        match (self, index) {
            (Self::Yuv420p, 0) => (w, h),
            (Self::Yuv420p, _) => (w.div_ceil(2), h.div_ceil(2)),
            (Self::Rgb32, _) => (w * 4, h),
        }
    }

    /// Bytes needed for a tightly packed frame of this format.
    pub fn buffer_size(self, size: FrameSize) -> usize {
        (0..self.plane_count())
            .map(|i| {
                let (stride, rows) = self.plane_dims(size, i);
                stride * rows
            })
            .sum()
    }

    /// Short uppercase name, e.g. `YUV420P`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "YUV420P",
            Self::Rgb32 => "RGB32",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Picture dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Creates a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle inside a picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Creates a rectangle.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the pixel lies inside the rectangle.
    pub fn contains(self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }

    /// Intersects the rectangle with a picture of the given size.
    pub fn clip(self, size: FrameSize) -> Self {
        let x = self.x.min(size.width);
        let y = self.y.min(size.height);
        Self {
            x,
            y,
            width: self.width.min(size.width - x),
            height: self.height.min(size.height - y),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
struct Plane {
    data: Vec<u8>,
    stride: usize,
}

/// An uncompressed video picture.
///
/// Planes are stored separately with their own strides, so frames decoded
/// into padded buffers can be wrapped without repacking.
///
/// # Example
///
/// ```
/// use stream_mix::{FrameSize, PixelFormat, VideoFrame};
///
/// let frame = VideoFrame::filled(PixelFormat::Yuv420p, FrameSize::new(64, 48), 255, 255, 255)?;
/// assert_eq!(frame.plane(0)[0], 235);
/// assert_eq!(frame.yuv_at(10, 10).map(|p| p.y), Some(235));
/// # Ok::<(), stream_mix::MixerError>(())
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct VideoFrame {
    format: PixelFormat,
    size: FrameSize,
    planes: Vec<Plane>,
}

impl VideoFrame {
    /// Allocates a tightly packed, zeroed frame.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] if either dimension is zero.
    pub fn new(format: PixelFormat, size: FrameSize) -> Result<Self, MixerError> {
        if size.is_empty() {
            return Err(MixerError::invalid("size", format!("{size} has no pixels")));
        }
        let planes = (0..format.plane_count())
            .map(|i| {
                let (stride, rows) = format.plane_dims(size, i);
                Plane {
                    data: vec![0; stride * rows],
                    stride,
                }
            })
            .collect();
        Ok(Self {
            format,
            size,
            planes,
        })
    }

    /// Allocates a frame filled with one colour.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] if either dimension is zero.
    pub fn filled(
        format: PixelFormat,
        size: FrameSize,
        r: u8,
        g: u8,
        b: u8,
    ) -> Result<Self, MixerError> {
        let mut frame = Self::new(format, size)?;
        frame.fill(r, g, b);
        Ok(frame)
    }

    /// Wraps existing plane buffers given as `(data, stride)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] if the size is empty, the
    /// number of planes does not match the format, or a plane is too short
    /// or has a stride narrower than one row.
    pub fn from_planes(
        format: PixelFormat,
        size: FrameSize,
        planes: Vec<(Vec<u8>, usize)>,
    ) -> Result<Self, MixerError> {
        if size.is_empty() {
            return Err(MixerError::invalid("size", format!("{size} has no pixels")));
        }
        if planes.len() != format.plane_count() {
            return Err(MixerError::invalid(
                "planes",
                format!(
                    "{format} needs {} planes, got {}",
                    format.plane_count(),
                    planes.len()
                ),
            ));
        }

        let mut out = Vec::with_capacity(planes.len());
        for (i, (data, stride)) in planes.into_iter().enumerate() {
            let (row_bytes, rows) = format.plane_dims(size, i);
            if stride < row_bytes {
                return Err(MixerError::invalid(
                    "planes",
                    format!("plane {i} stride {stride} is below {row_bytes}"),
                ));
            }
            let needed = stride * (rows - 1) + row_bytes;
            if data.len() < needed {
                return Err(MixerError::invalid(
                    "planes",
                    format!("plane {i} holds {} bytes, needs {needed}", data.len()),
                ));
            }
            out.push(Plane { data, stride });
        }

        Ok(Self {
            format,
            size,
            planes: out,
        })
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Picture size.
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Picture width.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Picture height.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Bytes of plane `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`PixelFormat::plane_count`].
    pub fn plane(&self, index: usize) -> &[u8] {
        &self.planes[index].data
    }

    /// Mutable bytes of plane `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`PixelFormat::plane_count`].
    pub fn plane_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.planes[index].data
    }

    /// Row stride of plane `index` in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`PixelFormat::plane_count`].
    pub fn stride(&self, index: usize) -> usize {
        self.planes[index].stride
    }

    /// Paints the whole picture with one colour.
    pub fn fill(&mut self, r: u8, g: u8, b: u8) {
        match self.format {
            PixelFormat::Yuv420p => {
                let Yuv { y, u, v } = rgb_to_yuv(r, g, b);
                self.planes[0].data.fill(y);
                self.planes[1].data.fill(u);
                self.planes[2].data.fill(v);
            }
            PixelFormat::Rgb32 => {
                for px in self.planes[0].data.chunks_exact_mut(4) {
                    px.copy_from_slice(&[b, g, r, 0]);
                }
            }
        }
    }

    /// Reads the colour at a pixel as YUV, converting RGB on the fly.
    ///
    /// Returns `None` outside the picture.
    pub fn yuv_at(&self, x: u32, y: u32) -> Option<Yuv> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        match self.format {
            PixelFormat::Yuv420p => {
                let luma = &self.planes[0];
                let cb = &self.planes[1];
                let cr = &self.planes[2];
                Some(Yuv {
                    y: luma.data[y * luma.stride + x],
                    u: cb.data[(y / 2) * cb.stride + x / 2],
                    v: cr.data[(y / 2) * cr.stride + x / 2],
                })
            }
            PixelFormat::Rgb32 => {
                let p = &self.planes[0];
                let off = y * p.stride + x * 4;
                let px = &p.data[off..off + 4];
                Some(rgb_to_yuv(px[2], px[1], px[0]))
            }
        }
    }
}

impl fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoFrame")
            .field("format", &self.format)
            .field("size", &self.size)
            .field(
                "strides",
                &self.planes.iter().map(|p| p.stride).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size() {
        let size = FrameSize::new(640, 480);
        assert_eq!(PixelFormat::Yuv420p.buffer_size(size), 640 * 480 * 3 / 2);
        assert_eq!(PixelFormat::Rgb32.buffer_size(size), 640 * 480 * 4);
    }

    #[test]
    fn test_odd_dimensions_round_chroma_up() {
        let frame = VideoFrame::new(PixelFormat::Yuv420p, FrameSize::new(5, 3)).unwrap();
        assert_eq!(frame.stride(1), 3);
        assert_eq!(frame.plane(1).len(), 3 * 2);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(VideoFrame::new(PixelFormat::Yuv420p, FrameSize::new(0, 10)).is_err());
    }

    #[test]
    fn test_fill_black_yuv() {
        let frame =
            VideoFrame::filled(PixelFormat::Yuv420p, FrameSize::new(4, 4), 0, 0, 0).unwrap();
        assert!(frame.plane(0).iter().all(|&b| b == 16));
        assert!(frame.plane(1).iter().all(|&b| b == 128));
        assert!(frame.plane(2).iter().all(|&b| b == 128));
    }

    #[test]
    fn test_fill_rgb32_byte_order() {
        let frame = VideoFrame::filled(PixelFormat::Rgb32, FrameSize::new(2, 1), 1, 2, 3).unwrap();
        assert_eq!(frame.plane(0), &[3, 2, 1, 0, 3, 2, 1, 0]);
    }

    #[test]
    fn test_yuv_at_rgb32() {
        let frame =
            VideoFrame::filled(PixelFormat::Rgb32, FrameSize::new(2, 2), 255, 255, 255).unwrap();
        assert_eq!(frame.yuv_at(1, 1).map(|p| p.y), Some(235));
        assert_eq!(frame.yuv_at(2, 0), None);
    }

    #[test]
    fn test_from_planes_with_padding() {
        let size = FrameSize::new(4, 2);
        let frame = VideoFrame::from_planes(
            PixelFormat::Yuv420p,
            size,
            vec![(vec![1; 16], 8), (vec![2; 4], 4), (vec![3; 4], 4)],
        )
        .unwrap();
        assert_eq!(frame.stride(0), 8);
        assert_eq!(frame.yuv_at(3, 1), Some(Yuv { y: 1, u: 2, v: 3 }));
    }

    #[test]
    fn test_from_planes_validation() {
        let size = FrameSize::new(4, 2);
        assert!(VideoFrame::from_planes(PixelFormat::Yuv420p, size, vec![(vec![0; 8], 4)]).is_err());
        assert!(VideoFrame::from_planes(PixelFormat::Rgb32, size, vec![(vec![0; 8], 8)]).is_err());
        assert!(VideoFrame::from_planes(PixelFormat::Rgb32, size, vec![(vec![0; 32], 8)]).is_err());
        assert!(VideoFrame::from_planes(PixelFormat::Rgb32, size, vec![(vec![0; 32], 16)]).is_ok());
    }

    #[test]
    fn test_rect_clip_and_contains() {
        let r = Rect::new(600, 400, 100, 100).clip(FrameSize::new(640, 480));
        assert_eq!(r, Rect::new(600, 400, 40, 80));
        assert!(r.contains(600, 400));
        assert!(!r.contains(640, 400));
        assert!(Rect::new(700, 0, 10, 10).clip(FrameSize::new(640, 480)).is_empty());
    }
}
