//! RGB to YUV conversion.

/// A studio-swing BT.601 YUV triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Yuv {
    /// Luma, 16..=235.
    pub y: u8,
    /// Blue-difference chroma, 16..=240.
    pub u: u8,
    /// Red-difference chroma, 16..=240.
    pub v: u8,
}

/// Converts an 8-bit RGB colour to BT.601 YUV using integer arithmetic.
///
/// ```
/// use stream_mix::format::rgb_to_yuv;
///
/// let black = rgb_to_yuv(0, 0, 0);
/// assert_eq!((black.y, black.u, black.v), (16, 128, 128));
/// ```
pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> Yuv {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    Yuv {
        y: y.clamp(0, 255) as u8,
        u: u.clamp(0, 255) as u8,
        v: v.clamp(0, 255) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_and_white() {
        assert_eq!(rgb_to_yuv(0, 0, 0), Yuv { y: 16, u: 128, v: 128 });
        assert_eq!(rgb_to_yuv(255, 255, 255), Yuv { y: 235, u: 128, v: 128 });
    }

    #[test]
    fn test_primaries_shift_chroma() {
        let red = rgb_to_yuv(255, 0, 0);
        assert!(red.v > 200);
        assert!(red.u < 128);

        let blue = rgb_to_yuv(0, 0, 255);
        assert!(blue.u > 200);
        assert!(blue.v < 128);
    }
}
