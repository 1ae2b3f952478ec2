//! Sample format conversion.

/// Clamps a widened accumulator back into the i16 range.
///
/// Mixing sums in i32 and saturates once at the end, so a loud pair of
/// sources clips instead of wrapping around.
#[inline]
pub fn saturate_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Serializes samples as little-endian 16-bit PCM.
pub fn samples_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Decodes little-endian 16-bit PCM. A trailing odd byte is ignored.
pub fn le_bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturate_i16() {
        assert_eq!(saturate_i16(0), 0);
        assert_eq!(saturate_i16(-1234), -1234);
        assert_eq!(saturate_i16(30000 + 30000), i16::MAX);
        assert_eq!(saturate_i16(-30000 - 30000), i16::MIN);
    }

    #[test]
    fn test_le_byte_order() {
        assert_eq!(samples_to_le_bytes(&[0x0102, -2]), vec![0x02, 0x01, 0xfe, 0xff]);
        assert_eq!(le_bytes_to_samples(&[0x02, 0x01, 0xfe, 0xff]), vec![0x0102, -2]);
    }

    #[test]
    fn test_odd_trailing_byte_ignored() {
        assert_eq!(le_bytes_to_samples(&[0x01, 0x00, 0x7f]), vec![1]);
    }
}
