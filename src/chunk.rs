//! Audio payloads: timestamped input frames and mixed output chunks.

use std::sync::Arc;
use std::time::Duration;

use crate::format::{le_bytes_to_samples, samples_to_le_bytes};
use crate::source::SourceId;

/// A mixed block of audio delivered to one source's sink.
///
/// Each chunk carries one mix interval of interleaved 16-bit PCM: the sum of
/// every *other* source registered with the mixer.
///
/// Samples are stored in an `Arc<Vec<i16>>` so sinks can forward the chunk
/// without copying.
///
/// # Example
///
/// ```
/// use stream_mix::{AudioChunk, SourceId};
/// use std::time::Duration;
///
/// let chunk = AudioChunk::new(
///     vec![0i16; 160],
///     Duration::from_millis(40),
///     8000,
///     1,
///     SourceId::from_raw(1),
/// );
/// assert_eq!(chunk.duration(), Duration::from_millis(20));
/// assert_eq!(chunk.sample_position(), 320);
/// ```
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM audio samples in 16-bit signed integer format.
    pub samples: Arc<Vec<i16>>,

    /// Virtual timestamp of this interval, counted from the moment the
    /// mixer left its idle state.
    pub timestamp: Duration,

    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,

    /// The source this mix was produced for.
    pub source_id: SourceId,
}

impl AudioChunk {
    /// Creates a new `AudioChunk`.
    pub fn new(
        samples: Vec<i16>,
        timestamp: Duration,
        sample_rate: u32,
        channels: u16,
        source_id: SourceId,
    ) -> Self {
        Self::from_arc(Arc::new(samples), timestamp, sample_rate, channels, source_id)
    }

    /// Creates a new `AudioChunk` from pre-wrapped Arc samples.
    pub fn from_arc(
        samples: Arc<Vec<i16>>,
        timestamp: Duration,
        sample_rate: u32,
        channels: u16,
        source_id: SourceId,
    ) -> Self {
        Self {
            samples,
            timestamp,
            sample_rate,
            channels,
            source_id,
        }
    }

    /// Returns the timestamp expressed in sample-rate units
    /// (`timestamp_ms * sample_rate / 1000`).
    pub fn sample_position(&self) -> u64 {
        self.timestamp.as_millis() as u64 * u64::from(self.sample_rate) / 1000
    }

    /// Returns the duration of this audio chunk.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() / self.channels as usize;
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    /// Returns the number of audio frames in this chunk.
    ///
    /// A frame contains one sample per channel.
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Returns `true` if this chunk contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns `true` if every sample is zero.
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }

    /// Serializes the samples as little-endian 16-bit PCM.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        samples_to_le_bytes(&self.samples)
    }
}

/// A fragment of PCM pushed by a producer into a jitter buffer.
///
/// The payload is little-endian 16-bit interleaved PCM of any length. Frames
/// are kept ordered by `timestamp`; frames without timing information use a
/// zero rate and channel count and are simply queued in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioFrame {
    /// Raw little-endian PCM bytes.
    pub data: Vec<u8>,

    /// Sample rate in Hz, or 0 when unknown.
    pub sample_rate: u32,

    /// Number of channels, or 0 when unknown.
    pub channels: u16,

    /// Presentation timestamp.
    pub timestamp: Duration,
}

impl AudioFrame {
    /// Creates a timed frame from raw bytes.
    pub fn new(data: Vec<u8>, sample_rate: u32, channels: u16, timestamp: Duration) -> Self {
        Self {
            data,
            sample_rate,
            channels,
            timestamp,
        }
    }

    /// Creates an untimed frame from raw bytes.
    pub fn untimed(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// Creates a timed frame from samples.
    pub fn from_samples(
        samples: &[i16],
        sample_rate: u32,
        channels: u16,
        timestamp: Duration,
    ) -> Self {
        Self::new(samples_to_le_bytes(samples), sample_rate, channels, timestamp)
    }

    /// Decodes the payload back into samples. A trailing odd byte is ignored.
    pub fn samples(&self) -> Vec<i16> {
        le_bytes_to_samples(&self.data)
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Playback time covered by `bytes` of this frame's format.
    ///
    /// Zero when the frame carries no format information.
    pub fn duration_of(&self, bytes: usize) -> Duration {
        let bytes_per_sec = u64::from(self.sample_rate) * u64::from(self.channels) * 2;
        if bytes_per_sec == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(bytes as u64 * 1_000_000 / bytes_per_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> SourceId {
        SourceId::from_raw(1)
    }

    #[test]
    fn test_duration_mono_8khz() {
        let chunk = AudioChunk::new(vec![0i16; 160], Duration::ZERO, 8000, 1, id());
        assert_eq!(chunk.duration(), Duration::from_millis(20));
    }

    #[test]
    fn test_duration_stereo_48khz() {
        let chunk = AudioChunk::new(vec![0i16; 1920], Duration::ZERO, 48000, 2, id());
        // 1920 samples / 2 channels = 960 frames / 48000 Hz = 20ms
        assert_eq!(chunk.duration(), Duration::from_millis(20));
        assert_eq!(chunk.frame_count(), 960);
    }

    #[test]
    fn test_sample_position() {
        let chunk = AudioChunk::new(vec![], Duration::from_millis(60), 16000, 1, id());
        assert_eq!(chunk.sample_position(), 960);
    }

    #[test]
    fn test_zero_format() {
        let chunk = AudioChunk::new(vec![0i16; 100], Duration::ZERO, 0, 0, id());
        assert_eq!(chunk.duration(), Duration::ZERO);
        assert_eq!(chunk.frame_count(), 0);
    }

    #[test]
    fn test_is_silent() {
        let chunk = AudioChunk::new(vec![0, 0, 0], Duration::ZERO, 8000, 1, id());
        assert!(chunk.is_silent());
        let chunk = AudioChunk::new(vec![0, 1, 0], Duration::ZERO, 8000, 1, id());
        assert!(!chunk.is_silent());
    }

    #[test]
    fn test_chunk_le_bytes() {
        let chunk = AudioChunk::new(vec![1, -1], Duration::ZERO, 8000, 1, id());
        assert_eq!(chunk.to_le_bytes(), vec![0x01, 0x00, 0xff, 0xff]);
    }

    #[test]
    fn test_frame_from_samples() {
        let frame = AudioFrame::from_samples(&[256, -2], 8000, 1, Duration::from_millis(5));
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.samples(), vec![256, -2]);
        assert_eq!(frame.timestamp, Duration::from_millis(5));
    }

    #[test]
    fn test_frame_duration_of() {
        let frame = AudioFrame::new(vec![], 8000, 1, Duration::ZERO);
        assert_eq!(frame.duration_of(160), Duration::from_millis(10));

        let untimed = AudioFrame::untimed(vec![0; 320]);
        assert_eq!(untimed.duration_of(160), Duration::ZERO);
    }
}
