//! Synthetic producers for tests and demos.

use std::time::Duration;

use crate::format::{rgb_to_yuv, samples_to_le_bytes};
use crate::{AudioFormat, AudioFrame, FrameSize, MixerError, PixelFormat, VideoFrame};

/// Generates synthetic PCM for feeding an [`AudioSource`](crate::AudioSource)
/// without a microphone.
///
/// Generated samples accumulate until taken. Sine waves keep their phase
/// across calls, so a tone generated in 20ms pieces is continuous.
///
/// # Example
///
/// ```
/// use stream_mix::{AudioFormat, MockSource};
///
/// let mut mock = MockSource::from_format(AudioFormat::Narrowband);
/// mock.generate_sine(400.0, 40);
///
/// let frames = mock.take_frames(20);
/// assert_eq!(frames.len(), 2);
/// assert_eq!(frames[0].len(), 320);
/// ```
#[derive(Debug, Clone)]
pub struct MockSource {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i16>,
    phase: f64,
    seed: u32,
}

impl MockSource {
    /// Creates a generator for the given format.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            samples: Vec::new(),
            phase: 0.0,
            seed: 12345,
        }
    }

    /// Creates a generator for a preset format.
    pub fn from_format(format: AudioFormat) -> Self {
        Self::new(format.sample_rate(), format.channels())
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Appends silence.
    pub fn generate_silence(&mut self, duration_ms: u64) {
        let n = self.samples_for_duration(duration_ms);
        self.samples.resize(self.samples.len() + n, 0);
    }

    /// Appends a full-scale sine tone, identical on every channel.
    pub fn generate_sine(&mut self, frequency: f64, duration_ms: u64) {
        self.generate_tone(frequency, 1.0, duration_ms);
    }

    /// Appends a sine tone scaled by `amplitude` (0.0 to 1.0).
    pub fn generate_tone(&mut self, frequency: f64, amplitude: f64, duration_ms: u64) {
        let frames = self.samples_for_duration(duration_ms) / usize::from(self.channels);
        let step = std::f64::consts::TAU * frequency / f64::from(self.sample_rate);
        let amplitude = amplitude.clamp(0.0, 1.0) * f64::from(i16::MAX);

        for _ in 0..frames {
            let sample = (self.phase.sin() * amplitude) as i16;
            self.phase = (self.phase + step) % std::f64::consts::TAU;
            for _ in 0..self.channels {
                self.samples.push(sample);
            }
        }
    }

    /// Appends deterministic white noise scaled by `amplitude` (0.0 to 1.0).
    pub fn generate_noise(&mut self, duration_ms: u64, amplitude: f64) {
        let n = self.samples_for_duration(duration_ms);
        let amplitude = (amplitude.clamp(0.0, 1.0) * 32767.0) as i32;

        // LCG
        for _ in 0..n {
            self.seed = self.seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let random = (self.seed >> 16) as i32 - 32768;
            self.samples.push((random * amplitude / 32767) as i16);
        }
    }

    /// Appends raw samples.
    pub fn add_samples(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
    }

    /// Takes every accumulated sample.
    pub fn take_samples(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.samples)
    }

    /// Takes every accumulated sample as little-endian PCM bytes.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        samples_to_le_bytes(&self.take_samples())
    }

    /// Takes the accumulated samples as untimed frames of `ptime_ms` each.
    ///
    /// A trailing partial frame stays buffered.
    pub fn take_frames(&mut self, ptime_ms: u64) -> Vec<AudioFrame> {
        let frame_len = self.samples_for_duration(ptime_ms);
        if frame_len == 0 {
            return Vec::new();
        }
        let whole = self.samples.len() / frame_len * frame_len;
        let rest = self.samples.split_off(whole);
        let taken = std::mem::replace(&mut self.samples, rest);

        taken
            .chunks_exact(frame_len)
            .map(|c| AudioFrame::untimed(samples_to_le_bytes(c)))
            .collect()
    }

    /// Returns the accumulated samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Playback time of the accumulated samples.
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() / usize::from(self.channels);
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    fn samples_for_duration(&self, duration_ms: u64) -> usize {
        let frames = (u64::from(self.sample_rate) * duration_ms / 1000) as usize;
        frames * usize::from(self.channels)
    }
}

/// Eight vertical colour bars, shifted left by `offset` bars.
///
/// Bars run white, yellow, cyan, green, magenta, red, blue, black. Bumping
/// `offset` per frame makes a moving test picture.
///
/// # Errors
///
/// Returns [`MixerError::InvalidArgument`] for an empty size.
pub fn color_bars(size: FrameSize, offset: usize) -> Result<VideoFrame, MixerError> {
    const BARS: [(u8, u8, u8); 8] = [
        (235, 235, 235),
        (235, 235, 16),
        (16, 235, 235),
        (16, 235, 16),
        (235, 16, 235),
        (235, 16, 16),
        (16, 16, 235),
        (16, 16, 16),
    ];

    let mut frame = VideoFrame::new(PixelFormat::Yuv420p, size)?;
    let bar_width = (size.width as usize / BARS.len()).max(1);
    let bar = |x: usize| {
        let (r, g, b) = BARS[(x / bar_width + offset) % BARS.len()];
        rgb_to_yuv(r, g, b)
    };

    let stride = frame.stride(0);
    for (y, row) in frame.plane_mut(0).chunks_exact_mut(stride).enumerate() {
        if y >= size.height as usize {
            break;
        }
        for (x, px) in row.iter_mut().take(size.width as usize).enumerate() {
            *px = bar(x).y;
        }
    }

    for plane in [1, 2] {
        let stride = frame.stride(plane);
        for row in frame.plane_mut(plane).chunks_exact_mut(stride) {
            for (cx, px) in row.iter_mut().enumerate() {
                let yuv = bar(cx * 2);
                *px = if plane == 1 { yuv.u } else { yuv.v };
            }
        }
    }

    Ok(frame)
}
