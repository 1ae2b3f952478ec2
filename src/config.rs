//! Configuration types for the audio and video mixers.

use std::time::Duration;

use crate::MixerError;

/// Preset audio formats for common conferencing profiles.
///
/// These presets configure sample rate and channel count for typical scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    /// 8kHz mono - classic telephony (G.711 / narrowband codecs).
    Narrowband,

    /// 16kHz mono - wideband speech (G.722 / Opus voice).
    #[default]
    Wideband,

    /// 48kHz stereo - fullband music-grade audio.
    Fullband,
}

impl AudioFormat {
    /// Returns the sample rate for this preset.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::Narrowband => 8000,
            Self::Wideband => 16000,
            Self::Fullband => 48000,
        }
    }

    /// Returns the channel count for this preset.
    #[must_use]
    pub fn channels(&self) -> u16 {
        match self {
            Self::Narrowband | Self::Wideband => 1,
            Self::Fullband => 2,
        }
    }
}

/// Configuration for an [`AudioMixer`](crate::AudioMixer).
///
/// Use [`AudioMixerConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use stream_mix::{AudioFormat, AudioMixerConfig};
/// use std::time::Duration;
///
/// let config = AudioMixerConfig {
///     ptime: Duration::from_millis(10),
///     ..AudioMixerConfig::from_format(AudioFormat::Narrowband)
/// };
/// assert_eq!(config.frame_size(), 80);
/// ```
#[derive(Debug, Clone)]
pub struct AudioMixerConfig {
    /// Sample rate in Hz shared by every source.
    ///
    /// Default: 16000
    pub sample_rate: u32,

    /// Number of interleaved channels.
    ///
    /// Default: 1
    pub channels: u16,

    /// Packet time: the duration mixed per iteration.
    ///
    /// Default: 20ms
    pub ptime: Duration,

    /// Jitter buffer target fill, in mix intervals.
    ///
    /// A source stays silent until this much audio is queued.
    /// Default: 5
    pub jitter_wish_frames: usize,

    /// Jitter buffer hard cap, in mix intervals. `None` means unbounded.
    ///
    /// When exceeded the oldest queued frame is dropped and a
    /// [`MixerEvent::BufferOverrun`](crate::MixerEvent::BufferOverrun) is emitted.
    /// Default: `Some(10)`
    pub jitter_max_frames: Option<usize>,

    /// How long the worker sleeps between clock checks.
    ///
    /// Default: 4ms
    pub poll_interval: Duration,
}

impl Default for AudioMixerConfig {
    fn default() -> Self {
        Self::from_format(AudioFormat::default())
    }
}

impl AudioMixerConfig {
    /// Creates a config for the given preset with default timing.
    #[must_use]
    pub fn from_format(format: AudioFormat) -> Self {
        Self {
            sample_rate: format.sample_rate(),
            channels: format.channels(),
            ptime: Duration::from_millis(20),
            jitter_wish_frames: 5,
            jitter_max_frames: Some(10),
            poll_interval: Duration::from_millis(4),
        }
    }

    /// Samples (all channels) mixed per iteration.
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.sample_rate as usize * self.channels as usize * self.ptime.as_millis() as usize / 1000
    }

    /// Bytes of 16-bit PCM mixed per iteration.
    #[must_use]
    pub fn frame_bytes(&self) -> usize {
        self.frame_size() * 2
    }

    pub(crate) fn validate(&self) -> Result<(), MixerError> {
        if self.sample_rate == 0 {
            return Err(MixerError::invalid("sample_rate", "must be non-zero"));
        }
        if self.channels == 0 {
            return Err(MixerError::invalid("channels", "must be non-zero"));
        }
        if self.ptime.as_millis() == 0 {
            return Err(MixerError::invalid("ptime", "must be at least 1ms"));
        }
        if self.frame_size() == 0 {
            return Err(MixerError::invalid(
                "ptime",
                format!(
                    "{}ms at {}Hz x{} yields an empty frame",
                    self.ptime.as_millis(),
                    self.sample_rate,
                    self.channels
                ),
            ));
        }
        if self.jitter_wish_frames == 0 {
            return Err(MixerError::invalid("jitter_wish_frames", "must be non-zero"));
        }
        if let Some(max) = self.jitter_max_frames {
            if max < self.jitter_wish_frames {
                return Err(MixerError::invalid(
                    "jitter_max_frames",
                    format!("{max} is below the wish size of {}", self.jitter_wish_frames),
                ));
            }
        }
        if self.poll_interval.is_zero() {
            return Err(MixerError::invalid("poll_interval", "must be non-zero"));
        }
        Ok(())
    }
}

/// Configuration for a [`VideoMixer`](crate::VideoMixer).
///
/// # Example
///
/// ```
/// use stream_mix::VideoMixerConfig;
///
/// let config = VideoMixerConfig {
///     width: 1280,
///     height: 720,
///     ..Default::default()
/// };
/// assert_eq!(config.frame_interval().as_millis(), 40);
/// ```
#[derive(Debug, Clone)]
pub struct VideoMixerConfig {
    /// Composite picture width in pixels.
    ///
    /// Default: 640
    pub width: u32,

    /// Composite picture height in pixels.
    ///
    /// Default: 480
    pub height: u32,

    /// Composite frames produced per second.
    ///
    /// Default: 25
    pub fps: u32,

    /// How long the worker sleeps between clock checks.
    ///
    /// Default: 4ms
    pub poll_interval: Duration,
}

impl Default for VideoMixerConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 25,
            poll_interval: Duration::from_millis(4),
        }
    }
}

impl VideoMixerConfig {
    /// Time between two composites, truncated to whole milliseconds.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        if self.fps == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(u64::from(1000 / self.fps))
    }

    pub(crate) fn validate(&self) -> Result<(), MixerError> {
        if self.width == 0 || self.height == 0 {
            return Err(MixerError::invalid(
                "size",
                format!("{}x{} has no pixels", self.width, self.height),
            ));
        }
        if self.fps == 0 {
            return Err(MixerError::invalid("fps", "must be non-zero"));
        }
        if self.fps > 1000 {
            return Err(MixerError::invalid("fps", "must not exceed 1000"));
        }
        if self.poll_interval.is_zero() {
            return Err(MixerError::invalid("poll_interval", "must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_presets() {
        assert_eq!(AudioFormat::Narrowband.sample_rate(), 8000);
        assert_eq!(AudioFormat::Narrowband.channels(), 1);
        assert_eq!(AudioFormat::Wideband.sample_rate(), 16000);
        assert_eq!(AudioFormat::Fullband.sample_rate(), 48000);
        assert_eq!(AudioFormat::Fullband.channels(), 2);
    }

    #[test]
    fn test_audio_format_default() {
        assert_eq!(AudioFormat::default(), AudioFormat::Wideband);
    }

    #[test]
    fn test_audio_mixer_config_defaults() {
        let config = AudioMixerConfig::default();
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.ptime, Duration::from_millis(20));
        assert_eq!(config.jitter_wish_frames, 5);
        assert_eq!(config.jitter_max_frames, Some(10));
        assert_eq!(config.poll_interval, Duration::from_millis(4));
    }

    #[test]
    fn test_frame_size() {
        let config = AudioMixerConfig::from_format(AudioFormat::Narrowband);
        assert_eq!(config.frame_size(), 160);
        assert_eq!(config.frame_bytes(), 320);

        let config = AudioMixerConfig::from_format(AudioFormat::Fullband);
        assert_eq!(config.frame_size(), 1920);
    }

    #[test]
    fn test_audio_validation_rejects_zeroes() {
        let mut config = AudioMixerConfig::default();
        config.sample_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(MixerError::InvalidArgument { name: "sample_rate", .. })
        ));

        let mut config = AudioMixerConfig::default();
        config.channels = 0;
        assert!(config.validate().is_err());

        let mut config = AudioMixerConfig::default();
        config.ptime = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = AudioMixerConfig::default();
        config.jitter_wish_frames = 0;
        assert!(config.validate().is_err());

        let mut config = AudioMixerConfig::default();
        config.jitter_max_frames = Some(2);
        assert!(matches!(
            config.validate(),
            Err(MixerError::InvalidArgument { name: "jitter_max_frames", .. })
        ));
    }

    #[test]
    fn test_audio_validation_rejects_empty_frame() {
        let config = AudioMixerConfig {
            sample_rate: 100,
            ptime: Duration::from_millis(1),
            ..Default::default()
        };
        assert_eq!(config.frame_size(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_video_mixer_config_defaults() {
        let config = VideoMixerConfig::default();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.fps, 25);
        assert_eq!(config.frame_interval(), Duration::from_millis(40));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_video_validation() {
        let config = VideoMixerConfig {
            fps: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.frame_interval(), Duration::ZERO);

        let config = VideoMixerConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MixerError::InvalidArgument { name: "size", .. })
        ));
    }
}
