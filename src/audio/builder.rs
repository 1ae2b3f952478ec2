//! Builder for [`AudioMixer`].

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{default_clock, Clock};
use crate::{event_callback, AudioFormat, AudioMixer, AudioMixerConfig, EventCallback, MixerError, MixerEvent};

/// Builder for configuring and starting an [`AudioMixer`].
///
/// Use [`AudioMixer::builder()`] to create a new builder.
///
/// # Example
///
/// ```no_run
/// use stream_mix::{AudioFormat, AudioMixer};
/// use std::time::Duration;
///
/// let mixer = AudioMixer::builder()
///     .format(AudioFormat::Fullband)
///     .ptime(Duration::from_millis(10))
///     .jitter(3, Some(6))
///     .on_event(|e| tracing::warn!(?e, "mixer event"))
///     .build()?;
/// # Ok::<(), stream_mix::MixerError>(())
/// ```
#[must_use]
pub struct AudioMixerBuilder {
    config: AudioMixerConfig,
    clock: Option<Arc<dyn Clock>>,
    event_callback: Option<EventCallback>,
}

impl Default for AudioMixerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioMixerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: AudioMixerConfig::default(),
            clock: None,
            event_callback: None,
        }
    }

    /// Sets sample rate and channel count from a preset.
    pub fn format(mut self, format: AudioFormat) -> Self {
        self.config.sample_rate = format.sample_rate();
        self.config.channels = format.channels();
        self
    }

    /// Sets a custom sample rate in Hz.
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Sets a custom channel count.
    pub fn channels(mut self, channels: u16) -> Self {
        self.config.channels = channels;
        self
    }

    /// Sets the packet time mixed per iteration.
    pub fn ptime(mut self, ptime: Duration) -> Self {
        self.config.ptime = ptime;
        self
    }

    /// Sets the jitter buffer wish size and cap, in packet times.
    pub fn jitter(mut self, wish_frames: usize, max_frames: Option<usize>) -> Self {
        self.config.jitter_wish_frames = wish_frames;
        self.config.jitter_max_frames = max_frames;
        self
    }

    /// Sets how long the worker sleeps between clock checks.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: AudioMixerConfig) -> Self {
        self.config = config;
        self
    }

    /// Drives the mixer from a custom clock, e.g. a
    /// [`ManualClock`](crate::ManualClock) in tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Registers a callback for runtime events.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(MixerEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Validates the configuration and starts the mixer.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] for an unusable config and
    /// [`MixerError::ThreadSpawn`] if the worker cannot be started.
    pub fn build(self) -> Result<AudioMixer, MixerError> {
        let clock = self.clock.unwrap_or_else(default_clock);
        AudioMixer::start(self.config, clock, self.event_callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = AudioMixerBuilder::new();
        assert_eq!(builder.config.sample_rate, 16000);
        assert_eq!(builder.config.channels, 1);
        assert!(builder.clock.is_none());
        assert!(builder.event_callback.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let builder = AudioMixer::builder()
            .format(AudioFormat::Fullband)
            .ptime(Duration::from_millis(10))
            .jitter(2, None);

        assert_eq!(builder.config.sample_rate, 48000);
        assert_eq!(builder.config.channels, 2);
        assert_eq!(builder.config.frame_size(), 960);
        assert_eq!(builder.config.jitter_max_frames, None);
    }

    #[test]
    fn test_build_rejects_zero_channels() {
        let result = AudioMixer::builder().channels(0).build();
        assert!(matches!(
            result,
            Err(MixerError::InvalidArgument { name: "channels", .. })
        ));
    }

    #[test]
    fn test_build_and_stop() {
        let mut mixer = AudioMixer::builder()
            .format(AudioFormat::Narrowband)
            .build()
            .unwrap();
        assert!(mixer.is_running());
        assert_eq!(mixer.config().frame_size(), 160);
        mixer.stop();
        assert!(!mixer.is_running());
    }
}
