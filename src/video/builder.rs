//! Builder for [`VideoMixer`].

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{default_clock, Clock};
use crate::{event_callback, EventCallback, MixerError, MixerEvent, VideoMixer, VideoMixerConfig};

use super::adapter::{FrameFormatAdapter, ScalingAdapter};

/// Builder for configuring and starting a [`VideoMixer`].
///
/// ```no_run
/// use stream_mix::VideoMixer;
///
/// let mixer = VideoMixer::builder()
///     .size(1280, 720)
///     .fps(30)
///     .on_event(|e| tracing::info!(?e, "video event"))
///     .build()?;
/// # Ok::<(), stream_mix::MixerError>(())
/// ```
#[must_use]
pub struct VideoMixerBuilder {
    config: VideoMixerConfig,
    adapter: Option<Box<dyn FrameFormatAdapter>>,
    clock: Option<Arc<dyn Clock>>,
    event_callback: Option<EventCallback>,
}

impl Default for VideoMixerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoMixerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: VideoMixerConfig::default(),
            adapter: None,
            clock: None,
            event_callback: None,
        }
    }

    /// Sets the composite picture size.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Sets the output frame rate.
    pub fn fps(mut self, fps: u32) -> Self {
        self.config.fps = fps;
        self
    }

    /// Sets how long the worker sleeps between clock checks.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: VideoMixerConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a custom scaler instead of [`ScalingAdapter`].
    pub fn adapter<A>(mut self, adapter: A) -> Self
    where
        A: FrameFormatAdapter + 'static,
    {
        self.adapter = Some(Box::new(adapter));
        self
    }

    /// Drives the mixer from a custom clock.
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
    pub fn build(self) -> Result<VideoMixer, MixerError> {
        let adapter = self
            .adapter
            .unwrap_or_else(|| Box::new(ScalingAdapter) as Box<dyn FrameFormatAdapter>);
        let clock = self.clock.unwrap_or_else(default_clock);
        VideoMixer::start(self.config, adapter, clock, self.event_callback)
    }
}
