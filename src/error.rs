//! Error types for stream-mix.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`MixerError`]): Reject a call synchronously, no partial state is kept
//! - **Recoverable errors** ([`SinkError`], [`FrameError`]): Raised on the worker, logged
//!   and surfaced via [`EventCallback`](crate::EventCallback) where relevant
//!
//! Buffer underrun and overrun are not errors. The jitter buffer absorbs them
//! (silence fill, oldest-first eviction) and the mixer reports them as
//! [`MixerEvent`](crate::MixerEvent)s.

/// Fatal errors returned by mixer and buffer construction or registration.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    /// A parameter was zero, out of range, or otherwise unusable.
    #[error("invalid argument: {name} - {reason}")]
    InvalidArgument {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The worker thread could not be started. Mixer creation is rolled back.
    #[error("failed to spawn mixer thread '{thread}': {source}")]
    ThreadSpawn {
        /// Name of the thread that failed to start.
        thread: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The mixer has been stopped and no longer accepts sources.
    #[error("mixer is stopped")]
    MixerStopped,
}

impl MixerError {
    /// Creates an invalid argument error for the named parameter.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur within a [`Sink`](crate::Sink) implementation.
///
/// Sink errors are recoverable - the mixer logs them, emits a
/// [`MixerEvent::SinkError`] and keeps mixing. The failed payload is not retried
/// because the next interval's payload supersedes it.
///
/// [`MixerEvent::SinkError`]: crate::MixerEvent::SinkError
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The receiving channel is full; the payload was dropped.
    #[error("channel full")]
    ChannelFull,

    /// The receiving channel was closed.
    #[error("channel closed")]
    ChannelClosed,

    /// Custom error for user-implemented sinks.
    #[error("{0}")]
    Custom(String),
}

impl SinkError {
    /// Creates a custom sink error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Errors raised by a [`FrameFormatAdapter`](crate::FrameFormatAdapter).
///
/// The video mixer logs these and leaves the affected tile unchanged.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The adapter cannot convert between these pixel formats.
    #[error("unsupported conversion from {from} to {to}")]
    UnsupportedConversion {
        /// Format of the source frame.
        from: crate::PixelFormat,
        /// Format of the destination picture.
        to: crate::PixelFormat,
    },

    /// Custom error for user-implemented adapters.
    #[error("{0}")]
    Custom(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = MixerError::invalid("sample_rate", "must be non-zero");
        assert_eq!(
            err.to_string(),
            "invalid argument: sample_rate - must be non-zero"
        );
    }

    #[test]
    fn test_thread_spawn_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
        let err = MixerError::ThreadSpawn {
            thread: "audio-mixer".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("audio-mixer"));
        assert!(err.to_string().contains("no threads left"));
    }

    #[test]
    fn test_mixer_stopped_display() {
        assert_eq!(MixerError::MixerStopped.to_string(), "mixer is stopped");
    }

    #[test]
    fn test_sink_error_custom() {
        let err = SinkError::custom("encoder gone");
        assert_eq!(err.to_string(), "encoder gone");
    }

    #[test]
    fn test_frame_error_display() {
        let err = FrameError::UnsupportedConversion {
            from: crate::PixelFormat::Yuv420p,
            to: crate::PixelFormat::Rgb32,
        };
        assert_eq!(err.to_string(), "unsupported conversion from YUV420P to RGB32");
    }

    #[test]
    fn test_sink_error_channel() {
        assert_eq!(SinkError::ChannelFull.to_string(), "channel full");
        assert_eq!(SinkError::ChannelClosed.to_string(), "channel closed");
    }
}
