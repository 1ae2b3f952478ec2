//! Sink trait and implementations for mixer output.
//!
//! A [`Sink`] is any destination that can receive mixed payloads: an
//! [`AudioChunk`](crate::AudioChunk) for audio sources or a
//! [`VideoComposite`](crate::VideoComposite) for video sources. The crate
//! provides three built-in sinks:
//!
//! - [`ChannelSink`]: Sends payloads to a tokio mpsc channel
//! - [`FnSink`]: Calls a closure (see [`sink_fn`])
//! - [`NullSink`]: Discards everything
//!
//! You can implement the [`Sink`] trait for custom destinations like
//! encoders or network packetizers.

mod channel;
mod func;

pub use channel::ChannelSink;
pub use func::{sink_fn, FnSink, NullSink};

use std::sync::Arc;

use crate::SinkError;

/// A destination for mixed media.
///
/// Sinks are called synchronously from the mixer worker thread once per
/// interval, while the mixer's registry lock is held.
///
/// # Implementation Notes
///
/// - Methods take `&self` - use interior mutability (`Mutex`, atomics) if needed
/// - `write` must return quickly; hand heavy work off to another thread
/// - Never add or remove sources, or drop the mixer, from inside `write`
/// - Errors are recoverable: the mixer emits a
///   [`MixerEvent::SinkError`](crate::MixerEvent::SinkError) and moves on
///
/// # Example
///
/// ```
/// use stream_mix::{AudioChunk, Sink, SinkError};
///
/// struct PrintSink {
///     name: String,
/// }
///
/// impl Sink<AudioChunk> for PrintSink {
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     fn write(&self, chunk: &AudioChunk) -> Result<(), SinkError> {
///         println!("{} received {} samples", chunk.source_id, chunk.samples.len());
///         Ok(())
///     }
/// }
/// ```
pub trait Sink<T>: Send + Sync {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Deliver one payload.
    fn write(&self, payload: &T) -> Result<(), SinkError>;
}

impl<T, S> Sink<T> for Arc<S>
where
    S: Sink<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&self, payload: &T) -> Result<(), SinkError> {
        (**self).write(payload)
    }
}

impl<T, S> Sink<T> for Box<S>
where
    S: Sink<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&self, payload: &T) -> Result<(), SinkError> {
        (**self).write(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AudioChunk, SourceId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSink {
        name: String,
        count: AtomicUsize,
    }

    impl CountingSink {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                count: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    impl Sink<AudioChunk> for CountingSink {
        fn name(&self) -> &str {
            &self.name
        }

        fn write(&self, _chunk: &AudioChunk) -> Result<(), SinkError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn chunk() -> AudioChunk {
        AudioChunk::new(vec![0i16; 160], Duration::ZERO, 8000, 1, SourceId::from_raw(1))
    }

    #[test]
    fn test_sink_write() {
        let sink = CountingSink::new("test");
        sink.write(&chunk()).unwrap();
        sink.write(&chunk()).unwrap();
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn test_arc_sink_forwards() {
        let sink = Arc::new(CountingSink::new("shared"));
        let handle: Box<dyn Sink<AudioChunk>> = Box::new(sink.clone());

        handle.write(&chunk()).unwrap();

        assert_eq!(handle.name(), "shared");
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Arc<dyn Sink<AudioChunk>>>();
        assert_send_sync::<Box<dyn Sink<AudioChunk>>>();
    }
}
