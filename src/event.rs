//! Runtime events for monitoring mixer health.
//!
//! Events are non-fatal notifications about mixer behavior. The worker
//! keeps running after events are emitted - they're for logging/metrics,
//! not error handling.

use std::sync::Arc;

use crate::source::SourceId;

/// Runtime events emitted by the audio and video mixers.
///
/// Events are delivered synchronously from the thread that caused them
/// (the mixer worker, or the producer calling `put`). Keep the callback
/// short and never call back into the mixer from it.
///
/// # Example
///
/// ```
/// use stream_mix::MixerEvent;
///
/// fn handle_event(event: MixerEvent) {
///     match event {
///         MixerEvent::SourceAdded { source_id } => {
///             eprintln!("joined: {}", source_id);
///         }
///         MixerEvent::SourceRemoved { source_id } => {
///             eprintln!("left: {}", source_id);
///         }
///         MixerEvent::BufferOverrun { source_id, dropped_bytes } => {
///             eprintln!("{} dropped {} bytes", source_id, dropped_bytes);
///         }
///         MixerEvent::BufferUnderrun { source_id } => {
///             eprintln!("{} ran dry", source_id);
///         }
///         MixerEvent::LayoutChanged { rows, sources } => {
///             eprintln!("grid {}x{} for {} sources", rows, rows, sources);
///         }
///         MixerEvent::SinkError { source_id, sink_name, error } => {
///             eprintln!("sink '{}' of {}: {}", sink_name, source_id, error);
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum MixerEvent {
    /// A source was registered.
    SourceAdded {
        /// ID assigned to the new source.
        source_id: SourceId,
    },

    /// A source was unlinked. No further payloads reach its sink.
    SourceRemoved {
        /// ID of the removed source.
        source_id: SourceId,
    },

    /// A jitter buffer exceeded its cap and dropped its oldest frame.
    ///
    /// The producer is pushing faster than real time. Consider raising
    /// [`AudioMixerConfig::jitter_max_frames`](crate::AudioMixerConfig::jitter_max_frames).
    BufferOverrun {
        /// Source whose buffer overflowed.
        source_id: SourceId,
        /// Bytes of unread audio that were discarded.
        dropped_bytes: usize,
    },

    /// A jitter buffer ran dry while playing and went back to filling.
    ///
    /// The source mixes as silence until the buffer reaches its wish size.
    BufferUnderrun {
        /// Source whose buffer ran dry.
        source_id: SourceId,
    },

    /// The video grid was resized.
    LayoutChanged {
        /// Rows (and columns) of the new grid.
        rows: u32,
        /// Number of registered sources.
        sources: usize,
    },

    /// A sink rejected a payload.
    ///
    /// The payload is not retried; the next interval supersedes it.
    SinkError {
        /// Source the payload was addressed to.
        source_id: SourceId,
        /// Name of the sink that errored.
        sink_name: String,
        /// Description of the error.
        error: String,
    },
}

/// Callback type for receiving runtime events.
///
/// Register an event callback via [`AudioMixerBuilder::on_event()`] or
/// [`VideoMixerBuilder::on_event()`].
///
/// [`AudioMixerBuilder::on_event()`]: crate::AudioMixerBuilder::on_event
/// [`VideoMixerBuilder::on_event()`]: crate::VideoMixerBuilder::on_event
pub type EventCallback = Arc<dyn Fn(MixerEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use stream_mix::{event_callback, MixerEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(MixerEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn emit(callback: Option<&EventCallback>, event: MixerEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_event_debug() {
        let event = MixerEvent::BufferOverrun {
            source_id: SourceId::from_raw(3),
            dropped_bytes: 320,
        };
        let debug = format!("{:?}", event);
        assert!(debug.contains("BufferOverrun"));
        assert!(debug.contains("320"));
    }

    #[test]
    fn test_mixer_event_clone() {
        let event = MixerEvent::SinkError {
            source_id: SourceId::from_raw(1),
            sink_name: "encoder".to_string(),
            error: "channel full".to_string(),
        };
        let cloned = event.clone();
        if let MixerEvent::SinkError {
            sink_name, error, ..
        } = cloned
        {
            assert_eq!(sink_name, "encoder");
            assert_eq!(error, "channel full");
        } else {
            panic!("Expected SinkError variant");
        }
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        emit(
            Some(&callback),
            MixerEvent::SourceAdded {
                source_id: SourceId::from_raw(1),
            },
        );
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_emit_without_callback() {
        emit(
            None,
            MixerEvent::BufferUnderrun {
                source_id: SourceId::from_raw(1),
            },
        );
    }
}
