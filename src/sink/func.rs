//! Closure-backed and discarding sinks.

use std::marker::PhantomData;

use crate::sink::Sink;
use crate::SinkError;

/// A sink that calls a closure for every payload.
///
/// Create one with [`sink_fn`].
pub struct FnSink<T, F> {
    name: String,
    f: F,
    _payload: PhantomData<fn(&T)>,
}

/// Wraps a closure as a [`Sink`].
///
/// # Example
///
/// ```
/// use stream_mix::{sink_fn, AudioChunk, Sink, SourceId};
/// use std::time::Duration;
///
/// let sink = sink_fn("printer", |chunk: &AudioChunk| {
///     println!("{} samples", chunk.samples.len());
///     Ok(())
/// });
/// let chunk = AudioChunk::new(vec![0; 160], Duration::ZERO, 8000, 1, SourceId::from_raw(1));
/// assert!(sink.write(&chunk).is_ok());
/// ```
pub fn sink_fn<T, F>(name: impl Into<String>, f: F) -> FnSink<T, F>
where
    F: Fn(&T) -> Result<(), SinkError> + Send + Sync,
{
    FnSink {
        name: name.into(),
        f,
        _payload: PhantomData,
    }
}

impl<T, F> Sink<T> for FnSink<T, F>
where
    F: Fn(&T) -> Result<(), SinkError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, payload: &T) -> Result<(), SinkError> {
        (self.f)(payload)
    }
}

/// A sink that accepts and discards every payload.
///
/// Useful for send-only sources that never listen to the mix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl<T> Sink<T> for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn write(&self, _payload: &T) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fn_sink_calls_closure() {
        let total = Arc::new(AtomicI64::new(0));
        let total_clone = total.clone();
        let sink = sink_fn("sum", move |v: &i64| {
            total_clone.fetch_add(*v, Ordering::SeqCst);
            Ok(())
        });

        sink.write(&3).unwrap();
        sink.write(&4).unwrap();

        assert_eq!(total.load(Ordering::SeqCst), 7);
        assert_eq!(sink.name(), "sum");
    }

    #[test]
    fn test_fn_sink_propagates_error() {
        let sink = sink_fn("broken", |_: &u8| Err(SinkError::custom("encoder gone")));
        let err = sink.write(&0).unwrap_err();
        assert_eq!(err.to_string(), "encoder gone");
    }

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        assert!(Sink::<u32>::write(&sink, &5).is_ok());
        assert_eq!(Sink::<u32>::name(&sink), "null");
    }
}
