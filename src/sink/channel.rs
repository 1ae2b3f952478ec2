//! Tokio mpsc channel sink implementation.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::sink::Sink;
use crate::SinkError;

/// A sink that forwards payloads to a tokio mpsc channel.
///
/// This is the primary way to consume mixer output from async code. The
/// mixer worker is a plain OS thread, so the sink uses a non-blocking
/// `try_send`: when the channel is full the payload is dropped and
/// [`SinkError::ChannelFull`] is reported instead of stalling every other
/// source.
///
/// # Example
///
/// ```
/// use stream_mix::{AudioChunk, ChannelSink};
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::channel::<AudioChunk>(100);
/// let sink = ChannelSink::new(tx);
///
/// // Hand the sink to AudioMixer::add_source, then receive mixes:
/// // while let Some(chunk) = rx.recv().await { ... }
/// ```
pub struct ChannelSink<T> {
    name: String,
    sender: mpsc::Sender<T>,
}

impl<T> ChannelSink<T> {
    /// Creates a new channel sink with the given sender.
    ///
    /// Give the channel room for a few intervals (50 chunks is a second of
    /// 20ms audio) so a briefly busy consumer does not lose payloads.
    pub fn new(sender: mpsc::Sender<T>) -> Self {
        Self::with_name("channel", sender)
    }

    /// Creates a new channel sink with a custom name.
    pub fn with_name(name: impl Into<String>, sender: mpsc::Sender<T>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }
}

impl<T> Sink<T> for ChannelSink<T>
where
    T: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, payload: &T) -> Result<(), SinkError> {
        self.sender
            .try_send(payload.clone())
            .map_err(|e| match e {
                TrySendError::Full(_) => SinkError::ChannelFull,
                TrySendError::Closed(_) => SinkError::ChannelClosed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AudioChunk, SourceId};
    use std::time::Duration;

    fn chunk(samples: Vec<i16>) -> AudioChunk {
        AudioChunk::new(samples, Duration::ZERO, 8000, 1, SourceId::from_raw(1))
    }

    #[tokio::test]
    async fn test_channel_sink_sends_chunks() {
        let (tx, mut rx) = mpsc::channel::<AudioChunk>(10);
        let sink = ChannelSink::new(tx);

        sink.write(&chunk(vec![1, 2, 3])).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(*received.samples, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_channel_sink_closed() {
        let (tx, rx) = mpsc::channel::<AudioChunk>(10);
        let sink = ChannelSink::new(tx);

        drop(rx);

        let result = sink.write(&chunk(vec![1, 2, 3]));
        assert!(matches!(result, Err(SinkError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_channel_sink_full() {
        let (tx, _rx) = mpsc::channel::<AudioChunk>(1);
        let sink = ChannelSink::new(tx);

        sink.write(&chunk(vec![1])).unwrap();
        let result = sink.write(&chunk(vec![2]));

        assert!(matches!(result, Err(SinkError::ChannelFull)));
    }

    #[tokio::test]
    async fn test_channel_sink_custom_name() {
        let (tx, _rx) = mpsc::channel::<AudioChunk>(10);
        let sink = ChannelSink::with_name("encoder", tx);
        assert_eq!(sink.name(), "encoder");
    }
}
